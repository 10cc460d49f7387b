use certchain_types::Digest;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest as _, Sha256};

/// Canonical SHA-256 hasher for structured records.
///
/// Records are first rendered as canonical JSON: object keys sorted
/// recursively, no insignificant whitespace. Two values that differ only in
/// field order therefore always hash to the same digest.
pub struct CanonicalHasher;

impl CanonicalHasher {
    /// Digest of the canonical JSON encoding of `value`.
    pub fn digest<T: Serialize + ?Sized>(value: &T) -> Result<Digest, HasherError> {
        let canonical = canonical_json(value)?;
        Ok(Self::digest_bytes(canonical.as_bytes()))
    }

    /// Plain SHA-256 of raw bytes.
    pub fn digest_bytes(data: &[u8]) -> Digest {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Digest::from_hash(hasher.finalize().into())
    }

    /// SHA-256 over several byte slices fed in order, without separators.
    pub fn digest_concat(parts: &[&[u8]]) -> Digest {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part);
        }
        Digest::from_hash(hasher.finalize().into())
    }

    /// Verify that `value` hashes to `expected`.
    pub fn verify<T: Serialize + ?Sized>(value: &T, expected: &Digest) -> Result<bool, HasherError> {
        Ok(Self::digest(value)? == *expected)
    }
}

/// Render `value` as canonical JSON (sorted keys, compact).
pub fn canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<String, HasherError> {
    let value = serde_json::to_value(value).map_err(|e| HasherError::Serialization(e.to_string()))?;
    let mut out = String::new();
    write_canonical(&value, &mut out)?;
    Ok(out)
}

fn write_canonical(value: &Value, out: &mut String) -> Result<(), HasherError> {
    match value {
        Value::Null | Value::Bool(_) | Value::Number(_) => out.push_str(&value.to_string()),
        Value::String(s) => out.push_str(&encode_string(s)?),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out)?;
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&encode_string(key)?);
                out.push(':');
                write_canonical(&map[key], out)?;
            }
            out.push('}');
        }
    }
    Ok(())
}

fn encode_string(s: &str) -> Result<String, HasherError> {
    serde_json::to_string(s).map_err(|e| HasherError::Serialization(e.to_string()))
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HasherError {
    #[error("serialization error: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use proptest::prelude::*;
    use serde::ser::Error as _;
    use serde::Serializer;

    use super::*;

    #[test]
    fn known_sha256_vector() {
        // SHA-256("hello")
        assert_eq!(
            CanonicalHasher::digest_bytes(b"hello").to_hex(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn concat_matches_single_buffer() {
        let joined = CanonicalHasher::digest_bytes(b"0{}42");
        let parts = CanonicalHasher::digest_concat(&[b"0", b"{}", b"42"]);
        assert_eq!(joined, parts);
    }

    #[test]
    fn canonical_json_sorts_nested_keys() {
        let value = serde_json::json!({"b": 1, "a": {"d": 2, "c": [3, {"f": 4, "e": 5}]}});
        assert_eq!(
            canonical_json(&value).unwrap(),
            r#"{"a":{"c":[3,{"e":5,"f":4}],"d":2},"b":1}"#
        );
    }

    #[test]
    fn canonical_json_escapes_strings() {
        let value = serde_json::json!({"q": "say \"hi\"\n"});
        assert_eq!(canonical_json(&value).unwrap(), r#"{"q":"say \"hi\"\n"}"#);
    }

    #[test]
    fn hash_is_deterministic() {
        let value = serde_json::json!({"key": "value", "num": 42});
        let d1 = CanonicalHasher::digest(&value).unwrap();
        let d2 = CanonicalHasher::digest(&value).unwrap();
        assert_eq!(d1, d2);
        assert!(CanonicalHasher::verify(&value, &d1).unwrap());
    }

    #[test]
    fn different_content_different_digest() {
        let a = CanonicalHasher::digest(&serde_json::json!({"k": 1})).unwrap();
        let b = CanonicalHasher::digest(&serde_json::json!({"k": 2})).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn unserializable_input_is_reported() {
        struct Broken;
        impl Serialize for Broken {
            fn serialize<S: Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
                Err(S::Error::custom("cannot encode"))
            }
        }
        assert!(matches!(
            CanonicalHasher::digest(&Broken),
            Err(HasherError::Serialization(_))
        ));
    }

    #[derive(Serialize)]
    struct NameFirst {
        name: String,
        score: i64,
        tags: Vec<String>,
    }

    #[derive(Serialize)]
    struct ScoreFirst {
        tags: Vec<String>,
        score: i64,
        name: String,
    }

    proptest! {
        #[test]
        fn field_order_does_not_change_digest(
            name in ".*",
            score in any::<i64>(),
            tags in proptest::collection::vec("[a-z]{0,8}", 0..4),
        ) {
            let a = NameFirst { name: name.clone(), score, tags: tags.clone() };
            let b = ScoreFirst { tags, score, name };
            prop_assert_eq!(
                CanonicalHasher::digest(&a).unwrap(),
                CanonicalHasher::digest(&b).unwrap()
            );
        }

        #[test]
        fn map_insertion_order_does_not_change_digest(
            source in proptest::collection::hash_map("[a-z]{1,6}", any::<u32>(), 0..12),
        ) {
            let entries: Vec<(String, u32)> = source.into_iter().collect();
            let mut forward = HashMap::new();
            for (k, v) in &entries {
                forward.insert(k.clone(), *v);
            }
            let mut reversed = HashMap::new();
            for (k, v) in entries.iter().rev() {
                reversed.insert(k.clone(), *v);
            }
            prop_assert_eq!(
                CanonicalHasher::digest(&forward).unwrap(),
                CanonicalHasher::digest(&reversed).unwrap()
            );
        }
    }
}
