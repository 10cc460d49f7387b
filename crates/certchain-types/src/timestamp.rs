use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wall-clock format used for block and certificate timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Human-readable UTC timestamp carried inside hashed data.
///
/// Timestamps are stored as text because they are part of the canonical
/// serialization: the exact string, not a parsed instant, is what gets hashed.
/// The fixed-width format makes lexicographic order equal chronological order.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    /// Timestamp for the current wall-clock time.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Format a specific instant.
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at.format(TIMESTAMP_FORMAT).to_string())
    }

    /// Wrap an already-formatted string (e.g. the genesis constant).
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse back into a UTC instant, if the string uses the canonical format.
    pub fn parse(&self) -> Option<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(&self.0, TIMESTAMP_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(&self.0, "%Y-%m-%d %H:%M:%S"))
            .ok()
            .map(|naive| naive.and_utc())
    }

    /// Variant safe for file names: separators replaced with `_`.
    pub fn file_safe(&self) -> String {
        self.0
            .chars()
            .map(|c| match c {
                ' ' | '-' | ':' | '.' => '_',
                other => other,
            })
            .collect()
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn format_is_fixed_width() {
        let at = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        let ts = Timestamp::from_datetime(at);
        assert_eq!(ts.as_str(), "2025-03-04 05:06:07.000000");
    }

    #[test]
    fn ordering_follows_time() {
        let a = Timestamp::from_datetime(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        let b = Timestamp::from_datetime(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 1).unwrap());
        assert!(a < b);
    }

    #[test]
    fn parse_roundtrip() {
        let at = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        let ts = Timestamp::from_datetime(at);
        assert_eq!(ts.parse(), Some(at));
    }

    #[test]
    fn parse_accepts_genesis_format() {
        let ts = Timestamp::from_raw("2025-01-01 00:00:00");
        assert!(ts.parse().is_some());
    }

    #[test]
    fn file_safe_replaces_separators() {
        let ts = Timestamp::from_raw("2025-01-02 03:04:05.678901");
        assert_eq!(ts.file_safe(), "2025_01_02_03_04_05_678901");
    }

    #[test]
    fn serializes_as_plain_string() {
        let ts = Timestamp::from_raw("2025-01-01 00:00:00");
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"2025-01-01 00:00:00\"");
    }
}
