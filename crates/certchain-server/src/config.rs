use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use certchain_ledger::LedgerConfig;
use certchain_service::DEFAULT_VERIFICATION_BASE_URL;
use certchain_types::MAX_CERTIFICATE_BYTES;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ServerError, ServerResult};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Prefix of the URL encoded into each certificate's QR code.
    pub verification_base_url: String,
    /// Directory QR code images are written to.
    pub qr_dir: PathBuf,
    /// Largest accepted certificate payload, in bytes.
    pub max_payload_bytes: usize,
    pub ledger: LedgerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 5000)),
            verification_base_url: DEFAULT_VERIFICATION_BASE_URL.to_string(),
            qr_dir: PathBuf::from("QRcodes"),
            max_payload_bytes: MAX_CERTIFICATE_BYTES,
            ledger: LedgerConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> ServerResult<Self> {
        toml::from_str(s).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Load from a TOML file, falling back to defaults if it does not exist.
    pub fn load(path: &Path) -> ServerResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Request body limit. Payloads travel base64-encoded inside JSON.
    pub fn body_limit(&self) -> usize {
        self.max_payload_bytes / 3 * 4 + 64 * 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:5000".parse::<SocketAddr>().unwrap());
        assert_eq!(c.verification_base_url, "http://127.0.0.1:5000/verify/");
        assert_eq!(c.qr_dir, PathBuf::from("QRcodes"));
        assert_eq!(c.max_payload_bytes, 10 * 1024 * 1024);
        assert_eq!(c.ledger.replica_count, 4);
    }

    #[test]
    fn partial_toml() {
        let c = ServerConfig::from_toml_str(
            r#"
            bind_addr = "0.0.0.0:8080"

            [ledger]
            replica_root = "/var/lib/certchain"
            difficulty = 3
            "#,
        )
        .unwrap();
        assert_eq!(c.bind_addr.port(), 8080);
        assert_eq!(c.ledger.replica_root, PathBuf::from("/var/lib/certchain"));
        assert_eq!(c.ledger.difficulty, 3);
        assert_eq!(c.ledger.replica_count, 4);
        assert_eq!(c.qr_dir, PathBuf::from("QRcodes"));
    }

    #[test]
    fn bad_toml_is_a_config_error() {
        assert!(matches!(
            ServerConfig::from_toml_str("bind_addr = 5"),
            Err(ServerError::Config(_))
        ));
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let c = ServerConfig::load(&dir.path().join("certchain.toml")).unwrap();
        assert_eq!(c, ServerConfig::default());
    }

    #[test]
    fn body_limit_covers_encoded_payload() {
        let c = ServerConfig::default();
        assert!(c.body_limit() > c.max_payload_bytes / 3 * 4);
    }
}
