use std::sync::Arc;

use certchain_ledger::{seed_genesis, LedgerEngine};
use certchain_records::InMemoryRecordStore;
use certchain_service::{CertificateService, SvgQrGenerator};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::{build_router, AppState};

/// certchain HTTP server.
pub struct CertchainServer {
    config: ServerConfig,
    service: Arc<CertificateService<InMemoryRecordStore>>,
}

impl CertchainServer {
    /// Open the configured replicas (seeding genesis where empty) and wire
    /// up the certificate service.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let ledger = LedgerEngine::from_config(&config.ledger)?;
        let seeded = seed_genesis(ledger.replicas(), false)?;
        if seeded.changed() {
            info!(seeded = ?seeded.seeded, "genesis block written");
        }

        let service = CertificateService::new(
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(ledger),
            Arc::new(SvgQrGenerator::new(&config.qr_dir)),
        )
        .with_verification_base_url(config.verification_base_url.clone())
        .with_max_payload_bytes(config.max_payload_bytes);

        Ok(Self {
            config,
            service: Arc::new(service),
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn service(&self) -> &Arc<CertificateService<InMemoryRecordStore>> {
        &self.service
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(AppState::new(self.service.clone()), self.config.body_limit())
    }

    /// Start serving requests until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!(
            addr = %self.config.bind_addr,
            replicas = self.config.ledger.replica_count,
            "certchain server listening"
        );
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}

#[cfg(test)]
mod tests {
    use certchain_types::Block;

    use super::*;

    fn config_in(dir: &std::path::Path) -> ServerConfig {
        let mut config = ServerConfig::default();
        config.ledger.replica_root = dir.join("NODES");
        config.qr_dir = dir.join("QRcodes");
        config
    }

    #[test]
    fn construction_seeds_genesis() {
        let dir = tempfile::tempdir().unwrap();
        let server = CertchainServer::new(config_in(dir.path())).unwrap();
        assert_eq!(server.config().bind_addr.port(), 5000);
        for replica in server.service().ledger().replicas() {
            assert_eq!(replica.read_replica(), vec![Block::genesis()]);
        }
    }

    #[test]
    fn corrupt_replica_blocks_startup() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let n2 = config.ledger.replica_root.join("N2");
        std::fs::create_dir_all(&n2).unwrap();
        std::fs::write(n2.join("blockchain.json"), b"{oops").unwrap();
        assert!(matches!(
            CertchainServer::new(config),
            Err(ServerError::Ledger(_))
        ));
    }

    #[test]
    fn router_builds() {
        let dir = tempfile::tempdir().unwrap();
        let server = CertchainServer::new(config_in(dir.path())).unwrap();
        let _router = server.router();
    }
}
