//! HTTP server for certchain.
//!
//! Exposes certificate issuance, public verification, certificate download,
//! institution/company/student accounts with company access grants,
//! company-scoped verification, and the ledger consistency probe over HTTP.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use router::{build_router, AppState};
pub use server::CertchainServer;
