//! Network Map Authority
//!
//! Doorman and network map service for a permissioned peer network:
//! - Signs node CA certificates from PKCS#10 requests
//! - Registers signed node infos and publishes a signed network map
//! - Versions the network parameters every node must agree on
//!
//! All state changes go through a single authority actor, so every published
//! map reflects a consistent registry and parameter set.
//!
//! ## API Endpoints
//!
//! ### Doorman
//! - `GET /ping` - Liveness check
//! - `GET /truststore`, `GET /trustStore` - Trust anchor store download
//! - `POST /certificate` - Submit a CSR, returns the request id
//! - `GET /certificate/{id}` - Signed certificate chain archive
//!
//! ### Network Map
//! - `GET /network-map` - Current signed network map
//! - `GET /network-map/network-parameters/{hash}` - Current signed parameters
//! - `GET /network-map/node-info/{hash}` - A registered signed node info
//! - `POST /network-map/publish` - Register a signed node info
//! - `GET /network-map/map-stats` - Registry summary
//! - `GET /network-map/reset-persisted-nodes` - Clear the registry
//! - `GET /network-map/bumpEpoch` - Advance the parameters epoch
//! - `GET /network-map/bumpMPV` - Raise the minimum platform version

pub mod api;
pub mod bootstrap;
pub mod ca;
pub mod config;
pub mod core;
pub mod csr;
pub mod notary;
pub mod storage;

#[cfg(test)]
mod testing;

pub use api::create_router;
pub use api::state::AppState;
pub use bootstrap::{bootstrap, bootstrap_with, Service, StartupError};
pub use ca::CertificateAuthority;
pub use config::{ServiceConfig, TrustAnchorSource};
pub use core::{AuthorityHandle, PublicationCache};
pub use notary::{FileNotarySource, NotarySource, StaticNotarySource};
pub use storage::{MemoryStore, NodeInfoStore};
