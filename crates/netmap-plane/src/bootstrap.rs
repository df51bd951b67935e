//! Service assembly
//!
//! Builds the certificate authority, starts the authority actor and waits for
//! the first network map before handing back the router state. Any failure
//! here means the service never becomes ready.

use std::sync::Arc;

use netmap_core::CertificateAndKeyPair;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::info;

use crate::api::state::AppState;
use crate::ca::{dev_trust_anchor, trust_anchor_from_pem, AuthorityError, CertificateAuthority};
use crate::config::{ConfigError, ServiceConfig, TrustAnchorSource};
use crate::core::{AuthorityActor, PublicationCache, ServiceError};
use crate::csr::CsrIntake;
use crate::notary::{FileNotarySource, NotarySource, StaticNotarySource};
use crate::storage::{MemoryStore, NodeInfoStore};

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cannot read {path}: {message}")]
    Io { path: String, message: String },

    #[error("Certificate authority error: {0}")]
    Authority(#[from] AuthorityError),

    #[error("Authority actor failed to start: {0}")]
    Actor(#[from] ServiceError),
}

/// A started authority
#[derive(Debug)]
pub struct Service {
    pub state: Arc<AppState>,
    pub actor: JoinHandle<()>,
}

/// Load or generate the trust anchor described by `source`
pub fn load_trust_anchor(source: &TrustAnchorSource) -> Result<CertificateAndKeyPair, StartupError> {
    match source {
        TrustAnchorSource::Development => Ok(dev_trust_anchor()?),
        TrustAnchorSource::Files {
            certificate,
            private_key,
        } => {
            let read = |path: &std::path::Path| {
                std::fs::read(path).map_err(|e| StartupError::Io {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })
            };
            let anchor = trust_anchor_from_pem(&read(certificate)?, &read(private_key)?)?;
            info!(path = %certificate.display(), "Loaded trust anchor");
            Ok(anchor)
        }
    }
}

/// Notary source for the configured notaries file, or none
pub fn notary_source(config: &ServiceConfig) -> Arc<dyn NotarySource> {
    match &config.notaries_path {
        Some(path) => Arc::new(FileNotarySource::new(path.clone())),
        None => Arc::new(StaticNotarySource::default()),
    }
}

/// Assemble the service from configuration
pub async fn bootstrap(config: &ServiceConfig) -> Result<Service, StartupError> {
    let trust_anchor = load_trust_anchor(&config.trust_anchor)?;
    bootstrap_with(config, trust_anchor, notary_source(config)).await
}

/// Assemble the service around an explicit trust anchor and notary source
pub async fn bootstrap_with(
    config: &ServiceConfig,
    trust_anchor: CertificateAndKeyPair,
    notaries: Arc<dyn NotarySource>,
) -> Result<Service, StartupError> {
    let authority = Arc::new(CertificateAuthority::bootstrap(
        trust_anchor,
        &config.doorman_name,
        &config.network_map_name,
    )?);
    let truststore: Arc<[u8]> = Arc::from(authority.truststore());

    let store: Arc<dyn NodeInfoStore> = Arc::new(MemoryStore::new());
    let publications = Arc::new(PublicationCache::new());

    let (handle, actor) = AuthorityActor::start(
        authority,
        Arc::new(CsrIntake::new()),
        store.clone(),
        notaries,
        publications.clone(),
        config.minimum_platform_version,
    )
    .await?;

    info!(
        minimum_platform_version = config.minimum_platform_version,
        "Network map authority ready"
    );

    Ok(Service {
        state: Arc::new(AppState {
            authority: handle,
            publications,
            store,
            truststore,
        }),
        actor,
    })
}
