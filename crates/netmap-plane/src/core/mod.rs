//! Core authority logic
//!
//! All mutations (certificate requests, node info submissions, registry
//! resets, parameter bumps) are applied by one actor task in submission order.
//! Every mutation that changes the map ends with a rebuild, and the rebuilt
//! artifacts are swapped into the publication cache in one step.

pub mod actor;
pub mod map_builder;
pub mod params;
pub mod publication;

pub use actor::{AuthorityActor, AuthorityHandle, Command, COMMAND_QUEUE_CAPACITY};
pub use map_builder::NetworkMapBuilder;
pub use params::NetworkParametersStore;
pub use publication::{Publication, PublicationCache};

use thiserror::Error;

use crate::ca::AuthorityError;
use crate::notary::NotaryError;
use crate::storage::StorageError;

/// Outcome classes of authority operations
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Unparseable or unverifiable input; nothing was changed
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Unknown request id or hash
    #[error("Not found: {0}")]
    NotFound(String),

    /// A freshly issued certificate failed its own checks
    #[error("Signing invariant violated: {0}")]
    SigningInvariantViolation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AuthorityError> for ServiceError {
    fn from(err: AuthorityError) -> Self {
        match err {
            AuthorityError::MalformedRequest(msg) => ServiceError::MalformedRequest(msg),
            AuthorityError::SigningInvariantViolation(msg) => {
                ServiceError::SigningInvariantViolation(msg)
            }
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

impl From<NotaryError> for ServiceError {
    fn from(err: NotaryError) -> Self {
        ServiceError::Internal(format!("notary resolution failed: {}", err))
    }
}

impl From<netmap_core::NetmapError> for ServiceError {
    fn from(err: netmap_core::NetmapError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}
