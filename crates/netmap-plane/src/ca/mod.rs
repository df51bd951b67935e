//! Certificate authority hierarchy
//!
//! ```text
//! trust anchor (root, self-signed)
//!   ├── doorman CA        signs node CA certificates from CSRs
//!   └── network map CA    signs network maps and parameters
//! ```

pub mod authority;
pub mod name_constraints;

pub use authority::{
    dev_trust_anchor, trust_anchor_from_pem, CertificateAuthority, IssuedCertificate,
    TRUSTSTORE_PASSWORD,
};

use thiserror::Error;

/// Errors raised while deriving CAs or issuing certificates
#[derive(Error, Debug)]
pub enum AuthorityError {
    /// The request could not be parsed or its self-signature is bad
    #[error("Malformed certificate request: {0}")]
    MalformedRequest(String),

    /// A freshly issued certificate failed its own checks
    #[error("Signing invariant violated: {0}")]
    SigningInvariantViolation(String),

    /// The trust anchor is unusable
    #[error("Invalid trust anchor: {0}")]
    InvalidTrustAnchor(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Archive error: {0}")]
    Archive(String),
}

impl From<openssl::error::ErrorStack> for AuthorityError {
    fn from(err: openssl::error::ErrorStack) -> Self {
        AuthorityError::Crypto(err.to_string())
    }
}

impl From<netmap_core::NetmapError> for AuthorityError {
    fn from(err: netmap_core::NetmapError) -> Self {
        AuthorityError::Crypto(err.to_string())
    }
}

impl From<std::io::Error> for AuthorityError {
    fn from(err: std::io::Error) -> Self {
        AuthorityError::Archive(err.to_string())
    }
}
