//! Error types for network map documents and the signed-envelope codec

use thiserror::Error;

/// Result type alias using NetmapError
pub type Result<T> = std::result::Result<T, NetmapError>;

/// Errors that can occur while encoding, decoding, hashing or signing documents
#[derive(Error, Debug)]
pub enum NetmapError {
    /// Signature did not verify against the signer certificate
    #[error("Signature verification failed: {0}")]
    InvalidSignature(String),

    /// A string was not a valid 64 character hex SHA-256 hash
    #[error("Invalid secure hash: {0}")]
    InvalidHash(String),

    /// A distinguished name string could not be parsed
    #[error("Invalid distinguished name: {0}")]
    InvalidName(String),

    /// Certificate could not be decoded or is unusable
    #[error("Certificate error: {0}")]
    Certificate(String),

    /// Participant record violates a structural rule
    #[error("Invalid node info: {0}")]
    InvalidNodeInfo(String),

    /// Network parameters violate a structural rule
    #[error("Invalid network parameters: {0}")]
    InvalidParameters(String),

    /// COSE encoding/decoding error
    #[error("COSE error: {0}")]
    CoseError(String),

    /// Payload serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Low-level cryptographic failure
    #[error("Cryptographic error: {0}")]
    CryptoError(String),

    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(String),
}

impl From<openssl::error::ErrorStack> for NetmapError {
    fn from(err: openssl::error::ErrorStack) -> Self {
        NetmapError::CryptoError(err.to_string())
    }
}

impl From<serde_json::Error> for NetmapError {
    fn from(err: serde_json::Error) -> Self {
        NetmapError::SerializationError(err.to_string())
    }
}

impl From<coset::CoseError> for NetmapError {
    fn from(err: coset::CoseError) -> Self {
        NetmapError::CoseError(format!("{:?}", err))
    }
}
