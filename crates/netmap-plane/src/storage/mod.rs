//! Participant registry storage
//!
//! Content-addressed store of signed node info records, keyed by the hash of
//! each record's payload. The trait keeps the actor independent of the
//! backend; the in-memory store is the only one shipped.

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use netmap_core::{SecureHash, SignedNodeInfo};
use std::collections::BTreeSet;
use std::fmt::Debug;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Lock poisoned: {0}")]
    Poisoned(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// A participant record as it was submitted
#[derive(Debug, Clone)]
pub struct StoredNodeInfo {
    /// Hash of the record's payload
    pub hash: SecureHash,
    /// Decoded envelope
    pub signed: SignedNodeInfo,
    /// Exact bytes the node published
    pub bytes: Vec<u8>,
}

impl StoredNodeInfo {
    /// Decode submitted bytes, keeping them verbatim
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, StorageError> {
        let signed = SignedNodeInfo::from_bytes(&bytes)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(Self {
            hash: signed.raw_hash(),
            signed,
            bytes,
        })
    }
}

/// Storage backend for participant records
///
/// `save` and `clear` are exclusive with respect to every other call; lookups
/// may run concurrently with each other.
#[async_trait]
pub trait NodeInfoStore: Send + Sync + Debug {
    /// Insert or overwrite the record under its hash
    async fn save(&self, record: StoredNodeInfo) -> Result<(), StorageError>;

    /// Look up a record by hash
    async fn find_by_hash(&self, hash: &SecureHash) -> Result<Option<StoredNodeInfo>, StorageError>;

    /// Every stored hash
    async fn all_hashes(&self) -> Result<BTreeSet<SecureHash>, StorageError>;

    /// Every stored record
    async fn all(&self) -> Result<Vec<StoredNodeInfo>, StorageError>;

    /// Remove everything, returning how many records were dropped
    async fn clear(&self) -> Result<usize, StorageError>;
}
