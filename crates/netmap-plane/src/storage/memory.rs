//! In-memory storage backend
//!
//! Records live in a single hashmap behind a reader/writer lock. Data is lost
//! on restart.

use async_trait::async_trait;
use netmap_core::SecureHash;
use std::collections::{BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

use super::{NodeInfoStore, StorageError, StoredNodeInfo};

/// In-memory participant registry
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<SecureHash, StoredNodeInfo>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<SecureHash, StoredNodeInfo>>, StorageError> {
        self.records
            .read()
            .map_err(|e| StorageError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<SecureHash, StoredNodeInfo>>, StorageError> {
        self.records
            .write()
            .map_err(|e| StorageError::Poisoned(e.to_string()))
    }
}

#[async_trait]
impl NodeInfoStore for MemoryStore {
    async fn save(&self, record: StoredNodeInfo) -> Result<(), StorageError> {
        let hash = record.hash;
        let mut records = self.write()?;
        let replaced = records.insert(hash, record).is_some();
        info!(hash = %hash, replaced, "Saved node info");
        Ok(())
    }

    async fn find_by_hash(&self, hash: &SecureHash) -> Result<Option<StoredNodeInfo>, StorageError> {
        let records = self.read()?;
        Ok(records.get(hash).cloned())
    }

    async fn all_hashes(&self) -> Result<BTreeSet<SecureHash>, StorageError> {
        let records = self.read()?;
        Ok(records.keys().copied().collect())
    }

    async fn all(&self) -> Result<Vec<StoredNodeInfo>, StorageError> {
        let records = self.read()?;
        Ok(records.values().cloned().collect())
    }

    async fn clear(&self) -> Result<usize, StorageError> {
        let mut records = self.write()?;
        let removed = records.len();
        records.clear();
        info!(removed, "Cleared node info registry");
        Ok(removed)
    }
}
