//! Network parameters
//!
//! The network-wide operating parameters every node must agree on. Exactly one
//! signed document is current at any time; each change produces a new document
//! with a strictly larger epoch.

use crate::crypto::SignedData;
use crate::error::{NetmapError, Result};
use crate::hash::SecureHash;
use crate::types::NotaryInfo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Epoch of the first parameters document a fresh authority publishes
pub const INITIAL_EPOCH: i32 = 10;

/// Largest message a node will accept, in bytes
pub const DEFAULT_MAX_MESSAGE_SIZE: i32 = 10_485_760 * 10;

/// Largest transaction a node will accept, in bytes
pub const DEFAULT_MAX_TRANSACTION_SIZE: i32 = 10_485_760 * 5;

/// How long a node may stay offline before it is considered gone
pub const DEFAULT_EVENT_HORIZON_SECS: i64 = 30 * 24 * 60 * 60;

/// A signed parameters document
pub type SignedNetworkParameters = SignedData<NetworkParameters>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkParameters {
    pub minimum_platform_version: i32,
    pub notaries: Vec<NotaryInfo>,
    pub max_message_size: i32,
    pub max_transaction_size: i32,
    pub modified_time: DateTime<Utc>,
    pub epoch: i32,

    /// Contract class name to the attachment hashes allowed to implement it
    #[serde(default)]
    pub whitelisted_contract_implementations: BTreeMap<String, Vec<SecureHash>>,

    pub event_horizon_secs: i64,
}

impl NetworkParameters {
    /// First document of a new network
    pub fn initial(
        minimum_platform_version: i32,
        notaries: Vec<NotaryInfo>,
        modified_time: DateTime<Utc>,
    ) -> Result<Self> {
        let params = Self {
            minimum_platform_version,
            notaries,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            max_transaction_size: DEFAULT_MAX_TRANSACTION_SIZE,
            modified_time,
            epoch: INITIAL_EPOCH,
            whitelisted_contract_implementations: BTreeMap::new(),
            event_horizon_secs: DEFAULT_EVENT_HORIZON_SECS,
        };
        params.validate()?;
        Ok(params)
    }

    /// Successor with epoch + 1 and a refreshed notary list
    pub fn bump_epoch(&self, notaries: Vec<NotaryInfo>, modified_time: DateTime<Utc>) -> Result<Self> {
        let epoch = self
            .epoch
            .checked_add(1)
            .ok_or_else(|| invalid("epoch overflow"))?;
        let next = Self {
            notaries,
            modified_time,
            epoch,
            ..self.clone()
        };
        next.validate()?;
        Ok(next)
    }

    /// Successor with epoch + 1 and minimum platform version + 1
    pub fn bump_minimum_platform_version(
        &self,
        notaries: Vec<NotaryInfo>,
        modified_time: DateTime<Utc>,
    ) -> Result<Self> {
        let mut next = self.bump_epoch(notaries, modified_time)?;
        next.minimum_platform_version = self
            .minimum_platform_version
            .checked_add(1)
            .ok_or_else(|| invalid("platform version overflow"))?;
        Ok(next)
    }

    /// Structural rules every published document must satisfy
    pub fn validate(&self) -> Result<()> {
        if self.minimum_platform_version < 1 {
            return Err(invalid("minimum platform version must be at least 1"));
        }
        if self.max_message_size <= 0 {
            return Err(invalid("max message size must be positive"));
        }
        if self.max_transaction_size <= 0 {
            return Err(invalid("max transaction size must be positive"));
        }
        if self.max_transaction_size > self.max_message_size {
            return Err(invalid("max transaction size cannot exceed max message size"));
        }
        if self.epoch <= 0 {
            return Err(invalid("epoch must be positive"));
        }
        if self.event_horizon_secs <= 0 {
            return Err(invalid("event horizon must be positive"));
        }

        let mut seen = HashSet::new();
        for notary in &self.notaries {
            if !seen.insert(notary.identity.name.as_str()) {
                return Err(invalid(&format!("duplicate notary {}", notary.identity.name)));
            }
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> NetmapError {
    NetmapError::InvalidParameters(msg.to_string())
}
