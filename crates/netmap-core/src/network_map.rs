//! The network map snapshot

use crate::crypto::SignedData;
use crate::hash::SecureHash;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A signed network map
pub type SignedNetworkMap = SignedData<NetworkMap>;

/// Hashes of every participant record plus the current parameters hash
///
/// Rebuilt wholesale after every registry or parameters change. Node info
/// hashes are kept sorted so one registry state always yields the same payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkMap {
    pub node_info_hashes: Vec<SecureHash>,
    pub network_parameter_hash: SecureHash,
    pub parameters_update: Option<ParametersUpdate>,
}

impl NetworkMap {
    pub fn new(
        node_info_hashes: impl IntoIterator<Item = SecureHash>,
        network_parameter_hash: SecureHash,
    ) -> Self {
        let mut node_info_hashes: Vec<SecureHash> = node_info_hashes.into_iter().collect();
        node_info_hashes.sort();
        node_info_hashes.dedup();
        Self {
            node_info_hashes,
            network_parameter_hash,
            parameters_update: None,
        }
    }

    pub fn contains(&self, hash: &SecureHash) -> bool {
        self.node_info_hashes.binary_search(hash).is_ok()
    }
}

/// Advertisement of a scheduled parameters change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParametersUpdate {
    pub new_parameters_hash: SecureHash,
    pub description: String,
    pub update_deadline: DateTime<Utc>,
}
