//! Participant records

use crate::crypto::SignedData;
use crate::error::{NetmapError, Result};
use crate::types::{NetworkHostAndPort, Party};
use serde::{Deserialize, Serialize};

/// A node's self-signed description of itself
pub type SignedNodeInfo = SignedData<NodeInfo>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub addresses: Vec<NetworkHostAndPort>,

    /// The first identity is the node's own; the signer must hold its key
    pub legal_identities: Vec<Party>,

    pub platform_version: i32,

    /// Bumped by the node whenever it republishes
    pub serial: i64,
}

impl NodeInfo {
    pub fn primary_identity(&self) -> Option<&Party> {
        self.legal_identities.first()
    }
}

impl SignedData<NodeInfo> {
    /// Check the record is signed by its own primary identity and decode it
    pub fn verified_node_info(&self) -> Result<NodeInfo> {
        let node_info = self.verified()?;

        let primary = node_info
            .primary_identity()
            .ok_or_else(|| NetmapError::InvalidNodeInfo("no legal identities".into()))?;
        let signer = self.signer_certificate()?.to_der()?;
        if signer != primary.certificate {
            return Err(NetmapError::InvalidNodeInfo(format!(
                "signer is not the primary identity {}",
                primary.name
            )));
        }
        if node_info.platform_version < 1 {
            return Err(NetmapError::InvalidNodeInfo(format!(
                "platform version {} is not positive",
                node_info.platform_version
            )));
        }
        Ok(node_info)
    }
}
