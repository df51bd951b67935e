//! Publication cache
//!
//! Holds the latest signed network map and parameters as one immutable value.
//! The actor replaces it wholesale; readers take a cheap `Arc` clone and never
//! wait on the actor.

use netmap_core::{NetworkMap, NetworkParameters, SecureHash};
use std::sync::Arc;
use tokio::sync::watch;

/// Everything served to map readers, built together
#[derive(Debug, Clone)]
pub struct Publication {
    pub network_map: NetworkMap,
    /// Serialized signed network map
    pub network_map_bytes: Vec<u8>,
    pub network_map_hash: SecureHash,
    pub parameters: NetworkParameters,
    /// Serialized signed parameters
    pub parameters_bytes: Vec<u8>,
    /// Content address the map refers to
    pub parameters_hash: SecureHash,
}

#[derive(Debug)]
pub struct PublicationCache {
    sender: watch::Sender<Option<Arc<Publication>>>,
}

impl Default for PublicationCache {
    fn default() -> Self {
        Self::new()
    }
}

impl PublicationCache {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender }
    }

    /// Swap in a complete new publication
    pub fn publish(&self, publication: Publication) {
        self.sender.send_replace(Some(Arc::new(publication)));
    }

    /// Latest publication, `None` until the first build
    pub fn latest(&self) -> Option<Arc<Publication>> {
        self.sender.borrow().clone()
    }

    /// Receiver notified on every publication
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Publication>>> {
        self.sender.subscribe()
    }
}
