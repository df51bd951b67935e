//! Shared handler state

use std::sync::Arc;

use crate::core::{AuthorityHandle, PublicationCache};
use crate::storage::NodeInfoStore;

/// Application state shared across handlers
///
/// Mutations go through `authority`; reads use `publications` and `store`
/// directly and never wait on the actor.
#[derive(Debug, Clone)]
pub struct AppState {
    pub authority: AuthorityHandle,
    pub publications: Arc<PublicationCache>,
    pub store: Arc<dyn NodeInfoStore>,
    /// PKCS#12 trust store served at `/truststore`
    pub truststore: Arc<[u8]>,
}
