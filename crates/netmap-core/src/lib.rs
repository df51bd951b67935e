//! # Netmap Core
//!
//! Documents and codec for a permissioned network's directory service.
//!
//! ## Key Concepts
//!
//! - **NodeInfo**: a participant's signed description of itself, addressed by
//!   the SHA-256 of its payload
//! - **NetworkParameters**: the network-wide settings, versioned by epoch
//! - **NetworkMap**: the set of current node info hashes plus the hash of the
//!   current parameters
//! - **SignedData**: a COSE_Sign1 envelope carrying a document, an ES256
//!   signature and the signer's certificate
//!
//! Every document is serialized canonically so its hash is a pure function of
//! its contents.

pub mod crypto;
pub mod error;
pub mod hash;
pub mod network_map;
pub mod node_info;
pub mod params;
pub mod types;

pub use crypto::{generate_key_pair, CertificateAndKeyPair, SignedData};
pub use error::{NetmapError, Result};
pub use hash::SecureHash;
pub use network_map::{NetworkMap, ParametersUpdate, SignedNetworkMap};
pub use node_info::{NodeInfo, SignedNodeInfo};
pub use params::{NetworkParameters, SignedNetworkParameters};
pub use types::{DistinguishedName, NetworkHostAndPort, NotaryInfo, Party};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
