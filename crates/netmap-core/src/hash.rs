//! Content hashing
//!
//! Every participant record and parameters document is addressed by the
//! SHA-256 of its canonical payload bytes. Hashes travel as 64 hex
//! characters, uppercase on output and case-insensitive on input.

use crate::error::{NetmapError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// SHA-256 content address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct SecureHash([u8; 32]);

impl SecureHash {
    /// Hash arbitrary bytes
    pub fn sha256(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Parse a 64 character hex string
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| NetmapError::InvalidHash(format!("{}: {}", s, e)))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for SecureHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.0))
    }
}

impl FromStr for SecureHash {
    type Err = NetmapError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<SecureHash> for String {
    fn from(hash: SecureHash) -> Self {
        hash.to_string()
    }
}

impl TryFrom<String> for SecureHash {
    type Error = NetmapError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}
