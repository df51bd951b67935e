//! Certificate request intake
//!
//! Requests are stored under an opaque random identifier and signed on every
//! retrieval. Inserts are made by the authority actor only; lookups may come
//! from anywhere.

pub mod request;

pub use request::CertificateRequest;

use std::collections::HashMap;
use std::sync::RwLock;
use tracing::{debug, info};

use crate::ca::{AuthorityError, CertificateAuthority, IssuedCertificate};

const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Pending certificate requests by identifier
#[derive(Debug, Default)]
pub struct CsrIntake {
    requests: RwLock<HashMap<String, CertificateRequest>>,
}

impl CsrIntake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and store a raw request, returning its identifier
    pub fn submit(&self, raw: &[u8]) -> Result<String, AuthorityError> {
        let request = CertificateRequest::parse(raw)?;

        let mut requests = self
            .requests
            .write()
            .map_err(|e| AuthorityError::Crypto(format!("request map poisoned: {}", e)))?;
        let id = loop {
            let candidate = new_request_id();
            if !requests.contains_key(&candidate) {
                break candidate;
            }
        };

        info!(id = %id, subject = %request.subject(), "Stored certificate request");
        requests.insert(id.clone(), request);
        Ok(id)
    }

    /// Sign the request stored under `id`, if any
    pub fn retrieve(
        &self,
        id: &str,
        authority: &CertificateAuthority,
    ) -> Result<Option<IssuedCertificate>, AuthorityError> {
        let requests = self
            .requests
            .read()
            .map_err(|e| AuthorityError::Crypto(format!("request map poisoned: {}", e)))?;
        let Some(request) = requests.get(id) else {
            debug!(id = %id, "Unknown certificate request");
            return Ok(None);
        };
        authority.issue(request).map(Some)
    }

    pub fn len(&self) -> usize {
        self.requests.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 128 random bits in lowercase base 36
pub fn new_request_id() -> String {
    to_base36(rand::random::<u128>())
}

fn to_base36(mut value: u128) -> String {
    if value == 0 {
        return "0".into();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}
