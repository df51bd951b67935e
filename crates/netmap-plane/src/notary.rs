//! Notary resolution
//!
//! The notary list is resolved at startup and again on every parameters bump,
//! so edits to the notaries file are picked up by the next bump.
//!
//! File format:
//!
//! ```json
//! { "list": [ { "nodeCertificateLocation": "notary.pem", "validating": false } ] }
//! ```
//!
//! Relative certificate paths are resolved against the directory holding the
//! notaries file.

use netmap_core::{NotaryInfo, Party};
use openssl::x509::X509;
use serde::Deserialize;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum NotaryError {
    #[error("Cannot read {path}: {message}")]
    Io { path: String, message: String },

    #[error("Invalid notaries file: {0}")]
    Parse(String),

    #[error("Invalid notary certificate {path}: {message}")]
    Certificate { path: String, message: String },
}

/// Source of the current notary list
pub trait NotarySource: Send + Sync + Debug {
    fn resolve(&self) -> Result<Vec<NotaryInfo>, NotaryError>;
}

/// Fixed notary list
#[derive(Debug, Clone, Default)]
pub struct StaticNotarySource {
    notaries: Vec<NotaryInfo>,
}

impl StaticNotarySource {
    pub fn new(notaries: Vec<NotaryInfo>) -> Self {
        Self { notaries }
    }
}

impl NotarySource for StaticNotarySource {
    fn resolve(&self) -> Result<Vec<NotaryInfo>, NotaryError> {
        Ok(self.notaries.clone())
    }
}

/// Notaries described by a JSON file of PEM identity certificates
#[derive(Debug, Clone)]
pub struct FileNotarySource {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct NotariesFile {
    list: Vec<NotaryEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NotaryEntry {
    node_certificate_location: PathBuf,
    validating: bool,
}

impl FileNotarySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn certificate_path(&self, location: &Path) -> PathBuf {
        if location.is_absolute() {
            return location.to_path_buf();
        }
        match self.path.parent() {
            Some(dir) => dir.join(location),
            None => location.to_path_buf(),
        }
    }
}

impl NotarySource for FileNotarySource {
    fn resolve(&self) -> Result<Vec<NotaryInfo>, NotaryError> {
        let contents = std::fs::read(&self.path).map_err(|e| NotaryError::Io {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;
        let file: NotariesFile =
            serde_json::from_slice(&contents).map_err(|e| NotaryError::Parse(e.to_string()))?;

        let mut notaries = Vec::with_capacity(file.list.len());
        for entry in file.list {
            let path = self.certificate_path(&entry.node_certificate_location);
            let shown = path.display().to_string();

            let pem = std::fs::read(&path).map_err(|e| NotaryError::Io {
                path: shown.clone(),
                message: e.to_string(),
            })?;
            let certificate = X509::from_pem(&pem).map_err(|e| NotaryError::Certificate {
                path: shown.clone(),
                message: e.to_string(),
            })?;
            let identity = Party::from_certificate(&certificate).map_err(|e| NotaryError::Certificate {
                path: shown.clone(),
                message: e.to_string(),
            })?;

            debug!(name = %identity.name, validating = entry.validating, "Resolved notary");
            notaries.push(NotaryInfo {
                identity,
                validating: entry.validating,
            });
        }
        Ok(notaries)
    }
}
