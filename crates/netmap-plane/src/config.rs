//! Service configuration from environment variables
//!
//! | Variable | Default |
//! |---|---|
//! | `NETMAP_PORT` | `8080` |
//! | `DOORMAN_CN` | `CN=Corda Doorman CA` |
//! | `NETWORK_MAP_CN` | `CN=NetworkMap` |
//! | `MINIMUM_PLATFORM_VERSION` | `1` |
//! | `NOTARIES` | unset: no notaries |
//! | `ROOT_CA_CERT_PATH` / `ROOT_CA_KEY_PATH` | unset: generated development root |

use netmap_core::DistinguishedName;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DOORMAN_NAME: &str = "CN=Corda Doorman CA";
pub const DEFAULT_NETWORK_MAP_NAME: &str = "CN=NetworkMap";
pub const DEFAULT_MINIMUM_PLATFORM_VERSION: i32 = 1;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} has an invalid value '{value}': {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("ROOT_CA_CERT_PATH and ROOT_CA_KEY_PATH must be set together")]
    IncompleteTrustAnchor,
}

/// Where the trust anchor comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustAnchorSource {
    /// Generate a fresh development root at startup
    Development,
    /// Load PEM certificate and private key files
    Files { certificate: PathBuf, private_key: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub port: u16,
    pub doorman_name: String,
    pub network_map_name: String,
    pub minimum_platform_version: i32,
    pub notaries_path: Option<PathBuf>,
    pub trust_anchor: TrustAnchorSource,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            doorman_name: DEFAULT_DOORMAN_NAME.into(),
            network_map_name: DEFAULT_NETWORK_MAP_NAME.into(),
            minimum_platform_version: DEFAULT_MINIMUM_PLATFORM_VERSION,
            notaries_path: None,
            trust_anchor: TrustAnchorSource::Development,
        }
    }
}

impl ServiceConfig {
    /// Read the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, which returns a variable's value if set
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = match lookup("NETMAP_PORT") {
            Some(value) => value.trim().parse::<u16>().map_err(|e| {
                ConfigError::InvalidValue {
                    name: "NETMAP_PORT",
                    value: value.clone(),
                    reason: e.to_string(),
                }
            })?,
            None => defaults.port,
        };

        let doorman_name = name_var(&lookup, "DOORMAN_CN")?.unwrap_or(defaults.doorman_name);
        let network_map_name =
            name_var(&lookup, "NETWORK_MAP_CN")?.unwrap_or(defaults.network_map_name);

        let minimum_platform_version = match lookup("MINIMUM_PLATFORM_VERSION") {
            Some(value) => {
                let parsed = value.trim().parse::<i32>().map_err(|e| {
                    ConfigError::InvalidValue {
                        name: "MINIMUM_PLATFORM_VERSION",
                        value: value.clone(),
                        reason: e.to_string(),
                    }
                })?;
                if parsed < 1 {
                    return Err(ConfigError::InvalidValue {
                        name: "MINIMUM_PLATFORM_VERSION",
                        value,
                        reason: "must be at least 1".into(),
                    });
                }
                parsed
            }
            None => defaults.minimum_platform_version,
        };

        let notaries_path = non_empty(lookup("NOTARIES")).map(PathBuf::from);

        let trust_anchor = match (
            non_empty(lookup("ROOT_CA_CERT_PATH")),
            non_empty(lookup("ROOT_CA_KEY_PATH")),
        ) {
            (Some(certificate), Some(private_key)) => TrustAnchorSource::Files {
                certificate: certificate.into(),
                private_key: private_key.into(),
            },
            (None, None) => TrustAnchorSource::Development,
            _ => return Err(ConfigError::IncompleteTrustAnchor),
        };

        Ok(Self {
            port,
            doorman_name,
            network_map_name,
            minimum_platform_version,
            notaries_path,
            trust_anchor,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn name_var(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<String>, ConfigError> {
    let Some(value) = non_empty(lookup(name)) else {
        return Ok(None);
    };
    DistinguishedName::parse(&value).map_err(|e| ConfigError::InvalidValue {
        name,
        value: value.clone(),
        reason: e.to_string(),
    })?;
    Ok(Some(value))
}
