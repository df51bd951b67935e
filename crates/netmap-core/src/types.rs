//! Common types shared by network map documents

use crate::error::{NetmapError, Result};
use openssl::x509::{X509Name, X509NameRef, X509};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A network identity: its X.500 name and the DER certificate binding it to a key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    /// Textual X.500 name, e.g. "CN=Notary, O=Org, L=London, C=GB"
    pub name: String,

    /// DER encoded identity certificate
    #[serde(with = "der_base64")]
    pub certificate: Vec<u8>,
}

impl Party {
    /// Build a party from a parsed certificate, naming it after the subject
    pub fn from_certificate(certificate: &X509) -> Result<Self> {
        let name = DistinguishedName::from_x509_name(certificate.subject_name())?;
        Ok(Self {
            name: name.to_string(),
            certificate: certificate.to_der()?,
        })
    }

    /// Decode the identity certificate
    pub fn x509(&self) -> Result<X509> {
        X509::from_der(&self.certificate).map_err(|e| NetmapError::Certificate(e.to_string()))
    }

    /// Parsed form of the name
    pub fn distinguished_name(&self) -> Result<DistinguishedName> {
        DistinguishedName::parse(&self.name)
    }
}

/// A trusted coordinator ("notary") entry of the network parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotaryInfo {
    pub identity: Party,
    pub validating: bool,
}

/// Advertised network endpoint of a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkHostAndPort {
    pub host: String,
    pub port: u16,
}

/// Ordered X.500 distinguished name
///
/// Parses and renders the `"CN=Alice, O=Org, L=London, C=GB"` form. Attribute
/// keys are normalized to uppercase; values are kept verbatim. Escaped commas
/// are not supported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistinguishedName {
    attributes: Vec<(String, String)>,
}

impl DistinguishedName {
    /// Parse the textual form
    pub fn parse(s: &str) -> Result<Self> {
        let mut attributes = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| NetmapError::InvalidName(format!("missing '=' in '{}'", part)))?;
            let key = key.trim().to_uppercase();
            let value = value.trim();
            if key.is_empty() || value.is_empty() {
                return Err(NetmapError::InvalidName(format!("empty attribute in '{}'", part)));
            }
            attributes.push((key, value.to_string()));
        }

        if attributes.is_empty() {
            return Err(NetmapError::InvalidName(format!("no attributes in '{}'", s)));
        }
        Ok(Self { attributes })
    }

    /// Read an OpenSSL name, keeping entry order
    pub fn from_x509_name(name: &X509NameRef) -> Result<Self> {
        let mut attributes = Vec::new();
        for entry in name.entries() {
            let key = entry.object().nid().short_name()?.to_string();
            let value = entry.data().as_utf8()?.to_string();
            attributes.push((key, value));
        }
        if attributes.is_empty() {
            return Err(NetmapError::InvalidName("empty subject".into()));
        }
        Ok(Self { attributes })
    }

    /// Build an OpenSSL name with the same entries in the same order
    pub fn to_x509_name(&self) -> Result<X509Name> {
        let mut builder = X509Name::builder()?;
        for (key, value) in &self.attributes {
            builder.append_entry_by_text(key, value).map_err(|e| {
                NetmapError::InvalidName(format!("unsupported attribute {}={}: {}", key, value, e))
            })?;
        }
        Ok(builder.build())
    }

    /// First value of an attribute, by its short name
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn common_name(&self) -> Option<&str> {
        self.get("CN")
    }

    pub fn organisation(&self) -> Option<&str> {
        self.get("O")
    }

    pub fn organisation_unit(&self) -> Option<&str> {
        self.get("OU")
    }

    pub fn locality(&self) -> Option<&str> {
        self.get("L")
    }

    pub fn country(&self) -> Option<&str> {
        self.get("C")
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in &self.attributes {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", key, value)?;
            first = false;
        }
        Ok(())
    }
}

impl std::str::FromStr for DistinguishedName {
    type Err = NetmapError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Serde adapter carrying DER bytes as standard base64 text
mod der_base64 {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let dn = DistinguishedName::parse("CN=Alice,  O=Alice Corp ,L=London, c=GB").unwrap();
        assert_eq!(dn.common_name(), Some("Alice"));
        assert_eq!(dn.organisation(), Some("Alice Corp"));
        assert_eq!(dn.locality(), Some("London"));
        assert_eq!(dn.country(), Some("GB"));
        assert_eq!(dn.organisation_unit(), None);
        assert_eq!(dn.to_string(), "CN=Alice, O=Alice Corp, L=London, C=GB");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(DistinguishedName::parse("").is_err());
        assert!(DistinguishedName::parse("Alice").is_err());
        assert!(DistinguishedName::parse("CN=").is_err());
        assert!(DistinguishedName::parse("=Alice").is_err());
    }

    #[test]
    fn test_x509_name_roundtrip() {
        let dn = DistinguishedName::parse("CN=Corda Doorman CA, O=R3, C=GB").unwrap();
        let name = dn.to_x509_name().unwrap();
        let back = DistinguishedName::from_x509_name(&name).unwrap();
        assert_eq!(back, dn);
    }

    #[test]
    fn test_unknown_attribute_rejected_by_openssl() {
        let dn = DistinguishedName::parse("NOTAREALKEY=x").unwrap();
        assert!(dn.to_x509_name().is_err());
    }

    #[test]
    fn test_party_serializes_certificate_as_base64() {
        let party = Party {
            name: "O=Notary, L=London, C=GB".into(),
            certificate: vec![0x30, 0x82, 0x01],
        };
        let json = serde_json::to_string(&party).unwrap();
        assert!(json.contains("\"certificate\":\"MIIB\""));
        let back: Party = serde_json::from_str(&json).unwrap();
        assert_eq!(back, party);
    }
}
