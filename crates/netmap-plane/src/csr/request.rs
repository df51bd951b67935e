//! Parsed PKCS#10 certificate requests

use netmap_core::DistinguishedName;
use openssl::pkey::{PKey, Public};
use openssl::x509::{X509NameRef, X509Req};

use crate::ca::AuthorityError;

/// A certificate request whose self-signature has been checked
pub struct CertificateRequest {
    request: X509Req,
    subject: String,
}

impl std::fmt::Debug for CertificateRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateRequest")
            .field("subject", &self.subject)
            .finish()
    }
}

impl CertificateRequest {
    /// Parse DER, falling back to PEM
    pub fn parse(raw: &[u8]) -> Result<Self, AuthorityError> {
        let request = X509Req::from_der(raw)
            .or_else(|_| X509Req::from_pem(raw))
            .map_err(|_| AuthorityError::MalformedRequest("not a PKCS#10 request".into()))?;

        let public_key = request
            .public_key()
            .map_err(|e| AuthorityError::MalformedRequest(format!("unreadable public key: {}", e)))?;
        let signed_by_key = request
            .verify(&public_key)
            .map_err(|e| AuthorityError::MalformedRequest(format!("unverifiable request: {}", e)))?;
        if !signed_by_key {
            return Err(AuthorityError::MalformedRequest(
                "request is not signed by its own key".into(),
            ));
        }

        let subject = DistinguishedName::from_x509_name(request.subject_name())
            .map_err(|e| AuthorityError::MalformedRequest(e.to_string()))?
            .to_string();

        Ok(Self { request, subject })
    }

    /// Subject in `CN=.., O=..` form
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn subject_name(&self) -> &X509NameRef {
        self.request.subject_name()
    }

    pub fn public_key(&self) -> Result<PKey<Public>, AuthorityError> {
        Ok(self.request.public_key()?)
    }
}
