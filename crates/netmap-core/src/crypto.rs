//! Signing primitives for network map documents
//!
//! Every published artifact is a COSE_Sign1 structure:
//! - payload: the canonical (serde_json) bytes of the document, the "raw" bytes
//! - protected header: `ES256` and the signer's DER certificate under `x5chain`
//! - signature: ECDSA P-256 / SHA-256 in fixed-width `r || s` form
//!
//! Verifiers need nothing but the envelope: the signer certificate travels with
//! it and is checked against a trust anchor separately.

use crate::error::{NetmapError, Result};
use crate::hash::SecureHash;
use coset::{
    cbor::value::Value, iana, CborSerializable, CoseSign1, CoseSign1Builder, HeaderBuilder,
    Label,
};
use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey};
use openssl::ecdsa::EcdsaSig;
use openssl::nid::Nid;
use openssl::pkey::{PKey, PKeyRef, Private, Public};
use openssl::x509::X509;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;

/// COSE algorithm identifier for ECDSA P-256 with SHA-256
const ES256_ALG: iana::Algorithm = iana::Algorithm::ES256;

/// COSE header label `x5chain` (RFC 9360) carrying the signer certificate
const X5CHAIN_LABEL: i64 = 33;

/// Width of each of `r` and `s` for P-256
const P256_SCALAR_LEN: i32 = 32;

/// Generate a fresh ECDSA P-256 key pair
pub fn generate_key_pair() -> Result<PKey<Private>> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1)?;
    let ec_key = EcKey::generate(&group)?;
    Ok(PKey::from_ec_key(ec_key)?)
}

/// A document together with a detached signature and the signer certificate
#[derive(Debug, Clone)]
pub struct SignedData<T> {
    cose: CoseSign1,
    _marker: PhantomData<T>,
}

impl<T> SignedData<T> {
    /// Get the raw COSE_Sign1 structure
    pub fn cose(&self) -> &CoseSign1 {
        &self.cose
    }

    /// The canonical payload bytes that were signed
    pub fn raw(&self) -> &[u8] {
        self.cose.payload.as_deref().unwrap_or_default()
    }

    /// Content address of the payload
    pub fn raw_hash(&self) -> SecureHash {
        SecureHash::sha256(self.raw())
    }

    /// Get the signature bytes
    pub fn signature(&self) -> &[u8] {
        &self.cose.signature
    }

    /// The certificate of the key that produced the signature
    pub fn signer_certificate(&self) -> Result<X509> {
        let der = self
            .cose
            .protected
            .header
            .rest
            .iter()
            .find_map(|(label, value)| match (label, value) {
                (Label::Int(l), Value::Bytes(der)) if *l == X5CHAIN_LABEL => Some(der),
                _ => None,
            })
            .ok_or_else(|| NetmapError::MissingField("x5chain".into()))?;

        X509::from_der(der).map_err(|e| NetmapError::Certificate(e.to_string()))
    }

    /// Serialize to CBOR bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.cose.clone().to_vec().map_err(NetmapError::from)
    }

    /// Deserialize from CBOR bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let cose = CoseSign1::from_slice(bytes).map_err(NetmapError::from)?;
        if cose.payload.is_none() {
            return Err(NetmapError::MissingField("payload".into()));
        }
        Ok(Self {
            cose,
            _marker: PhantomData,
        })
    }

    /// Check the signature against the embedded signer certificate
    pub fn verify(&self) -> Result<()> {
        let certificate = self.signer_certificate()?;
        let public_key = certificate.public_key()?;
        let tbs = self.cose.tbs_data(&[]);
        verify_es256(&public_key, &tbs, &self.cose.signature)
    }
}

impl<T: DeserializeOwned> SignedData<T> {
    /// Verify the signature and decode the payload
    pub fn verified(&self) -> Result<T> {
        self.verify()?;
        self.payload_unverified()
    }

    /// Decode the payload without checking the signature
    pub fn payload_unverified(&self) -> Result<T> {
        serde_json::from_slice(self.raw()).map_err(NetmapError::from)
    }
}

/// An X.509 certificate and the private key it certifies
#[derive(Clone)]
pub struct CertificateAndKeyPair {
    certificate: X509,
    private_key: PKey<Private>,
}

impl std::fmt::Debug for CertificateAndKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateAndKeyPair")
            .field("private_key", &"[redacted]")
            .finish_non_exhaustive()
    }
}

impl CertificateAndKeyPair {
    /// Pair a certificate with its key, rejecting mismatched pairs
    pub fn new(certificate: X509, private_key: PKey<Private>) -> Result<Self> {
        let public_key = certificate.public_key()?;
        if !public_key.public_eq(&private_key) {
            return Err(NetmapError::Certificate(
                "private key does not match certificate public key".into(),
            ));
        }
        Ok(Self {
            certificate,
            private_key,
        })
    }

    /// The certificate
    pub fn certificate(&self) -> &X509 {
        &self.certificate
    }

    /// The private key
    pub fn private_key(&self) -> &PKey<Private> {
        &self.private_key
    }

    /// The public key from the certificate
    pub fn public_key(&self) -> Result<PKey<Public>> {
        Ok(self.certificate.public_key()?)
    }

    /// Serialize `value` canonically and sign it, attaching our certificate
    pub fn sign_with_cert<T: Serialize>(&self, value: &T) -> Result<SignedData<T>> {
        let payload = serde_json::to_vec(value)?;
        let cose = self.sign_cose(payload)?;
        Ok(SignedData {
            cose,
            _marker: PhantomData,
        })
    }

    fn sign_cose(&self, payload: Vec<u8>) -> Result<CoseSign1> {
        let certificate_der = self.certificate.to_der()?;

        let protected = HeaderBuilder::new()
            .algorithm(ES256_ALG)
            .value(X5CHAIN_LABEL, Value::Bytes(certificate_der))
            .build();

        let signed = CoseSign1Builder::new()
            .protected(protected)
            .payload(payload)
            .try_create_signature(&[], |data| sign_es256(&self.private_key, data))?;

        Ok(signed.build())
    }
}

fn sign_es256(key: &PKeyRef<Private>, data: &[u8]) -> Result<Vec<u8>> {
    let ec_key = key.ec_key()?;
    let digest = openssl::sha::sha256(data);
    let signature = EcdsaSig::sign(&digest, &ec_key)?;

    let mut out = signature.r().to_vec_padded(P256_SCALAR_LEN)?;
    out.extend(signature.s().to_vec_padded(P256_SCALAR_LEN)?);
    Ok(out)
}

fn verify_es256(key: &PKeyRef<Public>, data: &[u8], signature: &[u8]) -> Result<()> {
    let scalar = P256_SCALAR_LEN as usize;
    if signature.len() != 2 * scalar {
        return Err(NetmapError::InvalidSignature(format!(
            "expected {} signature bytes, got {}",
            2 * scalar,
            signature.len()
        )));
    }

    let ec_key = key
        .ec_key()
        .map_err(|e| NetmapError::InvalidSignature(format!("signer key is not EC: {}", e)))?;
    let r = BigNum::from_slice(&signature[..scalar])?;
    let s = BigNum::from_slice(&signature[scalar..])?;
    let signature = EcdsaSig::from_private_components(r, s)?;
    let digest = openssl::sha::sha256(data);

    if signature.verify(&digest, &ec_key)? {
        Ok(())
    } else {
        Err(NetmapError::InvalidSignature(
            "signature does not match signer certificate".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openssl::asn1::Asn1Time;
    use openssl::hash::MessageDigest;
    use openssl::x509::X509NameBuilder;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Doc {
        name: String,
        epoch: i32,
    }

    fn self_signed(cn: &str) -> CertificateAndKeyPair {
        let key = generate_key_pair().unwrap();
        let mut name = X509NameBuilder::new().unwrap();
        name.append_entry_by_text("CN", cn).unwrap();
        let name = name.build();

        let mut builder = X509::builder().unwrap();
        builder.set_version(2).unwrap();
        builder.set_subject_name(&name).unwrap();
        builder.set_issuer_name(&name).unwrap();
        builder.set_pubkey(&key).unwrap();
        builder
            .set_not_before(&Asn1Time::days_from_now(0).unwrap())
            .unwrap();
        builder
            .set_not_after(&Asn1Time::days_from_now(1).unwrap())
            .unwrap();
        builder.sign(&key, MessageDigest::sha256()).unwrap();

        CertificateAndKeyPair::new(builder.build(), key).unwrap()
    }

    #[test]
    fn test_sign_and_verify() {
        let signer = self_signed("Signer");
        let doc = Doc { name: "map".into(), epoch: 10 };

        let signed = signer.sign_with_cert(&doc).unwrap();
        assert_eq!(signed.signature().len(), 64);
        assert_eq!(signed.verified().unwrap(), doc);

        let cert = signed.signer_certificate().unwrap();
        assert_eq!(cert.to_der().unwrap(), signer.certificate().to_der().unwrap());
    }

    #[test]
    fn test_raw_hash_is_hash_of_payload() {
        let signer = self_signed("Signer");
        let doc = Doc { name: "map".into(), epoch: 10 };
        let signed = signer.sign_with_cert(&doc).unwrap();

        let expected = SecureHash::sha256(&serde_json::to_vec(&doc).unwrap());
        assert_eq!(signed.raw_hash(), expected);

        // ECDSA is randomized, the content address is not
        let again = signer.sign_with_cert(&doc).unwrap();
        assert_eq!(again.raw_hash(), expected);
    }

    #[test]
    fn test_bytes_roundtrip_is_identical() {
        let signer = self_signed("Signer");
        let signed = signer
            .sign_with_cert(&Doc { name: "x".into(), epoch: 1 })
            .unwrap();

        let bytes = signed.to_bytes().unwrap();
        let restored: SignedData<Doc> = SignedData::from_bytes(&bytes).unwrap();
        assert_eq!(restored.to_bytes().unwrap(), bytes);
        assert!(restored.verify().is_ok());
    }

    #[test]
    fn test_tampered_payload_fails() {
        let signer = self_signed("Signer");
        let signed = signer
            .sign_with_cert(&Doc { name: "x".into(), epoch: 1 })
            .unwrap();

        let mut cose = signed.cose().clone();
        cose.payload = Some(br#"{"name":"x","epoch":2}"#.to_vec());
        let tampered: SignedData<Doc> = SignedData::from_bytes(&cose.to_vec().unwrap()).unwrap();

        assert!(matches!(
            tampered.verified(),
            Err(NetmapError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_mismatched_key_rejected() {
        let a = self_signed("A");
        let b = self_signed("B");
        let result = CertificateAndKeyPair::new(a.certificate().clone(), b.private_key().clone());
        assert!(result.is_err());
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        assert!(SignedData::<Doc>::from_bytes(b"not cbor").is_err());
    }
}
