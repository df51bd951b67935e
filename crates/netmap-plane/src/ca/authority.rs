//! Certificate authority
//!
//! Derives the doorman and network map CAs from a trust anchor and issues node
//! CA certificates for certificate requests.
//!
//! # Certificate Properties
//! - **Trust anchor**: self-signed, CA, keyCertSign + cRLSign
//! - **Doorman CA**: CA without a path length limit (node CAs sign their own
//!   identities), keyCertSign + cRLSign + digitalSignature, 10 years
//! - **Network map CA**: not a CA, digitalSignature, 10 years
//! - **Node CA**: subject and key from the request, CA, critical name
//!   constraint permitting only its own subject, 500 days
//!
//! All certificates are X.509v3, carry a random 128-bit serial and are signed
//! ecdsa-with-SHA256 by ECDSA P-256 keys.

use std::cmp::Ordering;

use netmap_core::{generate_key_pair, CertificateAndKeyPair, DistinguishedName};
use openssl::asn1::{Asn1Integer, Asn1Time};
use openssl::bn::{BigNum, MsbOption};
use openssl::hash::MessageDigest;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{HasPublic, PKey, PKeyRef, Private};
use openssl::stack::Stack;
use openssl::x509::extension::{
    AuthorityKeyIdentifier, BasicConstraints, KeyUsage, SubjectKeyIdentifier,
};
use openssl::x509::{X509Builder, X509NameRef, X509Ref, X509};
use tracing::{info, warn};

use super::{name_constraints, AuthorityError};
use crate::csr::CertificateRequest;

/// Password protecting the served trust store
pub const TRUSTSTORE_PASSWORD: &str = "trustpass";

const X509_VERSION_3: i32 = 2;
const SERIAL_BITS: i32 = 128;

const DEV_ROOT_NAME: &str = "CN=Corda Node Root CA, O=R3 Ltd, OU=Corda, L=London, C=GB";
const ROOT_VALIDITY_DAYS: u32 = 20 * 365;
const CA_VALIDITY_DAYS: u32 = 10 * 365;
const NODE_CA_VALIDITY_DAYS: u32 = 500;

/// Generate a throwaway development root
pub fn dev_trust_anchor() -> Result<CertificateAndKeyPair, AuthorityError> {
    let key = generate_key_pair()?;
    let subject = DistinguishedName::parse(DEV_ROOT_NAME)?.to_x509_name()?;

    let mut builder = base_builder(&subject, &subject, &key, ROOT_VALIDITY_DAYS)?;

    let mut bc = BasicConstraints::new();
    bc.critical().ca();
    builder.append_extension(bc.build()?)?;

    let mut ku = KeyUsage::new();
    ku.critical().key_cert_sign().crl_sign();
    builder.append_extension(ku.build()?)?;

    let ski = SubjectKeyIdentifier::new().build(&builder.x509v3_context(None, None))?;
    builder.append_extension(ski)?;

    builder.sign(&key, MessageDigest::sha256())?;

    warn!(subject = DEV_ROOT_NAME, "Generated development trust anchor");
    Ok(CertificateAndKeyPair::new(builder.build(), key)?)
}

/// Load a trust anchor from PEM certificate and key
pub fn trust_anchor_from_pem(
    cert_pem: &[u8],
    key_pem: &[u8],
) -> Result<CertificateAndKeyPair, AuthorityError> {
    let certificate = X509::from_pem(cert_pem)
        .map_err(|e| AuthorityError::InvalidTrustAnchor(format!("certificate: {}", e)))?;
    let key = PKey::private_key_from_pem(key_pem)
        .map_err(|e| AuthorityError::InvalidTrustAnchor(format!("private key: {}", e)))?;

    CertificateAndKeyPair::new(certificate, key)
        .map_err(|e| AuthorityError::InvalidTrustAnchor(e.to_string()))
}

/// A node CA certificate with the chain that issued it
#[derive(Debug, Clone)]
pub struct IssuedCertificate {
    /// [node CA, doorman CA, trust anchor]
    chain: Vec<X509>,
}

impl IssuedCertificate {
    pub fn certificate(&self) -> &X509 {
        &self.chain[0]
    }

    pub fn chain(&self) -> &[X509] {
        &self.chain
    }

    /// Tar archive with one DER entry per certificate, named by its subject
    pub fn to_archive(&self) -> Result<Vec<u8>, AuthorityError> {
        let mut archive = tar::Builder::new(Vec::new());
        for certificate in &self.chain {
            let der = certificate.to_der()?;
            let subject = DistinguishedName::from_x509_name(certificate.subject_name())?;

            let mut header = tar::Header::new_gnu();
            header.set_size(der.len() as u64);
            header.set_mode(0o644);
            archive.append_data(&mut header, entry_name(&subject), der.as_slice())?;
        }
        Ok(archive.into_inner()?)
    }
}

/// Subject rendered as a single flat archive path component
fn entry_name(subject: &DistinguishedName) -> String {
    subject
        .to_string()
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// The trust anchor and the two CAs derived from it
pub struct CertificateAuthority {
    root: CertificateAndKeyPair,
    doorman: CertificateAndKeyPair,
    network_map: CertificateAndKeyPair,
    truststore: Vec<u8>,
}

impl std::fmt::Debug for CertificateAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateAuthority")
            .field("truststore_len", &self.truststore.len())
            .finish_non_exhaustive()
    }
}

impl CertificateAuthority {
    /// Derive the doorman and network map CAs under fresh keys
    pub fn bootstrap(
        root: CertificateAndKeyPair,
        doorman_name: &str,
        network_map_name: &str,
    ) -> Result<Self, AuthorityError> {
        let doorman = derive_ca(&root, doorman_name, CaRole::Doorman)?;
        let network_map = derive_ca(&root, network_map_name, CaRole::NetworkMap)?;
        let truststore = build_truststore(root.certificate())?;

        info!(
            doorman = doorman_name,
            network_map = network_map_name,
            "Certificate authority ready"
        );

        Ok(Self {
            root,
            doorman,
            network_map,
            truststore,
        })
    }

    pub fn root(&self) -> &CertificateAndKeyPair {
        &self.root
    }

    pub fn doorman(&self) -> &CertificateAndKeyPair {
        &self.doorman
    }

    pub fn network_map(&self) -> &CertificateAndKeyPair {
        &self.network_map
    }

    /// PKCS#12 store holding only the trust anchor
    pub fn truststore(&self) -> &[u8] {
        &self.truststore
    }

    /// Sign a node CA certificate for `request`
    ///
    /// The result is checked before it is returned: its validity window must
    /// contain the current time and its signature must verify under the doorman
    /// key. Either failure is a [`AuthorityError::SigningInvariantViolation`].
    pub fn issue(&self, request: &CertificateRequest) -> Result<IssuedCertificate, AuthorityError> {
        let issuer = self.doorman.certificate();
        let public_key = request.public_key()?;

        let mut builder = base_builder(
            request.subject_name(),
            issuer.subject_name(),
            &public_key,
            NODE_CA_VALIDITY_DAYS,
        )?;

        let mut bc = BasicConstraints::new();
        bc.critical().ca();
        builder.append_extension(bc.build()?)?;

        let mut ku = KeyUsage::new();
        ku.critical().digital_signature().key_cert_sign().crl_sign();
        builder.append_extension(ku.build()?)?;

        append_key_identifiers(&mut builder, issuer)?;
        builder.append_extension(name_constraints::permit_only(request.subject_name())?)?;

        builder.sign(self.doorman.private_key(), MessageDigest::sha256())?;
        let certificate = builder.build();

        check_issued(&certificate, self.doorman.private_key())?;

        info!(subject = %request.subject(), "Issued node CA certificate");

        Ok(IssuedCertificate {
            chain: vec![
                certificate,
                self.doorman.certificate().clone(),
                self.root.certificate().clone(),
            ],
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum CaRole {
    Doorman,
    NetworkMap,
}

fn derive_ca(
    root: &CertificateAndKeyPair,
    name: &str,
    role: CaRole,
) -> Result<CertificateAndKeyPair, AuthorityError> {
    let key = generate_key_pair()?;
    let subject = DistinguishedName::parse(name)?.to_x509_name()?;
    let issuer = root.certificate();

    let mut builder = base_builder(&subject, issuer.subject_name(), &key, CA_VALIDITY_DAYS)?;

    let mut bc = BasicConstraints::new();
    let mut ku = KeyUsage::new();
    match role {
        CaRole::Doorman => {
            bc.critical().ca();
            ku.critical().key_cert_sign().crl_sign().digital_signature();
        }
        CaRole::NetworkMap => {
            bc.critical();
            ku.critical().digital_signature();
        }
    }
    builder.append_extension(bc.build()?)?;
    builder.append_extension(ku.build()?)?;
    append_key_identifiers(&mut builder, issuer)?;

    builder
        .sign(root.private_key(), MessageDigest::sha256())
        .map_err(|e| AuthorityError::InvalidTrustAnchor(format!("cannot sign {}: {}", name, e)))?;
    let certificate = builder.build();

    let root_key = root.public_key()?;
    if !certificate.verify(&root_key)? {
        return Err(AuthorityError::InvalidTrustAnchor(format!(
            "{} does not verify under the trust anchor",
            name
        )));
    }

    Ok(CertificateAndKeyPair::new(certificate, key)?)
}

/// Builder with version, random serial, names, key and validity set
fn base_builder<T: HasPublic>(
    subject: &X509NameRef,
    issuer: &X509NameRef,
    public_key: &PKeyRef<T>,
    validity_days: u32,
) -> Result<X509Builder, AuthorityError> {
    let mut builder = X509::builder()?;
    builder.set_version(X509_VERSION_3)?;
    let serial = random_serial()?;
    builder.set_serial_number(&serial)?;
    builder.set_subject_name(subject)?;
    builder.set_issuer_name(issuer)?;
    builder.set_pubkey(public_key)?;
    let not_before = Asn1Time::days_from_now(0)?;
    let not_after = Asn1Time::days_from_now(validity_days)?;
    builder.set_not_before(&not_before)?;
    builder.set_not_after(&not_after)?;
    Ok(builder)
}

fn append_key_identifiers(builder: &mut X509Builder, issuer: &X509Ref) -> Result<(), AuthorityError> {
    let ski = SubjectKeyIdentifier::new().build(&builder.x509v3_context(Some(issuer), None))?;
    let aki = AuthorityKeyIdentifier::new()
        .keyid(false)
        .issuer(false)
        .build(&builder.x509v3_context(Some(issuer), None))?;
    builder.append_extension(ski)?;
    builder.append_extension(aki)?;
    Ok(())
}

fn random_serial() -> Result<Asn1Integer, AuthorityError> {
    let mut serial = BigNum::new()?;
    serial.rand(SERIAL_BITS, MsbOption::MAYBE_ZERO, false)?;
    Ok(serial.to_asn1_integer()?)
}

fn check_issued(certificate: &X509, issuer_key: &PKeyRef<Private>) -> Result<(), AuthorityError> {
    let now = Asn1Time::days_from_now(0)?;
    let starts_later = certificate.not_before().compare(&now)? == Ordering::Greater;
    let already_ended = certificate.not_after().compare(&now)? == Ordering::Less;
    if starts_later || already_ended {
        return Err(AuthorityError::SigningInvariantViolation(
            "validity window does not contain the issuance time".into(),
        ));
    }

    let verified = certificate
        .verify(issuer_key)
        .map_err(|e| AuthorityError::SigningInvariantViolation(e.to_string()))?;
    if !verified {
        return Err(AuthorityError::SigningInvariantViolation(
            "signature does not verify under the doorman key".into(),
        ));
    }
    Ok(())
}

fn build_truststore(root: &X509) -> Result<Vec<u8>, AuthorityError> {
    let mut anchors = Stack::new()?;
    anchors.push(root.clone())?;

    let mut builder = Pkcs12::builder();
    builder.ca(anchors);
    let store = builder.build2(TRUSTSTORE_PASSWORD)?;
    Ok(store.to_der()?)
}
