//! Fixtures shared by unit tests

use netmap_core::{
    generate_key_pair, CertificateAndKeyPair, DistinguishedName, NetworkHostAndPort, NodeInfo,
    Party,
};
use openssl::asn1::Asn1Time;
use openssl::hash::MessageDigest;
use openssl::x509::{X509Req, X509};

/// A self-signed identity certificate and its key
pub struct TestIdentity {
    pair: CertificateAndKeyPair,
}

impl TestIdentity {
    pub fn new(name: &str) -> Self {
        let key = generate_key_pair().unwrap();
        let subject = DistinguishedName::parse(name).unwrap().to_x509_name().unwrap();

        let mut builder = X509::builder().unwrap();
        builder.set_version(2).unwrap();
        builder.set_subject_name(&subject).unwrap();
        builder.set_issuer_name(&subject).unwrap();
        builder.set_pubkey(&key).unwrap();
        builder
            .set_not_before(&Asn1Time::days_from_now(0).unwrap())
            .unwrap();
        builder
            .set_not_after(&Asn1Time::days_from_now(30).unwrap())
            .unwrap();
        builder.sign(&key, MessageDigest::sha256()).unwrap();

        Self {
            pair: CertificateAndKeyPair::new(builder.build(), key).unwrap(),
        }
    }

    pub fn certificate(&self) -> &X509 {
        self.pair.certificate()
    }

    pub fn into_pair(self) -> CertificateAndKeyPair {
        self.pair
    }
}

/// DER PKCS#10 request for `subject` under a fresh key
pub fn csr_der(subject: &str) -> Vec<u8> {
    let key = generate_key_pair().unwrap();
    let name = DistinguishedName::parse(subject).unwrap().to_x509_name().unwrap();

    let mut builder = X509Req::builder().unwrap();
    builder.set_version(0).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_pubkey(&key).unwrap();
    builder.sign(&key, MessageDigest::sha256()).unwrap();
    builder.build().to_der().unwrap()
}

fn node_info(owner: &TestIdentity, serial: i64) -> NodeInfo {
    NodeInfo {
        addresses: vec![NetworkHostAndPort {
            host: "localhost".into(),
            port: 10_000,
        }],
        legal_identities: vec![Party::from_certificate(owner.certificate()).unwrap()],
        platform_version: 4,
        serial,
    }
}

/// Serialized node info signed by its own identity
pub fn signed_node_info(owner: &TestIdentity, serial: i64) -> Vec<u8> {
    owner
        .pair
        .sign_with_cert(&node_info(owner, serial))
        .unwrap()
        .to_bytes()
        .unwrap()
}

/// Serialized node info for `owner` signed by `signer`
pub fn node_info_signed_by(owner: &TestIdentity, signer: &TestIdentity) -> Vec<u8> {
    signer
        .pair
        .sign_with_cert(&node_info(owner, 1))
        .unwrap()
        .to_bytes()
        .unwrap()
}
