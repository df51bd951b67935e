//! Property-based tests for the document codec
//!
//! Verifies for arbitrary inputs that:
//! 1. Content addresses are stable and parse back from their text form
//! 2. Signed parameters and maps survive a byte-identical round trip
//! 3. Parameter bumps are monotonic

use chrono::{TimeZone, Utc};
use netmap_core::{
    generate_key_pair, CertificateAndKeyPair, DistinguishedName, NetworkMap, NetworkParameters,
    NotaryInfo, Party, SecureHash, SignedNetworkMap, SignedNetworkParameters,
};
use openssl::asn1::Asn1Time;
use openssl::hash::MessageDigest;
use openssl::x509::X509;
use proptest::prelude::*;
use std::sync::OnceLock;

fn signer() -> &'static CertificateAndKeyPair {
    static SIGNER: OnceLock<CertificateAndKeyPair> = OnceLock::new();
    SIGNER.get_or_init(|| {
        let key = generate_key_pair().unwrap();
        let name = DistinguishedName::parse("CN=NetworkMap, O=Test, C=GB")
            .unwrap()
            .to_x509_name()
            .unwrap();
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
    })
}

fn notaries(names: &[String]) -> Vec<NotaryInfo> {
    names
        .iter()
        .enumerate()
        .map(|(i, org)| NotaryInfo {
            identity: Party {
                name: format!("O={}{}, L=London, C=GB", org, i),
                certificate: org.as_bytes().to_vec(),
            },
            validating: i % 2 == 0,
        })
        .collect()
}

// =============================================================================
// Content addresses
// =============================================================================

proptest! {
    #[test]
    fn prop_hash_text_roundtrip(data in proptest::collection::vec(any::<u8>(), 0..256)) {
        let hash = SecureHash::sha256(&data);
        let text = hash.to_string();

        prop_assert_eq!(text.len(), 64);
        prop_assert_eq!(SecureHash::parse(&text).unwrap(), hash);
        prop_assert_eq!(SecureHash::parse(&text.to_lowercase()).unwrap(), hash);
    }

    #[test]
    fn prop_distinguished_name_text_roundtrip(
        cn in "[A-Za-z][A-Za-z0-9 ]{0,20}[A-Za-z0-9]",
        org in "[A-Za-z][A-Za-z0-9]{0,20}",
        country in "[A-Z]{2}",
    ) {
        let text = format!("CN={}, O={}, C={}", cn, org, country);
        let dn = DistinguishedName::parse(&text).unwrap();

        prop_assert_eq!(dn.to_string(), text);
        prop_assert_eq!(dn.organisation(), Some(org.as_str()));
        prop_assert_eq!(DistinguishedName::parse(&dn.to_string()).unwrap(), dn);
    }
}

// =============================================================================
// Signed documents
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_signed_parameters_roundtrip_is_identical(
        mpv in 1..100i32,
        secs in 0..2_000_000_000i64,
        names in proptest::collection::vec("[A-Za-z]{1,12}", 0..4),
    ) {
        let modified = Utc.timestamp_opt(secs, 0).unwrap();
        let params = NetworkParameters::initial(mpv, notaries(&names), modified).unwrap();
        let signed = signer().sign_with_cert(&params).unwrap();

        let bytes = signed.to_bytes().unwrap();
        let restored = SignedNetworkParameters::from_bytes(&bytes).unwrap();

        prop_assert_eq!(restored.to_bytes().unwrap(), bytes);
        prop_assert_eq!(restored.raw_hash(), signed.raw_hash());
        prop_assert_eq!(restored.verified().unwrap(), params);
    }

    #[test]
    fn prop_signed_map_roundtrip_is_identical(
        records in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 1..64), 0..16),
    ) {
        let hashes: Vec<SecureHash> = records.iter().map(|r| SecureHash::sha256(r)).collect();
        let map = NetworkMap::new(hashes.clone(), SecureHash::sha256(b"params"));
        let signed = signer().sign_with_cert(&map).unwrap();

        let bytes = signed.to_bytes().unwrap();
        let restored = SignedNetworkMap::from_bytes(&bytes).unwrap();
        prop_assert_eq!(restored.to_bytes().unwrap(), bytes);

        let decoded = restored.verified().unwrap();
        for hash in &hashes {
            prop_assert!(decoded.contains(hash));
        }
    }
}

// =============================================================================
// Versioning
// =============================================================================

proptest! {
    /// Any mix of bumps raises the epoch by exactly the number of bumps, and
    /// the platform version only by the number of platform version bumps
    #[test]
    fn prop_bumps_are_monotonic(kinds in proptest::collection::vec(any::<bool>(), 0..40)) {
        let now = Utc::now();
        let initial = NetworkParameters::initial(1, vec![], now).unwrap();

        let mut current = initial.clone();
        for &platform in &kinds {
            let next = if platform {
                current.bump_minimum_platform_version(vec![], now).unwrap()
            } else {
                current.bump_epoch(vec![], now).unwrap()
            };
            prop_assert!(next.epoch > current.epoch);
            prop_assert!(next.minimum_platform_version >= current.minimum_platform_version);
            current = next;
        }

        let mpv_bumps = kinds.iter().filter(|k| **k).count() as i32;
        prop_assert_eq!(current.epoch, initial.epoch + kinds.len() as i32);
        prop_assert_eq!(current.minimum_platform_version, initial.minimum_platform_version + mpv_bumps);
    }
}
