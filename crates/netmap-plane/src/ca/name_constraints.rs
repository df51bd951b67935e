//! NameConstraints extension restricting a node CA to its own name
//!
//! The openssl crate can only build this extension from a config section, so
//! the DER value is assembled here:
//!
//! ```text
//! NameConstraints ::= SEQUENCE {
//!     permittedSubtrees [0] IMPLICIT SEQUENCE OF GeneralSubtree }
//! GeneralSubtree ::= SEQUENCE { base GeneralName }
//! GeneralName    ::= directoryName [4] EXPLICIT Name
//! ```

use openssl::asn1::{Asn1Object, Asn1OctetString};
use openssl::error::ErrorStack;
use openssl::x509::{X509Extension, X509NameRef};

/// OID of the NameConstraints certificate extension
const NAME_CONSTRAINTS_OID: &str = "2.5.29.30";

const TAG_SEQUENCE: u8 = 0x30;
const TAG_PERMITTED_SUBTREES: u8 = 0xA0;
const TAG_DIRECTORY_NAME: u8 = 0xA4;

/// Critical extension permitting exactly the subtree rooted at `subject`
pub fn permit_only(subject: &X509NameRef) -> Result<X509Extension, ErrorStack> {
    let value = encode_permit_only(&subject.to_der()?);
    let oid = Asn1Object::from_str(NAME_CONSTRAINTS_OID)?;
    let contents = Asn1OctetString::new_from_bytes(&value)?;
    X509Extension::new_from_der(&oid, true, &contents)
}

/// DER value of a NameConstraints with one permitted directoryName
pub fn encode_permit_only(name_der: &[u8]) -> Vec<u8> {
    let general_name = tlv(TAG_DIRECTORY_NAME, name_der);
    let subtree = tlv(TAG_SEQUENCE, &general_name);
    let permitted = tlv(TAG_PERMITTED_SUBTREES, &subtree);
    tlv(TAG_SEQUENCE, &permitted)
}

fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len() + 6);
    out.push(tag);
    push_length(&mut out, content.len());
    out.extend_from_slice(content);
    out
}

fn push_length(out: &mut Vec<u8>, len: usize) {
    if len < 0x80 {
        out.push(len as u8);
        return;
    }
    let bytes = len.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    let significant = &bytes[skip..];
    out.push(0x80 | significant.len() as u8);
    out.extend_from_slice(significant);
}
