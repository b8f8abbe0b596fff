//! Public key fingerprints.
//!
//! A fingerprint is the SHA-256 digest of a DER-encoded SubjectPublicKeyInfo,
//! rendered as uppercase hex byte pairs joined by `:`:
//!
//! ```text
//! 7A:5C:EC:30:0E:B0:42:6E:F9:2E:B7:8A:FA:9A:F6:28:1E:0C:FB:9F:86:A5:3D:45:75:24:86:8B:56:F2:67:B3
//! ```
//!
//! Pins are compared as text, so configured fingerprints must be written in
//! exactly this form.

use crate::tls::error::CertificateError;
use boring::pkey::PKey;
use boring::x509::X509Ref;

/// Length of a SHA-256 digest in bytes.
pub const DIGEST_LEN: usize = 32;

/// Length of a rendered fingerprint (`3 * 32 - 1`).
pub const FINGERPRINT_LEN: usize = 3 * DIGEST_LEN - 1;

const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Fingerprint of encoded public key bytes.
///
/// Each call hashes with its own digest context, so concurrent callers never
/// share digest state.
pub fn fingerprint(public_key: &[u8]) -> String {
    encode_hex(&boring::sha::sha256(public_key))
}

/// Fingerprint of a certificate's SubjectPublicKeyInfo.
pub fn certificate_fingerprint(cert: &X509Ref) -> Result<String, CertificateError> {
    let spki_der = cert.public_key()?.public_key_to_der()?;
    Ok(fingerprint(&spki_der))
}

/// Fingerprint of a PEM `PUBLIC KEY` block.
pub fn public_key_pem_fingerprint(pem: &[u8]) -> Result<String, CertificateError> {
    let key = PKey::public_key_from_pem(pem)?;
    Ok(fingerprint(&key.public_key_to_der()?))
}

/// Whether `value` has the exact shape [`fingerprint`] produces.
pub fn is_canonical(value: &str) -> bool {
    value.len() == FINGERPRINT_LEN
        && value.bytes().enumerate().all(|(i, b)| {
            if i % 3 == 2 {
                b == b':'
            } else {
                matches!(b, b'0'..=b'9' | b'A'..=b'F')
            }
        })
}

fn encode_hex(digest: &[u8]) -> String {
    let mut out = String::with_capacity(digest.len() * 3);
    for (i, byte) in digest.iter().enumerate() {
        if i > 0 {
            out.push(':');
        }
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0F) as usize] as char);
    }
    out
}
