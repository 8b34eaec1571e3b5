//! Public key fingerprints.
//!
//! A fingerprint is the SHA-256 digest of a public key's canonical raw
//! encoding. It serves as the recipient lookup key inside an envelope
//! and, in its short colon-hex form, as the visible stamp text.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Byte length of a fingerprint (SHA-256 output).
pub const FINGERPRINT_LEN: usize = 32;

/// Number of leading fingerprint bytes shown in the short display form.
pub const SHORT_FINGERPRINT_BYTES: usize = 8;

/// Compute the fingerprint of a public key's raw byte encoding.
pub fn fingerprint_of(public_key_bytes: &[u8]) -> [u8; FINGERPRINT_LEN] {
    Sha256::digest(public_key_bytes).into()
}

/// Format a full fingerprint as colon-separated hex pairs.
pub fn display_fingerprint(fingerprint: &[u8; FINGERPRINT_LEN]) -> String {
    colon_hex(fingerprint)
}

/// Compact display form: the first eight bytes as colon-separated hex.
///
/// This is the text the visible stamp renders.
pub fn short_fingerprint(fingerprint: &[u8; FINGERPRINT_LEN]) -> String {
    colon_hex(&fingerprint[..SHORT_FINGERPRINT_BYTES])
}

/// Compare two fingerprints in constant time.
///
/// Envelope recipient lookup goes through this so a non-matching entry
/// costs the same regardless of how long its matching prefix is.
pub fn fingerprints_match(a: &[u8; FINGERPRINT_LEN], b: &[u8; FINGERPRINT_LEN]) -> bool {
    a.ct_eq(b).into()
}

fn colon_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}
