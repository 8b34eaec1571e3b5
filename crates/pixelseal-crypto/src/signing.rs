//! Detached Ed25519 signatures over carrier byte buffers.

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};

use crate::error::CryptoError;

/// Length of a detached signature in bytes.
pub const SIGNATURE_LEN: usize = 64;

/// Sign a byte buffer with a signing secret key.
pub fn sign(bytes: &[u8], key: &SigningKey) -> [u8; SIGNATURE_LEN] {
    key.sign(bytes).to_bytes()
}

/// Verify a detached signature.
///
/// Returns `Ok(false)` for any mismatch: wrong key, altered bytes, or a
/// signature value that does not decode. Only a public key of the wrong
/// length is an error, since that is a malformed input shape rather
/// than a failed verification.
pub fn verify(
    bytes: &[u8],
    signature: &[u8],
    public_key_bytes: &[u8],
) -> Result<bool, CryptoError> {
    let key_arr: [u8; 32] =
        public_key_bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength {
                expected: 32,
                actual: public_key_bytes.len(),
            })?;

    let Ok(sig_arr) = <[u8; SIGNATURE_LEN]>::try_from(signature) else {
        return Ok(false);
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&key_arr) else {
        return Ok(false);
    };

    Ok(verifying_key
        .verify_strict(bytes, &Signature::from_bytes(&sig_arr))
        .is_ok())
}
