//! Symmetric AEAD for password-protected envelope entries.
//!
//! ChaCha20-Poly1305 with a fresh random 12-byte nonce per call. Keys
//! come from the Argon2id KDF and are single-use per envelope, so there
//! is no nonce counter to maintain.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::kdf::{KEY_LEN, KdfParams, derive_key};

/// Nonce size for ChaCha20-Poly1305.
pub const NONCE_SIZE: usize = 12;

/// Authenticated ciphertext plus the nonce that produced it.
///
/// The 16-byte Poly1305 tag sits at the tail of `ciphertext`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherBlob {
    pub nonce: [u8; NONCE_SIZE],
    pub ciphertext: Vec<u8>,
}

/// Encrypt with a derived key, generating a fresh random nonce.
pub fn encrypt_symmetric(plaintext: &[u8], key: &[u8; KEY_LEN]) -> Result<CipherBlob, CryptoError> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));

    let mut nonce = [0u8; NONCE_SIZE];
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|e| CryptoError::ProviderUnavailable(e.to_string()))?;

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    Ok(CipherBlob { nonce, ciphertext })
}

/// Decrypt a blob with a derived key.
///
/// A wrong key or any tampering fails tag verification and returns
/// `AuthenticationFailed`; partially-decrypted bytes never escape.
pub fn decrypt_symmetric(blob: &CipherBlob, key: &[u8; KEY_LEN]) -> Result<Vec<u8>, CryptoError> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    cipher
        .decrypt(Nonce::from_slice(&blob.nonce), blob.ciphertext.as_ref())
        .map_err(|_| CryptoError::AuthenticationFailed)
}

/// Encrypt under a password: fresh KDF parameters, derive, encrypt,
/// wipe the derived key.
///
/// The returned parameters must travel with the blob; decryption needs
/// the same salt and work factor.
pub fn encrypt_with_password(
    plaintext: &[u8],
    password: &str,
) -> Result<(KdfParams, CipherBlob), CryptoError> {
    let params = KdfParams::random()?;
    let mut key = derive_key(password, &params)?;
    let blob = encrypt_symmetric(plaintext, &key);
    key.zeroize();
    Ok((params, blob?))
}

/// Decrypt a password-protected blob using the parameters stored next
/// to it. A wrong password is `AuthenticationFailed`.
pub fn decrypt_with_password(
    blob: &CipherBlob,
    params: &KdfParams,
    password: &str,
) -> Result<Vec<u8>, CryptoError> {
    let mut key = derive_key(password, params)?;
    let plaintext = decrypt_symmetric(blob, &key);
    key.zeroize();
    plaintext
}
