//! Sealed-box encryption to a recipient's X25519 public key.
//!
//! HPKE-style: a fresh ephemeral X25519 keypair per blob, ECDH with the
//! recipient key, HKDF-SHA256 to derive the AEAD key and nonce (salted
//! with the ephemeral public key so derivation is bound to this blob),
//! then ChaCha20-Poly1305. Only the holder of the recipient's static
//! secret can recompute the shared secret and open the blob.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use sha2::Sha256;
use x25519_dalek::{EphemeralSecret, PublicKey, StaticSecret};
use zeroize::Zeroize;

use crate::error::CryptoError;

/// Single-shot plaintext bound for sealed entries.
///
/// Addressed messages are short notes; longer content belongs in a
/// password entry.
pub const MAX_SEALED_PLAINTEXT: usize = 512;

const HKDF_KEY_INFO: &[u8] = b"pixelseal-seal-v1-key";
const HKDF_NONCE_INFO: &[u8] = b"pixelseal-seal-v1-nonce";

/// Output of sealing: the sender's ephemeral public key plus the
/// authenticated ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedBlob {
    pub ephemeral_public: [u8; 32],
    pub ciphertext: Vec<u8>,
}

fn derive_key_nonce(
    shared_secret: &[u8; 32],
    salt: &[u8],
) -> Result<([u8; 32], [u8; 12]), CryptoError> {
    let hk = Hkdf::<Sha256>::new(Some(salt), shared_secret);

    let mut key = [0u8; 32];
    hk.expand(HKDF_KEY_INFO, &mut key)
        .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?;

    let mut nonce = [0u8; 12];
    hk.expand(HKDF_NONCE_INFO, &mut nonce)
        .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?;

    Ok((key, nonce))
}

/// Seal `plaintext` to the holder of `recipient_public`.
pub fn seal(plaintext: &[u8], recipient_public: &[u8; 32]) -> Result<SealedBlob, CryptoError> {
    if plaintext.len() > MAX_SEALED_PLAINTEXT {
        return Err(CryptoError::PayloadTooLarge {
            limit: MAX_SEALED_PLAINTEXT,
            actual: plaintext.len(),
        });
    }

    let ephemeral = EphemeralSecret::random_from_rng(OsRng);
    let ephemeral_public = *PublicKey::from(&ephemeral).as_bytes();

    let shared = ephemeral.diffie_hellman(&PublicKey::from(*recipient_public));
    let (mut key, nonce) = derive_key_nonce(shared.as_bytes(), &ephemeral_public)?;

    let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()));
    key.zeroize();

    Ok(SealedBlob {
        ephemeral_public,
        ciphertext: ciphertext?,
    })
}

/// Open a sealed blob with the recipient's static secret.
///
/// Any key mismatch or corruption surfaces as `DecryptionFailed`.
pub fn open(blob: &SealedBlob, recipient_secret: &StaticSecret) -> Result<Vec<u8>, CryptoError> {
    let shared = recipient_secret.diffie_hellman(&PublicKey::from(blob.ephemeral_public));
    let (mut key, nonce) = derive_key_nonce(shared.as_bytes(), &blob.ephemeral_public)?;

    let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&nonce), blob.ciphertext.as_ref())
        .map_err(|_| CryptoError::DecryptionFailed);
    key.zeroize();

    plaintext
}
