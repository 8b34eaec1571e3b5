//! `PixelSeal` Cryptographic Core
//!
//! Primitives for the layered steganographic envelope: identity and key
//! management, password-based symmetric encryption, sealed boxes to
//! recipient public keys, detached signatures, and key fingerprints.
//!
//! ## Crypto primitives
//!
//! - **Identity**: Ed25519 signing keypair + X25519 encryption keypair
//! - **Password entries**: Argon2id → ChaCha20-Poly1305 AEAD
//! - **Addressed entries**: ephemeral X25519 ECDH → HKDF-SHA256 →
//!   ChaCha20-Poly1305 (sealed box)
//! - **Signatures**: detached Ed25519 over the final carrier bytes

pub mod aead;
pub mod error;
pub mod fingerprint;
pub mod identity;
pub mod kdf;
pub mod seal;
pub mod signing;

pub use aead::{
    CipherBlob, NONCE_SIZE, decrypt_symmetric, decrypt_with_password, encrypt_symmetric,
    encrypt_with_password,
};
pub use error::CryptoError;
pub use fingerprint::{
    FINGERPRINT_LEN, display_fingerprint, fingerprint_of, fingerprints_match, short_fingerprint,
};
pub use identity::{EncryptionKeyPair, Identity, KeyStore, SigningKeyPair};
pub use kdf::{KEY_LEN, KdfParams, SALT_LEN, derive_key};
pub use seal::{MAX_SEALED_PLAINTEXT, SealedBlob, seal};
pub use signing::{SIGNATURE_LEN, verify};
