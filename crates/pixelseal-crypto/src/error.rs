//! Crypto error types.

/// Errors from cryptographic operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// The OS randomness source refused to produce key material.
    #[error("Cryptographic provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// An operation needed an identity but the key store holds none.
    #[error("No key material loaded")]
    NoKeyMaterial,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Symmetric AEAD tag mismatch: wrong password or tampered data.
    #[error("Authentication failed: wrong password or tampered data")]
    AuthenticationFailed,

    /// Sealed-box open failure: key mismatch or corrupted data.
    #[error("Decryption failed: key mismatch or corrupted data")]
    DecryptionFailed,

    /// Sealed entries are single-shot; longer content must go through a
    /// password entry.
    #[error("Payload too large for sealed encryption: limit {limit}, got {actual}")]
    PayloadTooLarge { limit: usize, actual: usize },
}
