//! Password-based key derivation.
//!
//! Argon2id with a fresh random salt per envelope entry. The salt and
//! work-factor parameters travel on the wire next to the ciphertext, so
//! a decryptor never has to assume them.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use rand::rngs::OsRng;

use crate::error::CryptoError;

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;

/// Derived key length in bytes (ChaCha20-Poly1305 key).
pub const KEY_LEN: usize = 32;

/// Argon2id parameters for one derivation.
///
/// The defaults follow the argon2 crate's recommended work factor
/// (19 MiB memory, 2 passes, 1 lane).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    pub salt: [u8; SALT_LEN],
    /// Memory cost in KiB.
    pub m_cost: u32,
    /// Number of passes.
    pub t_cost: u32,
    /// Degree of parallelism.
    pub p_cost: u32,
}

impl KdfParams {
    /// Fresh parameters with a random salt and the default work factor.
    pub fn random() -> Result<Self, CryptoError> {
        let mut salt = [0u8; SALT_LEN];
        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|e| CryptoError::ProviderUnavailable(e.to_string()))?;
        Ok(Self {
            salt,
            m_cost: Params::DEFAULT_M_COST,
            t_cost: Params::DEFAULT_T_COST,
            p_cost: Params::DEFAULT_P_COST,
        })
    }
}

/// Derive a 32-byte symmetric key from a password.
///
/// Same password and parameters always yield the same key; a different
/// salt yields an unrelated one. The caller is responsible for
/// zeroizing the returned key when done.
pub fn derive_key(password: &str, params: &KdfParams) -> Result<[u8; KEY_LEN], CryptoError> {
    let argon_params = Params::new(params.m_cost, params.t_cost, params.p_cost, Some(KEY_LEN))
        .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params);

    let mut key = [0u8; KEY_LEN];
    argon2
        .hash_password_into(password.as_bytes(), &params.salt, &mut key)
        .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?;
    Ok(key)
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Cheap parameters so tests stay fast; production callers use
    /// `KdfParams::random()`.
    fn test_params(salt: [u8; SALT_LEN]) -> KdfParams {
        KdfParams {
            salt,
            m_cost: 32,
            t_cost: 1,
            p_cost: 1,
        }
    }

    #[test]
    fn same_password_same_salt_same_key() {
        let params = test_params([3u8; SALT_LEN]);
        let k1 = derive_key("hunter2", &params).unwrap();
        let k2 = derive_key("hunter2", &params).unwrap();
        assert_eq!(k1, k2);
    }

    #[test]
    fn different_salt_different_key() {
        let k1 = derive_key("hunter2", &test_params([1u8; SALT_LEN])).unwrap();
        let k2 = derive_key("hunter2", &test_params([2u8; SALT_LEN])).unwrap();
        assert_ne!(k1, k2);
    }

    #[test]
    fn different_password_different_key() {
        let params = test_params([9u8; SALT_LEN]);
        let k1 = derive_key("pw1", &params).unwrap();
        let k2 = derive_key("pw2", &params).unwrap();
        assert_ne!(k1, k2);
    }

    #[test]
    fn random_params_use_fresh_salts() {
        let p1 = KdfParams::random().unwrap();
        let p2 = KdfParams::random().unwrap();
        assert_ne!(p1.salt, p2.salt);
        assert_eq!(p1.m_cost, Params::DEFAULT_M_COST);
    }

    #[test]
    fn zero_parallelism_is_rejected() {
        let mut params = test_params([0u8; SALT_LEN]);
        params.p_cost = 0;
        let err = derive_key("pw", &params).unwrap_err();
        assert!(matches!(err, CryptoError::KeyDerivationFailed(_)));
    }
}
