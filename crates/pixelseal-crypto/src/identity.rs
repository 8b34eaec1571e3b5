//! Identity and keypair management.
//!
//! An identity owns two keypairs: an Ed25519 signing keypair that
//! stamps and signs carriers, and an X25519 encryption keypair that
//! addressed envelope entries are sealed to. An `Identity` is always
//! fully populated; a half-built one is unrepresentable.

use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::fingerprint::{FINGERPRINT_LEN, display_fingerprint, fingerprint_of};
use crate::seal::SealedBlob;
use crate::signing::SIGNATURE_LEN;
use crate::{seal, signing};

/// Algorithm tag for signing keys in the exported keyfile.
const ALG_SIGNING: &str = "ed25519";
/// Algorithm tag for encryption keys in the exported keyfile.
const ALG_ENCRYPTION: &str = "x25519";
/// Keyfile format version.
const KEYFILE_VERSION: u8 = 1;

fn random_seed() -> Result<[u8; 32], CryptoError> {
    let mut seed = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut seed)
        .map_err(|e| CryptoError::ProviderUnavailable(e.to_string()))?;
    Ok(seed)
}

/// An Ed25519 keypair for signing and verification.
pub struct SigningKeyPair {
    secret: SigningKey,
    public: VerifyingKey,
}

impl std::fmt::Debug for SigningKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeyPair")
            .field("public", &hex::encode(self.public.as_bytes()))
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl SigningKeyPair {
    /// Generate a new random signing keypair.
    pub fn generate() -> Result<Self, CryptoError> {
        let mut seed = random_seed()?;
        let secret = SigningKey::from_bytes(&seed);
        seed.zeroize();
        let public = secret.verifying_key();
        Ok(Self { secret, public })
    }

    /// Reconstruct from raw 32-byte secret key bytes.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let mut arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength {
                expected: 32,
                actual: bytes.len(),
            })?;
        let secret = SigningKey::from_bytes(&arr);
        arr.zeroize();
        let public = secret.verifying_key();
        Ok(Self { secret, public })
    }

    /// Get the public key as raw bytes.
    pub fn public_bytes(&self) -> [u8; 32] {
        self.public.to_bytes()
    }

    /// Get the secret key as raw bytes. Handle with care.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret.to_bytes()
    }

    /// Sign a byte buffer with this keypair's secret key.
    pub fn sign(&self, bytes: &[u8]) -> [u8; SIGNATURE_LEN] {
        signing::sign(bytes, &self.secret)
    }

    /// Fingerprint of the public key.
    pub fn fingerprint(&self) -> [u8; FINGERPRINT_LEN] {
        fingerprint_of(self.public.as_bytes())
    }
}

/// An X25519 keypair for sealed-box encryption.
pub struct EncryptionKeyPair {
    secret: StaticSecret,
    public: PublicKey,
}

impl std::fmt::Debug for EncryptionKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionKeyPair")
            .field("public", &hex::encode(self.public.as_bytes()))
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl EncryptionKeyPair {
    /// Generate a new random encryption keypair.
    pub fn generate() -> Result<Self, CryptoError> {
        let mut seed = random_seed()?;
        let secret = StaticSecret::from(seed);
        seed.zeroize();
        let public = PublicKey::from(&secret);
        Ok(Self { secret, public })
    }

    /// Reconstruct from raw 32-byte secret key bytes.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let mut arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength {
                expected: 32,
                actual: bytes.len(),
            })?;
        let secret = StaticSecret::from(arr);
        arr.zeroize();
        let public = PublicKey::from(&secret);
        Ok(Self { secret, public })
    }

    /// Get the public key as raw bytes.
    pub fn public_bytes(&self) -> [u8; 32] {
        *self.public.as_bytes()
    }

    /// Get the secret key as raw bytes. Handle with care.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret.to_bytes()
    }

    /// Open a sealed blob addressed to this keypair.
    pub fn open(&self, blob: &SealedBlob) -> Result<Vec<u8>, CryptoError> {
        seal::open(blob, &self.secret)
    }

    /// Fingerprint of the public key.
    pub fn fingerprint(&self) -> [u8; FINGERPRINT_LEN] {
        fingerprint_of(self.public.as_bytes())
    }
}

/// One exported keypair: algorithm tag plus both halves in hex.
#[derive(Serialize, Deserialize)]
struct KeyFileEntry {
    alg: String,
    secret: String,
    public: String,
}

/// The persisted identity file.
#[derive(Serialize, Deserialize)]
struct KeyFile {
    version: u8,
    signing: KeyFileEntry,
    encryption: KeyFileEntry,
}

/// A local user's identity: one signing keypair and one encryption
/// keypair, both always present.
#[derive(Debug)]
pub struct Identity {
    signing: SigningKeyPair,
    encryption: EncryptionKeyPair,
}

impl Identity {
    /// Generate a fresh identity with new keypairs.
    pub fn generate() -> Result<Self, CryptoError> {
        Ok(Self {
            signing: SigningKeyPair::generate()?,
            encryption: EncryptionKeyPair::generate()?,
        })
    }

    pub const fn signing(&self) -> &SigningKeyPair {
        &self.signing
    }

    pub const fn encryption(&self) -> &EncryptionKeyPair {
        &self.encryption
    }

    /// Fingerprint of the signing public key; the identity the stamp
    /// shows and signatures are checked against.
    pub fn fingerprint(&self) -> [u8; FINGERPRINT_LEN] {
        self.signing.fingerprint()
    }

    /// Fingerprint of the encryption public key; the lookup key other
    /// senders address envelope entries to.
    pub fn encryption_fingerprint(&self) -> [u8; FINGERPRINT_LEN] {
        self.encryption.fingerprint()
    }

    /// Colon-hex display form of the signing-key fingerprint.
    pub fn display_fingerprint(&self) -> String {
        display_fingerprint(&self.fingerprint())
    }

    /// Export to the algorithm-tagged JSON keyfile format.
    ///
    /// The output contains both private halves; it is the caller's job
    /// to store it somewhere appropriate.
    pub fn export(&self) -> Result<String, CryptoError> {
        let mut signing_secret = self.signing.secret_bytes();
        let mut encryption_secret = self.encryption.secret_bytes();
        let file = KeyFile {
            version: KEYFILE_VERSION,
            signing: KeyFileEntry {
                alg: ALG_SIGNING.to_owned(),
                secret: hex::encode(signing_secret),
                public: hex::encode(self.signing.public_bytes()),
            },
            encryption: KeyFileEntry {
                alg: ALG_ENCRYPTION.to_owned(),
                secret: hex::encode(encryption_secret),
                public: hex::encode(self.encryption.public_bytes()),
            },
        };
        signing_secret.zeroize();
        encryption_secret.zeroize();
        serde_json::to_string_pretty(&file).map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))
    }

    /// Import from a keyfile produced by `export`.
    ///
    /// Every field is validated: file version, algorithm tags, hex
    /// encoding, key lengths, and consistency of each public half with
    /// its secret. Nothing is silently defaulted.
    pub fn import(serialized: &str) -> Result<Self, CryptoError> {
        let file: KeyFile = serde_json::from_str(serialized)
            .map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?;

        if file.version != KEYFILE_VERSION {
            return Err(CryptoError::InvalidKeyFormat(format!(
                "unsupported keyfile version {}",
                file.version
            )));
        }
        if file.signing.alg != ALG_SIGNING {
            return Err(CryptoError::InvalidKeyFormat(format!(
                "unsupported signing algorithm {:?}",
                file.signing.alg
            )));
        }
        if file.encryption.alg != ALG_ENCRYPTION {
            return Err(CryptoError::InvalidKeyFormat(format!(
                "unsupported encryption algorithm {:?}",
                file.encryption.alg
            )));
        }

        let signing = keypair_from_entry(&file.signing, SigningKeyPair::from_secret_bytes, |kp| {
            kp.public_bytes()
        })?;
        let encryption =
            keypair_from_entry(&file.encryption, EncryptionKeyPair::from_secret_bytes, |kp| {
                kp.public_bytes()
            })?;

        Ok(Self { signing, encryption })
    }

    /// Explicitly erase private key material.
    ///
    /// Consumes the identity; both dalek secret types zeroize their key
    /// bytes on drop.
    pub fn forget(self) {
        drop(self);
    }
}

/// Decode one keyfile entry and cross-check its public half.
fn keypair_from_entry<K>(
    entry: &KeyFileEntry,
    from_secret: impl FnOnce(&[u8]) -> Result<K, CryptoError>,
    public_of: impl FnOnce(&K) -> [u8; 32],
) -> Result<K, CryptoError> {
    let mut secret_bytes =
        hex::decode(&entry.secret).map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?;
    let public_bytes =
        hex::decode(&entry.public).map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?;

    let keypair = from_secret(&secret_bytes);
    secret_bytes.zeroize();
    let keypair = keypair?;

    if public_of(&keypair).as_slice() != public_bytes.as_slice() {
        return Err(CryptoError::InvalidKeyFormat(format!(
            "{} public key does not match its secret",
            entry.alg
        )));
    }
    Ok(keypair)
}

/// Session-scoped owner of the local identity.
///
/// `generate`, `import`, and `forget` replace the slot wholesale, so a
/// reader can never observe a half-assigned identity. Read access goes
/// through [`KeyStore::identity`], which fails with `NoKeyMaterial`
/// when the slot is empty.
#[derive(Debug, Default)]
pub struct KeyStore {
    identity: Option<Identity>,
}

impl KeyStore {
    /// Create an empty key store.
    pub const fn new() -> Self {
        Self { identity: None }
    }

    /// Generate a fresh identity, replacing any existing one.
    pub fn generate(&mut self) -> Result<&Identity, CryptoError> {
        let identity = Identity::generate()?;
        self.forget();
        Ok(self.identity.insert(identity))
    }

    /// Import an identity from an exported keyfile, replacing any
    /// existing one.
    pub fn import(&mut self, serialized: &str) -> Result<&Identity, CryptoError> {
        let identity = Identity::import(serialized)?;
        self.forget();
        Ok(self.identity.insert(identity))
    }

    /// Export the current identity.
    pub fn export(&self) -> Result<String, CryptoError> {
        self.identity()?.export()
    }

    /// Erase the current identity, if any.
    pub fn forget(&mut self) {
        if let Some(identity) = self.identity.take() {
            identity.forget();
        }
    }

    /// The current identity, or `NoKeyMaterial` if none is loaded.
    pub fn identity(&self) -> Result<&Identity, CryptoError> {
        self.identity.as_ref().ok_or(CryptoError::NoKeyMaterial)
    }

    pub const fn is_loaded(&self) -> bool {
        self.identity.is_some()
    }
}
