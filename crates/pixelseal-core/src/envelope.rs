//! Envelope codec: the structured payload hidden in a carrier.
//!
//! An envelope holds at most one password-protected default entry and
//! any number of entries sealed to recipient public keys, keyed by the
//! fingerprint of the recipient's encryption key.
//!
//! ## Wire format
//!
//! A 4-byte big-endian body length, then the body:
//!
//! ```text
//! version(1) | flags(1)
//! [default entry: salt(16) | m_cost(4) | t_cost(4) | p_cost(4)
//!                | nonce(12) | ct_len(4) | ct]
//! recipient_count(2)
//! per recipient: fingerprint(32) | ephemeral_pub(32) | ct_len(4) | ct
//! ```
//!
//! Field order is fixed and entries keep their build order, so encoding
//! equal logical content is byte-identical. The explicit length header
//! lets extraction read exactly the advertised bytes instead of
//! guessing where the hidden stream ends.

use std::collections::HashSet;

use pixelseal_crypto::aead::{CipherBlob, NONCE_SIZE};
use pixelseal_crypto::kdf::{KdfParams, SALT_LEN};
use pixelseal_crypto::seal::SealedBlob;
use pixelseal_crypto::{
    EncryptionKeyPair, FINGERPRINT_LEN, decrypt_with_password, encrypt_with_password,
    fingerprints_match, seal,
};

use crate::error::{Error, Result};

/// Envelope wire format version.
const ENVELOPE_VERSION: u8 = 1;

/// Width of the fixed length header preceding the body.
pub const LENGTH_HEADER_LEN: usize = 4;

/// Flag bit: the body carries a default entry.
const FLAG_DEFAULT_ENTRY: u8 = 0b0000_0001;

/// A password-protected entry with its KDF parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordEntry {
    pub kdf: KdfParams,
    pub blob: CipherBlob,
}

/// An entry sealed to one recipient, keyed by their encryption-key
/// fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientEntry {
    pub fingerprint: [u8; FINGERPRINT_LEN],
    pub blob: SealedBlob,
}

/// Plaintext input for one addressed recipient.
#[derive(Debug, Clone, Copy)]
pub struct RecipientInput<'a> {
    /// Fingerprint of the recipient's encryption public key.
    pub fingerprint: [u8; FINGERPRINT_LEN],
    /// The recipient's X25519 public key.
    pub public_key: [u8; 32],
    pub message: &'a str,
}

/// The structured hidden payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub default_entry: Option<PasswordEntry>,
    pub recipients: Vec<RecipientEntry>,
}

impl Envelope {
    /// Build an envelope, encrypting every entry.
    ///
    /// `default_entry` is `(message, password)`. Recipient fingerprints
    /// must be unique within one envelope.
    pub fn build(
        default_entry: Option<(&str, &str)>,
        recipients: &[RecipientInput<'_>],
    ) -> Result<Self> {
        if recipients.len() > usize::from(u16::MAX) {
            return Err(Error::MalformedEnvelope(format!(
                "too many recipients: {}",
                recipients.len()
            )));
        }
        let mut seen = HashSet::new();
        for recipient in recipients {
            if !seen.insert(recipient.fingerprint) {
                return Err(Error::MalformedEnvelope(
                    "duplicate recipient fingerprint".to_owned(),
                ));
            }
        }

        let default_entry = match default_entry {
            Some((message, password)) => {
                let (kdf, blob) = encrypt_with_password(message.as_bytes(), password)?;
                Some(PasswordEntry { kdf, blob })
            }
            None => None,
        };

        let recipients = recipients
            .iter()
            .map(|recipient| {
                let blob = seal(recipient.message.as_bytes(), &recipient.public_key)?;
                Ok(RecipientEntry {
                    fingerprint: recipient.fingerprint,
                    blob,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            default_entry,
            recipients,
        })
    }

    /// Serialize to the length-prefixed wire form.
    pub fn encode(&self) -> Vec<u8> {
        let body = self.encode_body();
        let mut out = Vec::with_capacity(LENGTH_HEADER_LEN + body.len());
        #[allow(clippy::cast_possible_truncation)] // build() bounds every entry well below u32
        out.extend_from_slice(&(body.len() as u32).to_be_bytes());
        out.extend_from_slice(&body);
        out
    }

    #[allow(clippy::cast_possible_truncation)] // build() bounds recipient count to u16
    fn encode_body(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.push(ENVELOPE_VERSION);
        out.push(if self.default_entry.is_some() {
            FLAG_DEFAULT_ENTRY
        } else {
            0
        });

        if let Some(entry) = &self.default_entry {
            out.extend_from_slice(&entry.kdf.salt);
            out.extend_from_slice(&entry.kdf.m_cost.to_be_bytes());
            out.extend_from_slice(&entry.kdf.t_cost.to_be_bytes());
            out.extend_from_slice(&entry.kdf.p_cost.to_be_bytes());
            out.extend_from_slice(&entry.blob.nonce);
            put_bytes(&mut out, &entry.blob.ciphertext);
        }

        out.extend_from_slice(&(self.recipients.len() as u16).to_be_bytes());
        for recipient in &self.recipients {
            out.extend_from_slice(&recipient.fingerprint);
            out.extend_from_slice(&recipient.blob.ephemeral_public);
            put_bytes(&mut out, &recipient.blob.ciphertext);
        }
        out
    }

    /// Decode a full wire record (length header plus body).
    ///
    /// The header must account for exactly the bytes that follow it;
    /// any inconsistency, unknown version, flag, or duplicate
    /// fingerprint is `MalformedEnvelope`.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let body_len = read_length_header(bytes)?;
        let body = &bytes[LENGTH_HEADER_LEN..];
        if body.len() != body_len {
            return Err(Error::MalformedEnvelope(format!(
                "length header says {body_len} bytes, found {}",
                body.len()
            )));
        }

        let mut reader = Reader::new(body);
        let version = reader.take_u8()?;
        if version != ENVELOPE_VERSION {
            return Err(Error::MalformedEnvelope(format!(
                "unsupported envelope version {version}"
            )));
        }
        let flags = reader.take_u8()?;
        if flags & !FLAG_DEFAULT_ENTRY != 0 {
            return Err(Error::MalformedEnvelope(format!(
                "unknown flag bits {flags:#04x}"
            )));
        }

        let default_entry = if flags & FLAG_DEFAULT_ENTRY != 0 {
            let salt: [u8; SALT_LEN] = reader.take_array()?;
            let m_cost = reader.take_u32()?;
            let t_cost = reader.take_u32()?;
            let p_cost = reader.take_u32()?;
            let nonce: [u8; NONCE_SIZE] = reader.take_array()?;
            let ciphertext = reader.take_vec()?;
            Some(PasswordEntry {
                kdf: KdfParams {
                    salt,
                    m_cost,
                    t_cost,
                    p_cost,
                },
                blob: CipherBlob { nonce, ciphertext },
            })
        } else {
            None
        };

        let count = reader.take_u16()?;
        let mut recipients = Vec::with_capacity(usize::from(count));
        let mut seen = HashSet::new();
        for _ in 0..count {
            let fingerprint: [u8; FINGERPRINT_LEN] = reader.take_array()?;
            if !seen.insert(fingerprint) {
                return Err(Error::MalformedEnvelope(
                    "duplicate recipient fingerprint".to_owned(),
                ));
            }
            let ephemeral_public: [u8; 32] = reader.take_array()?;
            let ciphertext = reader.take_vec()?;
            recipients.push(RecipientEntry {
                fingerprint,
                blob: SealedBlob {
                    ephemeral_public,
                    ciphertext,
                },
            });
        }

        if !reader.is_empty() {
            return Err(Error::MalformedEnvelope(format!(
                "{} trailing bytes after envelope body",
                reader.remaining()
            )));
        }

        Ok(Self {
            default_entry,
            recipients,
        })
    }

    /// Decrypt the default entry with a password.
    pub fn open_default(&self, password: &str) -> Result<String> {
        let entry = self.default_entry.as_ref().ok_or(Error::NoDefaultEntry)?;
        let plaintext = decrypt_with_password(&entry.blob, &entry.kdf, password)?;
        String::from_utf8(plaintext)
            .map_err(|_| Error::MalformedEnvelope("default entry is not valid UTF-8".to_owned()))
    }

    /// Decrypt the entry addressed to `fingerprint` with the matching
    /// private key.
    ///
    /// The lookup compares every entry in constant time and does not
    /// stop at the first match, so timing does not reveal which prefix
    /// of the recipient list matched.
    pub fn open_for_recipient(
        &self,
        fingerprint: &[u8; FINGERPRINT_LEN],
        keys: &EncryptionKeyPair,
    ) -> Result<String> {
        let mut found = None;
        for entry in &self.recipients {
            if fingerprints_match(&entry.fingerprint, fingerprint) {
                found = Some(entry);
            }
        }
        let entry = found.ok_or(Error::RecipientNotFound)?;
        let plaintext = keys.open(&entry.blob)?;
        String::from_utf8(plaintext)
            .map_err(|_| Error::MalformedEnvelope("recipient entry is not valid UTF-8".to_owned()))
    }
}

/// Read the fixed-width length header off the front of a wire record.
pub fn read_length_header(bytes: &[u8]) -> Result<usize> {
    let header: [u8; LENGTH_HEADER_LEN] = bytes
        .get(..LENGTH_HEADER_LEN)
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| Error::MalformedEnvelope("truncated length header".to_owned()))?;
    Ok(u32::from_be_bytes(header) as usize)
}

/// Append a 4-byte big-endian length followed by the bytes themselves.
#[allow(clippy::cast_possible_truncation)] // ciphertexts are bounded far below u32
fn put_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    out.extend_from_slice(bytes);
}

/// Cursor over an envelope body; every read is bounds-checked.
struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    const fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.buf.len() < n {
            return Err(Error::MalformedEnvelope(format!(
                "truncated body: wanted {n} bytes, {} left",
                self.buf.len()
            )));
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut arr = [0u8; N];
        arr.copy_from_slice(self.take(N)?);
        Ok(arr)
    }

    fn take_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn take_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.take_array()?))
    }

    fn take_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.take_array()?))
    }

    fn take_vec(&mut self) -> Result<Vec<u8>> {
        let len = self.take_u32()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    const fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    const fn remaining(&self) -> usize {
        self.buf.len()
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pixelseal_crypto::{CryptoError, Identity};

    fn recipient_input<'a>(identity: &Identity, message: &'a str) -> RecipientInput<'a> {
        RecipientInput {
            fingerprint: identity.encryption_fingerprint(),
            public_key: identity.encryption().public_bytes(),
            message,
        }
    }

    #[test]
    fn default_only_roundtrip() {
        let envelope = Envelope::build(Some(("hello", "pw1")), &[]).unwrap();
        let decoded = Envelope::decode(&envelope.encode()).unwrap();
        assert_eq!(decoded.open_default("pw1").unwrap(), "hello");
    }

    #[test]
    fn wrong_password_is_authentication_failure() {
        let envelope = Envelope::build(Some(("hello", "pw1")), &[]).unwrap();
        let result = envelope.open_default("pw2");
        assert!(matches!(
            result,
            Err(Error::Crypto(CryptoError::AuthenticationFailed))
        ));
    }

    #[test]
    fn missing_default_entry() {
        let recipient = Identity::generate().unwrap();
        let envelope =
            Envelope::build(None, &[recipient_input(&recipient, "for you")]).unwrap();
        assert!(matches!(
            envelope.open_default("pw"),
            Err(Error::NoDefaultEntry)
        ));
    }

    #[test]
    fn addressed_entries_roundtrip() {
        let alice = Identity::generate().unwrap();
        let bob = Identity::generate().unwrap();
        let envelope = Envelope::build(
            Some(("fallback", "pw")),
            &[
                recipient_input(&alice, "for alice"),
                recipient_input(&bob, "for bob"),
            ],
        )
        .unwrap();

        let decoded = Envelope::decode(&envelope.encode()).unwrap();
        assert_eq!(
            decoded
                .open_for_recipient(&alice.encryption_fingerprint(), alice.encryption())
                .unwrap(),
            "for alice"
        );
        assert_eq!(
            decoded
                .open_for_recipient(&bob.encryption_fingerprint(), bob.encryption())
                .unwrap(),
            "for bob"
        );
    }

    #[test]
    fn unknown_fingerprint_is_recipient_not_found() {
        let alice = Identity::generate().unwrap();
        let stranger = Identity::generate().unwrap();
        let envelope = Envelope::build(None, &[recipient_input(&alice, "hi")]).unwrap();

        let result = envelope
            .open_for_recipient(&stranger.encryption_fingerprint(), stranger.encryption());
        assert!(matches!(result, Err(Error::RecipientNotFound)));
    }

    #[test]
    fn wrong_private_key_is_decryption_failure() {
        let alice = Identity::generate().unwrap();
        let mallory = Identity::generate().unwrap();
        let envelope = Envelope::build(None, &[recipient_input(&alice, "hi")]).unwrap();

        // Right fingerprint, wrong key
        let result =
            envelope.open_for_recipient(&alice.encryption_fingerprint(), mallory.encryption());
        assert!(matches!(
            result,
            Err(Error::Crypto(CryptoError::DecryptionFailed))
        ));
    }

    #[test]
    fn duplicate_fingerprints_are_rejected_at_build() {
        let alice = Identity::generate().unwrap();
        let result = Envelope::build(
            None,
            &[
                recipient_input(&alice, "one"),
                recipient_input(&alice, "two"),
            ],
        );
        assert!(matches!(result, Err(Error::MalformedEnvelope(_))));
    }

    #[test]
    fn reencoding_equal_content_is_byte_identical() {
        let alice = Identity::generate().unwrap();
        let envelope =
            Envelope::build(Some(("msg", "pw")), &[recipient_input(&alice, "hi")]).unwrap();
        let wire = envelope.encode();
        let reencoded = Envelope::decode(&wire).unwrap().encode();
        assert_eq!(wire, reencoded);
    }

    #[test]
    fn decode_rejects_truncated_header() {
        assert!(matches!(
            Envelope::decode(&[0, 0]),
            Err(Error::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn decode_rejects_header_body_mismatch() {
        let mut wire = Envelope::build(Some(("m", "pw")), &[]).unwrap().encode();
        // Claim one more byte than the body holds
        let len = read_length_header(&wire).unwrap();
        #[allow(clippy::cast_possible_truncation)]
        wire[..4].copy_from_slice(&((len + 1) as u32).to_be_bytes());
        assert!(matches!(
            Envelope::decode(&wire),
            Err(Error::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn decode_rejects_trailing_bytes() {
        let mut wire = Envelope::build(Some(("m", "pw")), &[]).unwrap().encode();
        let len = read_length_header(&wire).unwrap();
        wire.push(0xAB);
        #[allow(clippy::cast_possible_truncation)]
        wire[..4].copy_from_slice(&((len + 1) as u32).to_be_bytes());
        assert!(matches!(
            Envelope::decode(&wire),
            Err(Error::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn decode_rejects_unknown_version() {
        let mut wire = Envelope::build(Some(("m", "pw")), &[]).unwrap().encode();
        wire[LENGTH_HEADER_LEN] = 9;
        let err = Envelope::decode(&wire).unwrap_err();
        assert!(matches!(err, Error::MalformedEnvelope(_)));
    }

    #[test]
    fn decode_rejects_unknown_flags() {
        let mut wire = Envelope::build(Some(("m", "pw")), &[]).unwrap().encode();
        wire[LENGTH_HEADER_LEN + 1] |= 0b1000_0000;
        let err = Envelope::decode(&wire).unwrap_err();
        assert!(matches!(err, Error::MalformedEnvelope(_)));
    }

    #[test]
    fn tampered_ciphertext_fails_authentication_not_parsing() {
        let envelope = Envelope::build(Some(("hello", "pw")), &[]).unwrap();
        let mut wire = envelope.encode();
        // Last ciphertext byte sits just before the 2-byte recipient count.
        let index = wire.len() - 3;
        wire[index] ^= 0xFF;
        let decoded = Envelope::decode(&wire).unwrap();
        assert!(matches!(
            decoded.open_default("pw"),
            Err(Error::Crypto(CryptoError::AuthenticationFailed))
        ));
    }

    #[test]
    fn empty_envelope_roundtrips() {
        let envelope = Envelope::build(None, &[]).unwrap();
        let decoded = Envelope::decode(&envelope.encode()).unwrap();
        assert!(decoded.default_entry.is_none());
        assert!(decoded.recipients.is_empty());
    }
}
