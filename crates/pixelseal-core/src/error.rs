//! Error types for the envelope and carrier codecs.

use pixelseal_crypto::CryptoError;
use thiserror::Error;

/// Result type alias using the core [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from envelope, carrier, and orchestration operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The length header or structured body failed to decode.
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// `open_default` on an envelope without a password entry.
    #[error("Envelope has no default entry")]
    NoDefaultEntry,

    /// No recipient entry matches the requested fingerprint.
    #[error("No envelope entry addressed to this fingerprint")]
    RecipientNotFound,

    /// The payload does not fit the carrier's hidden channel.
    #[error("Payload exceeds carrier capacity: need {required} bytes, capacity is {capacity}")]
    PayloadExceedsCapacity { capacity: usize, required: usize },

    /// The supplied pixel buffer does not describe a usable carrier.
    #[error("Invalid carrier: {0}")]
    InvalidCarrier(String),

    /// A cryptographic operation failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}
