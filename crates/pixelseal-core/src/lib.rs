//! Carrier-image sealing: hide an encrypted envelope in an image's low
//! bits, stamp the sender's fingerprint on it, and sign the result.
//!
//! The crate is layered: [`carrier`] is the raw bit codec, [`envelope`]
//! the encrypted payload format, and [`workflow`] the pipeline that
//! combines them with stamping and signing. All key material and
//! primitives come from `pixelseal-crypto`.

pub mod carrier;
pub mod envelope;
pub mod error;
mod stamp;
pub mod workflow;

pub use carrier::{CHANNELS_USED, Carrier};
pub use envelope::{Envelope, PasswordEntry, RecipientEntry, RecipientInput};
pub use error::{Error, Result};
pub use workflow::SignedCarrier;
