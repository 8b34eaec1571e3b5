//! End-to-end carrier processing.
//!
//! A carrier moves through a fixed pipeline: stamp the visible
//! fingerprint, embed the envelope bits, then sign the finished pixel
//! data. Signing is always last, so the signature covers both the stamp
//! and the hidden payload. Every step returns a new carrier and leaves
//! its input untouched.

use pixelseal_crypto::{Identity, SIGNATURE_LEN, short_fingerprint, verify};
use tracing::{debug, info};

use crate::carrier::Carrier;
use crate::envelope::{Envelope, LENGTH_HEADER_LEN, RecipientInput, read_length_header};
use crate::error::{Error, Result};
use crate::stamp;

/// A finished carrier together with the signature over its pixel data.
#[derive(Debug, Clone)]
pub struct SignedCarrier {
    pub carrier: Carrier,
    pub signature: [u8; SIGNATURE_LEN],
}

/// Render the identity's short fingerprint into the carrier's corner.
pub fn stamp(carrier: &Carrier, identity: &Identity) -> Carrier {
    let text = short_fingerprint(&identity.fingerprint());
    debug!(stamp = %text, "stamping carrier");
    let mut stamped = carrier.clone();
    stamp::render_text(&mut stamped, &text);
    stamped
}

/// Hide an encoded envelope in the carrier's low bits.
pub fn embed_envelope(carrier: &Carrier, envelope: &Envelope) -> Result<Carrier> {
    let wire = envelope.encode();
    debug!(
        bytes = wire.len(),
        capacity = carrier.capacity(),
        "embedding envelope"
    );
    carrier.embed(&wire)
}

/// Sign the carrier's full pixel data with the identity's signing key.
pub fn finalize(carrier: Carrier, identity: &Identity) -> SignedCarrier {
    let signature = identity.signing().sign(carrier.data());
    SignedCarrier { carrier, signature }
}

/// Stamp and sign a carrier without hiding anything in it.
pub fn stamp_sign(carrier: &Carrier, identity: &Identity) -> SignedCarrier {
    let stamped = stamp(carrier, identity);
    info!("carrier stamped and signed");
    finalize(stamped, identity)
}

/// Stamp, embed a password-protected message, and sign.
pub fn stamp_embed_sign(
    carrier: &Carrier,
    identity: &Identity,
    message: &str,
    password: &str,
) -> Result<SignedCarrier> {
    stamp_embed_sign_addressed(carrier, identity, Some((message, password)), &[])
}

/// Stamp, embed an envelope with an optional default entry plus
/// addressed recipient entries, and sign.
///
/// The envelope is built and its size checked against the carrier's
/// capacity before any pixel changes, so a too-small carrier fails with
/// the original untouched.
pub fn stamp_embed_sign_addressed(
    carrier: &Carrier,
    identity: &Identity,
    default_entry: Option<(&str, &str)>,
    recipients: &[RecipientInput<'_>],
) -> Result<SignedCarrier> {
    let envelope = Envelope::build(default_entry, recipients)?;
    let stamped = stamp(carrier, identity);
    let embedded = embed_envelope(&stamped, &envelope)?;
    info!(
        recipients = recipients.len(),
        has_default = default_entry.is_some(),
        "carrier stamped, embedded and signed"
    );
    Ok(finalize(embedded, identity))
}

/// Embed a password-protected message without stamping or signing.
pub fn embed_anonymous(carrier: &Carrier, message: &str, password: &str) -> Result<Carrier> {
    let envelope = Envelope::build(Some((message, password)), &[])?;
    embed_envelope(carrier, &envelope)
}

/// Pull the hidden envelope back out of a carrier.
///
/// Reads the length header first, checks it against the carrier's
/// capacity, then extracts exactly the advertised record.
pub fn recover_envelope(carrier: &Carrier) -> Result<Envelope> {
    let header = carrier.extract(LENGTH_HEADER_LEN)?;
    let body_len = read_length_header(&header)?;
    let total = LENGTH_HEADER_LEN + body_len;
    if total > carrier.capacity() {
        return Err(Error::MalformedEnvelope(format!(
            "length header claims {total} bytes, carrier holds at most {}",
            carrier.capacity()
        )));
    }
    let wire = carrier.extract(total)?;
    debug!(bytes = total, "recovered envelope bytes");
    Envelope::decode(&wire)
}

/// Verify a detached signature over a carrier's pixel data.
pub fn verify_carrier(
    carrier: &Carrier,
    signature: &[u8],
    verifying_key_bytes: &[u8],
) -> Result<bool> {
    Ok(verify(carrier.data(), signature, verifying_key_bytes)?)
}
