//! Pixel carrier and the LSB hiding channel.
//!
//! A carrier is a rectangular pixel buffer. Hidden bytes live in the
//! least significant bit of the red, green, and blue channel values, in
//! raster order, most significant payload bit first. The alpha channel
//! is never touched, so compositing cannot disturb hidden data.
//!
//! Carriers are copy-on-write: `embed` returns a fresh carrier and the
//! input stays untouched, so a signature computed over one version is
//! never invalidated by a later caller's write.

use crate::error::{Error, Result};

/// Number of low-order channel bits used per pixel (R, G, B).
pub const CHANNELS_USED: usize = 3;

/// A rectangular pixel buffer with 3 (RGB) or 4 (RGBA) channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Carrier {
    width: u32,
    height: u32,
    channels: usize,
    data: Vec<u8>,
}

impl Carrier {
    /// Wrap a pixel buffer supplied by an image source.
    ///
    /// The buffer must hold exactly `width * height * channels` bytes
    /// in raster order, with `channels` either 3 or 4.
    pub fn new(width: u32, height: u32, channels: usize, data: Vec<u8>) -> Result<Self> {
        if !(CHANNELS_USED..=4).contains(&channels) {
            return Err(Error::InvalidCarrier(format!(
                "expected 3 or 4 channels, got {channels}"
            )));
        }
        let expected = width as usize * height as usize * channels;
        if data.len() != expected {
            return Err(Error::InvalidCarrier(format!(
                "{width}x{height}x{channels} needs {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    pub const fn width(&self) -> u32 {
        self.width
    }

    pub const fn height(&self) -> u32 {
        self.height
    }

    pub const fn channels(&self) -> usize {
        self.channels
    }

    /// The raw pixel bytes, for rendering, persisting, or signing.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume the carrier, handing the pixel buffer back to the sink.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Hidden-channel capacity in whole bytes.
    pub const fn capacity(&self) -> usize {
        CHANNELS_USED * self.pixel_count() / 8
    }

    /// Hide `payload` in the low bits of the RGB channels.
    ///
    /// Returns a new carrier; the input is left unmodified. Payloads
    /// larger than [`Self::capacity`] are rejected outright rather than
    /// written partially.
    pub fn embed(&self, payload: &[u8]) -> Result<Self> {
        if payload.len() > self.capacity() {
            return Err(Error::PayloadExceedsCapacity {
                capacity: self.capacity(),
                required: payload.len(),
            });
        }

        let mut out = self.clone();
        for (bit_index, bit) in bits_msb_first(payload).enumerate() {
            let pixel = bit_index / CHANNELS_USED;
            let channel = bit_index % CHANNELS_USED;
            let offset = pixel * self.channels + channel;
            out.data[offset] = (out.data[offset] & 0xFE) | bit;
        }
        Ok(out)
    }

    /// Read back exactly `byte_count` hidden bytes.
    ///
    /// Inverse of [`Self::embed`]; the caller learns `byte_count` from
    /// the envelope's own length header, read incrementally.
    pub fn extract(&self, byte_count: usize) -> Result<Vec<u8>> {
        if byte_count > self.capacity() {
            return Err(Error::PayloadExceedsCapacity {
                capacity: self.capacity(),
                required: byte_count,
            });
        }

        let mut payload = vec![0u8; byte_count];
        for bit_index in 0..byte_count * 8 {
            let pixel = bit_index / CHANNELS_USED;
            let channel = bit_index % CHANNELS_USED;
            let bit = self.data[pixel * self.channels + channel] & 1;
            payload[bit_index / 8] |= bit << (7 - (bit_index % 8));
        }
        Ok(payload)
    }

    /// Overwrite the RGB channels of one pixel, leaving alpha alone.
    pub(crate) fn put_rgb(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        let offset = (y as usize * self.width as usize + x as usize) * self.channels;
        self.data[offset..offset + 3].copy_from_slice(&rgb);
    }
}

/// Iterate the payload's bits most significant first.
fn bits_msb_first(payload: &[u8]) -> impl Iterator<Item = u8> + '_ {
    payload
        .iter()
        .flat_map(|byte| (0..8).rev().map(move |shift| (byte >> shift) & 1))
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_carrier(width: u32, height: u32, channels: usize) -> Carrier {
        let data = (0..width as usize * height as usize * channels)
            .map(|i| (i % 251) as u8)
            .collect();
        Carrier::new(width, height, channels, data).unwrap()
    }

    #[test]
    fn capacity_follows_the_rgb_policy() {
        // 10x10 RGBA: 3 * 100 / 8 = 37 bytes
        assert_eq!(test_carrier(10, 10, 4).capacity(), 37);
        // Channel count does not change capacity, only the used bits
        assert_eq!(test_carrier(10, 10, 3).capacity(), 37);
        assert_eq!(test_carrier(64, 64, 4).capacity(), 1536);
    }

    #[test]
    fn embed_extract_roundtrip() {
        let carrier = test_carrier(16, 16, 4);
        let payload = b"the quick brown fox jumps over the lazy dog";
        let embedded = carrier.embed(payload).unwrap();
        assert_eq!(embedded.extract(payload.len()).unwrap(), payload);
    }

    #[test]
    fn roundtrip_at_exact_capacity() {
        let carrier = test_carrier(8, 8, 3);
        let payload: Vec<u8> = (0..carrier.capacity()).map(|i| (i * 37) as u8).collect();
        let embedded = carrier.embed(&payload).unwrap();
        assert_eq!(embedded.extract(payload.len()).unwrap(), payload);
    }

    #[test]
    fn embed_is_copy_on_write() {
        let carrier = test_carrier(8, 8, 4);
        let before = carrier.data().to_vec();
        let embedded = carrier.embed(&[0xFF; 10]).unwrap();
        assert_eq!(carrier.data(), before.as_slice(), "input must not change");
        assert_ne!(embedded.data(), before.as_slice());
    }

    #[test]
    fn oversized_payload_is_rejected_not_truncated() {
        let carrier = test_carrier(4, 4, 4);
        let capacity = carrier.capacity();
        let payload = vec![0u8; capacity + 1];
        let err = carrier.embed(&payload).unwrap_err();
        assert!(matches!(
            err,
            Error::PayloadExceedsCapacity { capacity: c, required } if c == capacity && required == capacity + 1
        ));
    }

    #[test]
    fn extract_beyond_capacity_is_rejected() {
        let carrier = test_carrier(4, 4, 4);
        let err = carrier.extract(carrier.capacity() + 1).unwrap_err();
        assert!(matches!(err, Error::PayloadExceedsCapacity { .. }));
    }

    #[test]
    fn alpha_channel_is_never_touched() {
        let carrier = test_carrier(8, 8, 4);
        let payload = vec![0xFFu8; carrier.capacity()];
        let embedded = carrier.embed(&payload).unwrap();
        for pixel in 0..carrier.pixel_count() {
            assert_eq!(
                carrier.data()[pixel * 4 + 3],
                embedded.data()[pixel * 4 + 3],
                "alpha changed at pixel {pixel}"
            );
        }
    }

    #[test]
    fn embed_only_changes_low_bits() {
        let carrier = test_carrier(8, 8, 3);
        let payload = vec![0b1010_1010u8; carrier.capacity()];
        let embedded = carrier.embed(&payload).unwrap();
        for (before, after) in carrier.data().iter().zip(embedded.data()) {
            assert_eq!(before & 0xFE, after & 0xFE);
        }
    }

    #[test]
    fn bit_order_is_msb_first_raster_order() {
        let carrier = Carrier::new(2, 2, 3, vec![0u8; 12]).unwrap();
        let embedded = carrier.embed(&[0b1000_0001]).unwrap();
        // First payload bit (the MSB, 1) lands in the first red channel
        assert_eq!(embedded.data()[0], 1);
        // Bits 2..7 are zero
        for offset in 1..7 {
            assert_eq!(embedded.data()[offset], 0, "offset {offset}");
        }
        // Last payload bit (1) lands in the 8th used channel slot
        assert_eq!(embedded.data()[7], 1);
    }

    #[test]
    fn empty_payload_roundtrips() {
        let carrier = test_carrier(2, 2, 4);
        let embedded = carrier.embed(&[]).unwrap();
        assert_eq!(embedded, carrier);
        assert!(embedded.extract(0).unwrap().is_empty());
    }

    #[test]
    fn new_rejects_bad_channel_counts() {
        assert!(matches!(
            Carrier::new(2, 2, 2, vec![0u8; 8]),
            Err(Error::InvalidCarrier(_))
        ));
        assert!(matches!(
            Carrier::new(2, 2, 5, vec![0u8; 20]),
            Err(Error::InvalidCarrier(_))
        ));
    }

    #[test]
    fn new_rejects_wrong_buffer_length() {
        assert!(matches!(
            Carrier::new(4, 4, 4, vec![0u8; 63]),
            Err(Error::InvalidCarrier(_))
        ));
    }
}
