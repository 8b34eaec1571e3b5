//! Visible fingerprint stamp.
//!
//! Renders the short colon-hex fingerprint into the top-left corner of
//! a carrier with a built-in 5x7 bitmap font. The stamp overwrites full
//! channel values, so it must be applied before any bits are hidden in
//! the image.

use crate::carrier::Carrier;

pub const GLYPH_WIDTH: u32 = 5;
pub const GLYPH_HEIGHT: u32 = 7;

/// Pixels between the carrier edge and the first glyph.
const MARGIN: u32 = 2;

/// Pixels between adjacent glyphs.
const GLYPH_SPACING: u32 = 1;

const FOREGROUND: [u8; 3] = [230, 230, 230];
const BACKGROUND: [u8; 3] = [25, 25, 25];

/// One row per glyph line, low 5 bits used, leftmost column in bit 4.
type Glyph = [u8; GLYPH_HEIGHT as usize];

const GLYPH_UNKNOWN: Glyph = [0b11111; 7];

fn glyph_for(ch: char) -> Glyph {
    match ch.to_ascii_uppercase() {
        '0' => [
            0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110,
        ],
        '1' => [
            0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110,
        ],
        '2' => [
            0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111,
        ],
        '3' => [
            0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110,
        ],
        '4' => [
            0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010,
        ],
        '5' => [
            0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110,
        ],
        '6' => [
            0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110,
        ],
        '7' => [
            0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000,
        ],
        '8' => [
            0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110,
        ],
        '9' => [
            0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100,
        ],
        'A' => [
            0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001,
        ],
        'B' => [
            0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110,
        ],
        'C' => [
            0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110,
        ],
        'D' => [
            0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100,
        ],
        'E' => [
            0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111,
        ],
        'F' => [
            0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000,
        ],
        ':' => [
            0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b01100, 0b00000,
        ],
        _ => GLYPH_UNKNOWN,
    }
}

/// Draw `text` into the top-left corner of `carrier`, mutating it in
/// place. Glyphs falling outside the carrier bounds are clipped.
#[allow(clippy::cast_possible_truncation)] // stamp text is a handful of glyphs
pub fn render_text(carrier: &mut Carrier, text: &str) {
    for (index, ch) in text.chars().enumerate() {
        let origin_x = MARGIN + index as u32 * (GLYPH_WIDTH + GLYPH_SPACING);
        draw_glyph(carrier, origin_x, MARGIN, glyph_for(ch));
    }
}

#[allow(clippy::cast_possible_truncation)] // glyphs are 7 rows tall
fn draw_glyph(carrier: &mut Carrier, origin_x: u32, origin_y: u32, glyph: Glyph) {
    for (row, bits) in glyph.iter().enumerate() {
        let y = origin_y + row as u32;
        if y >= carrier.height() {
            return;
        }
        for col in 0..GLYPH_WIDTH {
            let x = origin_x + col;
            if x >= carrier.width() {
                break;
            }
            let lit = bits >> (GLYPH_WIDTH - 1 - col) & 1 == 1;
            carrier.put_rgb(x, y, if lit { FOREGROUND } else { BACKGROUND });
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn blank(width: u32, height: u32) -> Carrier {
        Carrier::new(width, height, 3, vec![128; (width * height * 3) as usize]).unwrap()
    }

    fn pixel(carrier: &Carrier, x: u32, y: u32) -> [u8; 3] {
        let offset = ((y * carrier.width() + x) * 3) as usize;
        let data = carrier.data();
        [data[offset], data[offset + 1], data[offset + 2]]
    }

    #[test]
    fn renders_glyph_pixels() {
        let mut carrier = blank(32, 16);
        render_text(&mut carrier, "1");
        // '1' top row is 0b00100: only the centre column is lit.
        assert_eq!(pixel(&carrier, MARGIN + 2, MARGIN), FOREGROUND);
        assert_eq!(pixel(&carrier, MARGIN, MARGIN), BACKGROUND);
    }

    #[test]
    fn pixels_outside_stamp_untouched() {
        let mut carrier = blank(64, 32);
        render_text(&mut carrier, "AB");
        assert_eq!(pixel(&carrier, 63, 31), [128, 128, 128]);
        assert_eq!(pixel(&carrier, 40, 2), [128, 128, 128]);
    }

    #[test]
    fn clips_at_carrier_edge() {
        let mut carrier = blank(8, 4);
        // Wider and taller than the carrier: must not panic.
        render_text(&mut carrier, "AA:BB:CC:DD");
    }

    #[test]
    fn lowercase_hex_uses_uppercase_shapes() {
        let mut upper = blank(16, 16);
        let mut lower = blank(16, 16);
        render_text(&mut upper, "A");
        render_text(&mut lower, "a");
        assert_eq!(upper.data(), lower.data());
    }
}
