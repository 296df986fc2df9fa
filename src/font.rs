//! 3x5 bitmap font
//!
//! Digits and the handful of letters the game screens use. Anything else
//! has no glyph and is skipped by the text drawing helpers.

use crate::display::Bitmap;

pub const GLYPH_WIDTH: usize = 3;
pub const GLYPH_HEIGHT: usize = 5;
/// Horizontal advance per character at scale 1 (glyph plus one column of space)
pub const GLYPH_ADVANCE: usize = GLYPH_WIDTH + 1;

type Glyph = [u8; GLYPH_WIDTH * GLYPH_HEIGHT];

#[rustfmt::skip]
static DIGITS: [Glyph; 10] = [
    [1,1,1, 1,0,1, 1,0,1, 1,0,1, 1,1,1], // 0
    [0,1,0, 1,1,0, 0,1,0, 0,1,0, 1,1,1], // 1
    [1,1,1, 0,0,1, 1,1,1, 1,0,0, 1,1,1], // 2
    [1,1,1, 0,0,1, 0,1,1, 0,0,1, 1,1,1], // 3
    [1,0,1, 1,0,1, 1,1,1, 0,0,1, 0,0,1], // 4
    [1,1,1, 1,0,0, 1,1,1, 0,0,1, 1,1,1], // 5
    [1,1,1, 1,0,0, 1,1,1, 1,0,1, 1,1,1], // 6
    [1,1,1, 0,0,1, 0,1,0, 0,1,0, 0,1,0], // 7
    [1,1,1, 1,0,1, 1,1,1, 1,0,1, 1,1,1], // 8
    [1,1,1, 1,0,1, 1,1,1, 0,0,1, 1,1,1], // 9
];

#[rustfmt::skip]
static LETTERS: [(char, Glyph); 22] = [
    ('A', [0,1,0, 1,0,1, 1,1,1, 1,0,1, 1,0,1]),
    ('C', [0,1,1, 1,0,0, 1,0,0, 1,0,0, 0,1,1]),
    ('D', [1,1,0, 1,0,1, 1,0,1, 1,0,1, 1,1,0]),
    ('E', [1,1,1, 1,0,0, 1,1,0, 1,0,0, 1,1,1]),
    ('F', [1,1,1, 1,0,0, 1,1,0, 1,0,0, 1,0,0]),
    ('G', [0,1,1, 1,0,0, 1,0,1, 1,0,1, 0,1,1]),
    ('H', [1,0,1, 1,0,1, 1,1,1, 1,0,1, 1,0,1]),
    ('I', [1,1,1, 0,1,0, 0,1,0, 0,1,0, 1,1,1]),
    ('L', [1,0,0, 1,0,0, 1,0,0, 1,0,0, 1,1,1]),
    ('M', [1,0,1, 1,1,1, 1,1,1, 1,0,1, 1,0,1]),
    ('N', [1,1,0, 1,0,1, 1,0,1, 1,0,1, 1,0,1]),
    ('O', [0,1,0, 1,0,1, 1,0,1, 1,0,1, 0,1,0]),
    ('P', [1,1,0, 1,0,1, 1,1,0, 1,0,0, 1,0,0]),
    ('R', [1,1,0, 1,0,1, 1,1,0, 1,0,1, 1,0,1]),
    ('S', [0,1,1, 1,0,0, 0,1,0, 0,0,1, 1,1,0]),
    ('T', [1,1,1, 0,1,0, 0,1,0, 0,1,0, 0,1,0]),
    ('U', [1,0,1, 1,0,1, 1,0,1, 1,0,1, 1,1,1]),
    ('V', [1,0,1, 1,0,1, 1,0,1, 1,0,1, 0,1,0]),
    ('W', [1,0,1, 1,0,1, 1,1,1, 1,1,1, 1,0,1]),
    ('Y', [1,0,1, 1,0,1, 0,1,0, 0,1,0, 0,1,0]),
    ('K', [1,0,1, 1,0,1, 1,1,0, 1,0,1, 1,0,1]),
    ('>', [1,0,0, 0,1,0, 0,0,1, 0,1,0, 1,0,0]),
];

/// Glyph for a digit 0-9
pub fn digit(d: u32) -> Option<Bitmap<'static>> {
    DIGITS
        .get(d as usize)
        .map(|g| Bitmap::new(GLYPH_WIDTH, GLYPH_HEIGHT, g))
}

/// Glyph for a character; lowercase maps to uppercase
pub fn glyph(c: char) -> Option<Bitmap<'static>> {
    if let Some(d) = c.to_digit(10) {
        return digit(d);
    }
    let c = c.to_ascii_uppercase();
    LETTERS
        .iter()
        .find(|(ch, _)| *ch == c)
        .map(|(_, g)| Bitmap::new(GLYPH_WIDTH, GLYPH_HEIGHT, g))
}

/// Width in cells of `text` drawn at `scale`
pub fn text_width(text: &str, scale: f32) -> i32 {
    let n = text.chars().count();
    if n == 0 {
        return 0;
    }
    ((n * GLYPH_ADVANCE - 1) as f32 * scale).round() as i32
}
