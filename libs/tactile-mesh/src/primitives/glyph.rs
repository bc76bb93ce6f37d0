//! # Bitmap Glyphs
//!
//! A fixed 5×7 bitmap font for character markers. Each glyph row is a byte
//! whose low five bits are the columns, bit 4 leftmost. Glyphs become solids
//! as one box per horizontal run of set bits.

use super::{cuboid, positive};
use crate::csg::Solid;
use crate::error::{FeatureError, LoaderError};
use config::constants::{GLYPH_COLUMNS, GLYPH_ROWS};
use glam::DVec3;
use std::collections::BTreeMap;

/// Resource name under which the font is fetched by a
/// [`ResourceLoader`](crate::backend::ResourceLoader).
pub const GLYPH_FONT_RESOURCE: &str = "glyph-font-5x7";

/// Rows of one glyph, top row first.
pub type GlyphRows = [u8; GLYPH_ROWS];

const RECORD_LEN: usize = 4 + GLYPH_ROWS;

#[rustfmt::skip]
const BUILTIN: &[(char, GlyphRows)] = &[
    ('A', [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11]),
    ('B', [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E]),
    ('C', [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E]),
    ('D', [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C]),
    ('E', [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F]),
    ('F', [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10]),
    ('G', [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F]),
    ('H', [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11]),
    ('I', [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E]),
    ('J', [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C]),
    ('K', [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11]),
    ('L', [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F]),
    ('M', [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11]),
    ('N', [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11]),
    ('O', [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E]),
    ('P', [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10]),
    ('Q', [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D]),
    ('R', [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11]),
    ('S', [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E]),
    ('T', [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04]),
    ('U', [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E]),
    ('V', [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04]),
    ('W', [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A]),
    ('X', [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11]),
    ('Y', [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04]),
    ('Z', [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F]),
    ('0', [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E]),
    ('1', [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E]),
    ('2', [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F]),
    ('3', [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E]),
    ('4', [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02]),
    ('5', [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E]),
    ('6', [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E]),
    ('7', [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08]),
    ('8', [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E]),
    ('9', [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C]),
    ('-', [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00]),
    ('+', [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00]),
    ('.', [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C]),
];

/// A bitmap font keyed by character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphFont {
    glyphs: BTreeMap<char, GlyphRows>,
}

impl GlyphFont {
    /// The font compiled into the crate.
    pub fn builtin() -> Self {
        Self {
            glyphs: BUILTIN.iter().copied().collect(),
        }
    }

    /// Decodes the font resource format: records of a little-endian `u32`
    /// code point followed by the glyph rows.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LoaderError> {
        let malformed = |reason: String| LoaderError::Malformed {
            name: GLYPH_FONT_RESOURCE.to_string(),
            reason,
        };
        if bytes.is_empty() || bytes.len() % RECORD_LEN != 0 {
            return Err(malformed(format!("length {} is not a record multiple", bytes.len())));
        }
        let mut glyphs = BTreeMap::new();
        for record in bytes.chunks_exact(RECORD_LEN) {
            let code = u32::from_le_bytes([record[0], record[1], record[2], record[3]]);
            let c = char::from_u32(code)
                .ok_or_else(|| malformed(format!("invalid code point {code:#x}")))?;
            let mut rows = [0u8; GLYPH_ROWS];
            rows.copy_from_slice(&record[4..]);
            if rows.iter().any(|r| *r >> GLYPH_COLUMNS != 0) {
                return Err(malformed(format!("glyph {c:?} is wider than {GLYPH_COLUMNS}")));
            }
            glyphs.insert(c, rows);
        }
        Ok(Self { glyphs })
    }

    /// Encodes the font in the resource format.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.glyphs.len() * RECORD_LEN);
        for (c, rows) in &self.glyphs {
            out.extend_from_slice(&u32::from(*c).to_le_bytes());
            out.extend_from_slice(rows);
        }
        out
    }

    /// Looks up a glyph. Lowercase letters use the uppercase glyph.
    pub fn get(&self, c: char) -> Option<&GlyphRows> {
        self.glyphs
            .get(&c)
            .or_else(|| self.glyphs.get(&c.to_ascii_uppercase()))
    }

    /// Number of glyphs.
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Returns `true` when the font has no glyphs.
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// Builds a glyph `height` tall, centred on the local origin, spanning
/// `z0..z1`.
///
/// Runs are grown by a small fraction of a cell in `x` and `y` so that
/// cells touching only at a corner still overlap in volume.
pub fn glyph_solid(rows: &GlyphRows, height: f64, z0: f64, z1: f64) -> Result<Solid, FeatureError> {
    let cell = positive("size", height)? / GLYPH_ROWS as f64;
    let grow = cell * 0.05;
    let left = -(GLYPH_COLUMNS as f64) * cell * 0.5;
    let top = GLYPH_ROWS as f64 * cell * 0.5;

    let mut boxes = Vec::new();
    for (r, bits) in rows.iter().enumerate() {
        let y1 = top - r as f64 * cell;
        let y0 = y1 - cell;
        let mut col = 0;
        while col < GLYPH_COLUMNS {
            if bits & (1 << (GLYPH_COLUMNS - 1 - col)) == 0 {
                col += 1;
                continue;
            }
            let start = col;
            while col < GLYPH_COLUMNS && bits & (1 << (GLYPH_COLUMNS - 1 - col)) != 0 {
                col += 1;
            }
            let x0 = left + start as f64 * cell;
            let x1 = left + col as f64 * cell;
            boxes.push(cuboid(
                DVec3::new(x0 - grow, y0 - grow, z0),
                DVec3::new(x1 + grow, y1 + grow, z1),
            )?);
        }
    }
    if boxes.is_empty() {
        return Err(FeatureError::Degenerate("blank glyph".into()));
    }
    Ok(Solid::union_all(boxes))
}
