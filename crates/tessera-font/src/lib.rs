// Glyph atlas builder.
// Rasterizes a font's glyphs into a packed luminance atlas, builds the
// codepoint -> atlas position table, and encodes it as a 256x256 lookup image.

mod atlas;
mod face;
mod font;
mod mapping;
mod pack;

use std::path::PathBuf;

pub use atlas::{AtlasGeometry, AtlasPos};
pub use face::{FaceMetrics, FixedSize, Glyph, GlyphFace, PixelMode, SwashFace};
pub use font::{Font, FontKind, LoadMode};
pub use mapping::{default_position, encode_atlas_mapping, MAPPING_BYTES, MAPPING_SIDE};
pub use pack::FontPack;

/// Codepoint of the font's "missing glyph" (.notdef) slot.
pub const MISSING_GLYPH_MARKER: u32 = 0x0000;
pub const UNICODE_REPLACEMENT_CHARACTER: u32 = 0xFFFD;

#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("failed to read font {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to load font {0}")]
    InvalidFont(PathBuf),
    #[error("no font face found for family \"{0}\"")]
    NotFound(String),
    #[error("{path}: size mismatch, expected {axis}={expected}, got: {actual}")]
    SizeMismatch {
        path: PathBuf,
        axis: &'static str,
        expected: u16,
        actual: u16,
    },
    #[error("invalid glyph size {px}x{py}")]
    GlyphSize { px: u16, py: u16 },
    #[error("impossible atlas geometry {nx}x{ny}: not addressable by single byte coords")]
    AtlasGeometry { nx: u32, ny: u32 },
    #[error("unhandled pixel mode {mode} for U+{codepoint:04X}")]
    UnsupportedPixelMode { codepoint: u32, mode: &'static str },
}
