// Glyph rasterizer: the seam between the atlas builder and the font library.

use std::path::{Path, PathBuf};

use swash::scale::image::Content;
use swash::scale::{Render, ScaleContext, Source, StrikeWith};
use swash::FontRef;

use crate::FontError;

/// Bitmap encoding of a rasterized glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelMode {
    /// 1 bit per pixel, leftmost pixel in the most significant bit.
    Mono,
    /// 8 bit coverage per pixel.
    Gray,
    /// Anything else the library hands back (subpixel, color).
    Other(&'static str),
}

/// A rasterized glyph bitmap plus its placement relative to the pen position.
#[derive(Debug, Clone)]
pub struct Glyph {
    pub width: u32,
    pub rows: u32,
    /// Bytes per bitmap row, including padding.
    pub pitch: usize,
    /// Horizontal bearing: pixels from the cell's left edge to the bitmap.
    pub left: i32,
    /// Vertical bearing: pixels from the baseline up to the bitmap's top row.
    pub top: i32,
    pub mode: PixelMode,
    pub buffer: Vec<u8>,
}

impl Glyph {
    pub fn empty() -> Self {
        Self {
            width: 0,
            rows: 0,
            pitch: 0,
            left: 0,
            top: 0,
            mode: PixelMode::Gray,
            buffer: Vec::new(),
        }
    }
}

/// A bitmap strike available in a fixed-size face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedSize {
    pub width: u16,
    pub height: u16,
}

/// Face-wide metrics in font units. Descender and underline position are
/// negative below the baseline.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FaceMetrics {
    /// Zero for faces without scalable outlines.
    pub units_per_em: u16,
    pub ascender: f32,
    pub descender: f32,
    pub max_advance: f32,
    pub underline_position: f32,
    pub underline_thickness: f32,
}

pub trait GlyphFace {
    /// Human readable face name for logging.
    fn describe(&self) -> String;

    /// Every codepoint the face maps to a glyph, ascending.
    fn codepoints(&self) -> Vec<u32>;

    fn fixed_sizes(&self) -> Vec<FixedSize>;

    fn metrics(&self) -> FaceMetrics;

    /// Render one codepoint at the given pixels-per-em.
    fn rasterize(&mut self, codepoint: u32, ppem: f32) -> Result<Glyph, FontError>;
}

// ──────────────────────────────────────────────
// swash backend
// ──────────────────────────────────────────────

pub struct SwashFace {
    path: PathBuf,
    data: Vec<u8>,
    index: usize,
    has_outlines: bool,
    context: ScaleContext,
}

impl SwashFace {
    pub fn open(path: &Path, index: u32) -> Result<Self, FontError> {
        let data = std::fs::read(path).map_err(|source| FontError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut context = ScaleContext::new();
        let has_outlines = match FontRef::from_index(&data, index as usize) {
            Some(font) => context.builder(font).build().has_outlines(),
            None => return Err(FontError::InvalidFont(path.to_path_buf())),
        };

        Ok(Self {
            path: path.to_path_buf(),
            data,
            index: index as usize,
            has_outlines,
            context,
        })
    }

    fn font(&self) -> Option<FontRef<'_>> {
        FontRef::from_index(&self.data, self.index)
    }
}

impl GlyphFace for SwashFace {
    fn describe(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match self.font() {
            Some(font) => {
                let glyphs = font.metrics(&[]).glyph_count;
                format!("{name} #{}; {glyphs} glyphs", self.index)
            }
            None => name,
        }
    }

    fn codepoints(&self) -> Vec<u32> {
        let mut codepoints = Vec::new();
        if let Some(font) = self.font() {
            font.charmap().enumerate(|codepoint, _glyph_id| codepoints.push(codepoint));
        }
        codepoints.sort_unstable();
        codepoints.dedup();
        codepoints
    }

    fn fixed_sizes(&self) -> Vec<FixedSize> {
        let Some(font) = self.font() else {
            return Vec::new();
        };
        let metrics = font.metrics(&[]);
        font.alpha_strikes()
            .map(|strike| {
                let ppem = strike.ppem();
                // Strikes only carry ppem; derive the cell width from the widest advance.
                let width = if metrics.units_per_em > 0 {
                    (metrics.max_width * ppem as f32 / metrics.units_per_em as f32).round() as u16
                } else {
                    ppem
                };
                FixedSize { width, height: ppem }
            })
            .collect()
    }

    fn metrics(&self) -> FaceMetrics {
        let Some(font) = self.font() else {
            return FaceMetrics::default();
        };
        let m = font.metrics(&[]);
        // Bitmap-only faces still carry a head table; only outlines can scale.
        FaceMetrics {
            units_per_em: if self.has_outlines { m.units_per_em } else { 0 },
            ascender: m.ascent,
            descender: -m.descent,
            max_advance: m.max_width,
            underline_position: m.underline_offset,
            underline_thickness: m.stroke_size,
        }
    }

    fn rasterize(&mut self, codepoint: u32, ppem: f32) -> Result<Glyph, FontError> {
        let font = FontRef::from_index(&self.data, self.index)
            .ok_or_else(|| FontError::InvalidFont(self.path.clone()))?;
        let glyph_id = font.charmap().map(codepoint);

        let mut scaler = self.context.builder(font).size(ppem).hint(true).build();
        let image = Render::new(&[
            Source::Bitmap(StrikeWith::ExactSize),
            Source::Outline,
        ])
        .render(&mut scaler, glyph_id);

        // Blank glyphs (space and friends) render to nothing.
        let Some(image) = image else {
            return Ok(Glyph::empty());
        };

        let mode = match image.content {
            Content::Mask => PixelMode::Gray,
            Content::SubpixelMask => PixelMode::Other("subpixel mask"),
            Content::Color => PixelMode::Other("color"),
        };

        Ok(Glyph {
            width: image.placement.width,
            rows: image.placement.height,
            pitch: image.placement.width as usize,
            left: image.placement.left,
            top: image.placement.top,
            mode,
            buffer: image.data,
        })
    }
}
