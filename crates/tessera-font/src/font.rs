// A single font style rendered into an atlas.
//
// Primary and double-width fonts pack their own atlas. Overlay fonts (bold,
// italic, bold-italic) start from a copy of the primary font's atlas and map
// and only replace the glyphs they provide, so anything missing falls back to
// the regular glyph at the same position.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use unicode_width::UnicodeWidthChar;

use crate::atlas::{AtlasGeometry, AtlasPos};
use crate::face::{GlyphFace, SwashFace};
use crate::mapping::encode_atlas_mapping;
use crate::{FontError, MISSING_GLYPH_MARKER, UNICODE_REPLACEMENT_CHARACTER};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontKind {
    Primary,
    Overlay,
    DoubleWidth,
}

impl FontKind {
    fn label(&self) -> &'static str {
        match self {
            FontKind::Primary => "primary",
            FontKind::Overlay => "overlay",
            FontKind::DoubleWidth => "double-width",
        }
    }
}

/// How to build a font relative to an already loaded primary font.
#[derive(Debug, Clone, Copy)]
pub enum LoadMode<'a> {
    Primary,
    Overlay(&'a Font),
    DoubleWidth(&'a Font),
}

#[derive(Debug, Clone)]
pub struct Font {
    path: PathBuf,
    kind: FontKind,
    px: u16,
    py: u16,
    baseline: u16,
    ul_top: f32,
    ul_thick: f32,
    nx: u16,
    ny: u16,
    atlas: Vec<u8>,
    atlas_map: HashMap<u16, AtlasPos>,
}

impl Font {
    pub fn load(path: &Path, index: u32, font_size: u16) -> Result<Font, FontError> {
        let mut face = SwashFace::open(path, index)?;
        Font::from_face(&mut face, path, LoadMode::Primary, font_size)
    }

    pub fn load_overlay(
        path: &Path,
        index: u32,
        primary: &Font,
        font_size: u16,
    ) -> Result<Font, FontError> {
        let mut face = SwashFace::open(path, index)?;
        Font::from_face(&mut face, path, LoadMode::Overlay(primary), font_size)
    }

    pub fn load_double_width(
        path: &Path,
        index: u32,
        primary: &Font,
        font_size: u16,
    ) -> Result<Font, FontError> {
        let mut face = SwashFace::open(path, index)?;
        Font::from_face(&mut face, path, LoadMode::DoubleWidth(primary), font_size)
    }

    /// An overlay that patches nothing: every glyph resolves to the regular one.
    pub fn fallback_overlay(primary: &Font) -> Font {
        Font {
            kind: FontKind::Overlay,
            ..primary.clone()
        }
    }

    pub fn from_face(
        face: &mut dyn GlyphFace,
        path: &Path,
        mode: LoadMode<'_>,
        font_size: u16,
    ) -> Result<Font, FontError> {
        let mut font = match mode {
            LoadMode::Primary => Font::empty(path, FontKind::Primary),
            LoadMode::Overlay(primary) => Font {
                path: path.to_path_buf(),
                ..Font::fallback_overlay(primary)
            },
            LoadMode::DoubleWidth(primary) => Font {
                px: primary.px * 2,
                py: primary.py,
                ..Font::empty(path, FontKind::DoubleWidth)
            },
        };
        log::info!("Loading {} as {}", path.display(), font.kind.label());

        let all = face.codepoints();
        let loadable: Vec<u32> = all
            .iter()
            .copied()
            .filter(|&c| font.is_loadable(c))
            .collect();
        log::trace!(
            "Face: {}; Glyphs: {} to load ({} total)",
            face.describe(),
            loadable.len(),
            all.len()
        );

        let ppem = if face.fixed_sizes().is_empty() {
            font.load_scaled(face, font_size)?
        } else {
            font.load_fixed(face, font_size)?
        };

        if font.kind != FontKind::Overlay {
            font.allocate_atlas(loadable.len())?;
        }
        let geometry = font.geometry();

        // Slot 0 is the reserved blank glyph.
        let mut seq = 1;
        for codepoint in loadable {
            let pos = match font.kind {
                FontKind::Overlay => match font.atlas_map.get(&(codepoint as u16)) {
                    Some(&pos) => pos,
                    None => continue,
                },
                _ => {
                    let pos = geometry.slot(seq);
                    seq += 1;
                    pos
                }
            };

            let glyph = face.rasterize(codepoint, ppem)?;
            geometry.blit(
                &mut font.atlas,
                pos,
                font.baseline,
                codepoint,
                &glyph,
                font.kind == FontKind::Overlay,
            )?;
            font.atlas_map.insert(codepoint as u16, pos);
        }

        Ok(font)
    }

    fn empty(path: &Path, kind: FontKind) -> Font {
        Font {
            path: path.to_path_buf(),
            kind,
            px: 0,
            py: 0,
            baseline: 0,
            ul_top: 0.0,
            ul_thick: 0.0,
            nx: 0,
            ny: 0,
            atlas: Vec::new(),
            atlas_map: HashMap::new(),
        }
    }

    fn is_loadable(&self, codepoint: u32) -> bool {
        if codepoint == MISSING_GLYPH_MARKER || codepoint == UNICODE_REPLACEMENT_CHARACTER {
            return true;
        }
        // Discard everything outside the Basic Multilingual Plane
        if codepoint > u16::MAX as u32 {
            return false;
        }
        let Some(ch) = char::from_u32(codepoint) else {
            return false;
        };
        let wide = ch.width() == Some(2);
        wide == (self.kind == FontKind::DoubleWidth)
    }

    /// Pick the bitmap strike closest to `font_size`. Returns the ppem to render at.
    fn load_fixed(&mut self, face: &mut dyn GlyphFace, font_size: u16) -> Result<f32, FontError> {
        let sizes = face.fixed_sizes();
        let available: Vec<String> = sizes
            .iter()
            .map(|s| format!("{}x{}", s.width, s.height))
            .collect();
        log::trace!("Available sizes: {}", available.join(" "));

        let Some((best, diff)) = sizes
            .iter()
            .map(|s| (*s, (font_size as i32 - s.height as i32).abs()))
            .min_by_key(|&(_, diff)| diff)
        else {
            return self.load_scaled(face, font_size);
        };
        log::trace!(
            "Configured size: {font_size}; Best matching fixed size: {}x{}",
            best.width,
            best.height
        );

        let metrics = face.metrics();
        if diff > 1 && metrics.units_per_em > 0 {
            log::trace!("Size mismatch too large, fallback to rendering outlines.");
            return self.load_scaled(face, font_size);
        }

        if self.kind == FontKind::Primary {
            self.px = best.width;
            self.py = best.height;
            self.baseline = 0;
            self.ul_top = best.height as f32 - 1.0;
            self.ul_thick = 1.0;
        } else {
            self.check_size("px", self.px, best.width)?;
            self.check_size("py", self.py, best.height)?;
        }
        log::info!("Glyph size {}x{}", self.px, self.py);

        // A bitmap strike of an otherwise scalable font still needs the
        // baseline and underline metrics.
        if self.kind != FontKind::Overlay && metrics.units_per_em > 0 {
            let scaled = |v: f32| scale_units(font_size, v, metrics.units_per_em);
            self.baseline = scaled(metrics.ascender).trunc() as u16;
            self.set_underline(
                scaled(metrics.underline_position),
                scaled(metrics.underline_thickness),
            );
            log::info!(
                "Baseline {}, underline top at {} thickness {}",
                self.baseline,
                self.ul_top,
                self.ul_thick
            );
        }

        Ok(best.height as f32)
    }

    fn load_scaled(&mut self, face: &mut dyn GlyphFace, font_size: u16) -> Result<f32, FontError> {
        log::info!("Pixel size {font_size}");
        let metrics = face.metrics();
        if metrics.units_per_em == 0 {
            return Err(FontError::InvalidFont(self.path.clone()));
        }

        let scaled = |v: f32| scale_units(font_size, v, metrics.units_per_em);
        let tpx = scaled(metrics.max_advance);
        let tpy_asc = scaled(metrics.ascender);
        let tpy_desc = scaled(metrics.descender);
        if self.kind == FontKind::Primary {
            self.px = tpx.trunc() as u16;
            self.py = (tpy_asc.trunc() + (-tpy_desc).trunc()) as u16;
        }
        if self.kind != FontKind::Overlay {
            self.baseline = tpy_asc.trunc() as u16;
        }
        log::info!(
            "Glyph size {}x{}, baseline {}",
            self.px,
            self.py,
            self.baseline
        );

        self.set_underline(
            scaled(metrics.underline_position),
            scaled(metrics.underline_thickness),
        );
        log::info!(
            "Underline top at {} thickness {}",
            self.ul_top,
            self.ul_thick
        );

        Ok(font_size as f32)
    }

    fn set_underline(&mut self, position: f64, thickness: f64) {
        self.ul_top = (self.baseline as f64 - position - thickness / 2.0) as f32;
        self.ul_thick = thickness as f32;
    }

    fn check_size(&self, axis: &'static str, expected: u16, actual: u16) -> Result<(), FontError> {
        if expected == actual {
            return Ok(());
        }
        Err(FontError::SizeMismatch {
            path: self.path.clone(),
            axis,
            expected,
            actual,
        })
    }

    fn allocate_atlas(&mut self, n_glyphs: usize) -> Result<(), FontError> {
        let geometry = AtlasGeometry::compute(n_glyphs, self.px, self.py)?;
        self.nx = geometry.nx;
        self.ny = geometry.ny;

        let capacity = geometry.capacity();
        let used = n_glyphs + 1;
        log::trace!(
            "Atlas texture geometry: {}x{} glyphs of {}x{} each, yielding pixel size {}x{}.",
            geometry.nx,
            geometry.ny,
            geometry.px,
            geometry.py,
            geometry.pixel_width(),
            geometry.pixel_height()
        );
        log::trace!(
            "Atlas holds space for {capacity} glyphs, {used} will be used, empty: {} ({:.1}%)",
            capacity - used,
            100.0 * (capacity - used) as f64 / capacity as f64
        );
        log::trace!("Allocating {} bytes for atlas buffer", geometry.byte_len());

        self.atlas = vec![0; geometry.byte_len()];
        Ok(())
    }

    // ── Accessors ──

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> FontKind {
        self.kind
    }

    pub fn px(&self) -> u16 {
        self.px
    }

    pub fn py(&self) -> u16 {
        self.py
    }

    pub fn baseline(&self) -> u16 {
        self.baseline
    }

    pub fn ul_top(&self) -> f32 {
        self.ul_top
    }

    pub fn ul_thick(&self) -> f32 {
        self.ul_thick
    }

    pub fn nx(&self) -> u16 {
        self.nx
    }

    pub fn ny(&self) -> u16 {
        self.ny
    }

    pub fn geometry(&self) -> AtlasGeometry {
        AtlasGeometry {
            nx: self.nx,
            ny: self.ny,
            px: self.px,
            py: self.py,
        }
    }

    pub fn atlas(&self) -> &[u8] {
        &self.atlas
    }

    pub fn atlas_map(&self) -> &HashMap<u16, AtlasPos> {
        &self.atlas_map
    }

    /// 256x256 two-byte lookup image for this font's atlas.
    pub fn atlas_mapping(&self) -> Vec<u8> {
        encode_atlas_mapping(&self.atlas_map)
    }

    /// Drop the pixel buffer and codepoint table once they live on the GPU.
    /// Cell and atlas geometry stay available.
    pub fn release(&mut self) {
        self.atlas = Vec::new();
        self.atlas_map = HashMap::new();
    }
}

/// Font units to pixels at `font_size` pixels per em.
fn scale_units(font_size: u16, units: f32, units_per_em: u16) -> f64 {
    font_size as f64 * units as f64 / units_per_em as f64
}
