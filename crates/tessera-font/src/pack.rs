// Font pack: the four style atlases sharing one geometry plus an optional
// double-width atlas, resolved through the system font database.

use std::path::PathBuf;

use cosmic_text::fontdb::{Database, Family, Query, Source, Stretch, Style, Weight};
use cosmic_text::FontSystem;
use tessera_core::Options;

use crate::font::Font;
use crate::FontError;

#[derive(Debug, Clone, PartialEq, Eq)]
struct FaceLocation {
    path: PathBuf,
    index: u32,
}

pub struct FontPack {
    regular: Font,
    bold: Font,
    italic: Font,
    bold_italic: Font,
    double_width: Option<Font>,
}

impl FontPack {
    pub fn load(options: &Options) -> Result<FontPack, FontError> {
        let font_system = FontSystem::new();
        let db = font_system.db();

        let regular_face = match &options.font_path {
            Some(path) => FaceLocation {
                path: path.clone(),
                index: 0,
            },
            None => find_face(db, &options.font, Weight::NORMAL, Style::Normal)
                .ok_or_else(|| FontError::NotFound(options.font.clone()))?,
        };
        log::info!("Regular font: {}", regular_face.path.display());
        let regular = Font::load(&regular_face.path, regular_face.index, options.font_size)?;

        let load_style = |weight: Weight, style: Style, label: &str| -> Result<Font, FontError> {
            // An explicit font file has no family to search for style variants.
            let found = match options.font_path {
                Some(_) => None,
                None => find_face(db, &options.font, weight, style),
            };
            match found {
                Some(face) if face != regular_face => {
                    log::info!("{label} font: {}", face.path.display());
                    Font::load_overlay(&face.path, face.index, &regular, options.font_size)
                }
                _ => {
                    log::warn!("No {label} face for {}; using regular glyphs", options.font);
                    Ok(Font::fallback_overlay(&regular))
                }
            }
        };
        let bold = load_style(Weight::BOLD, Style::Normal, "bold")?;
        let italic = load_style(Weight::NORMAL, Style::Italic, "italic")?;
        let bold_italic = load_style(Weight::BOLD, Style::Italic, "bold-italic")?;

        let double_width = match &options.dw_font {
            Some(family) => {
                let face = find_face(db, family, Weight::NORMAL, Style::Normal)
                    .ok_or_else(|| FontError::NotFound(family.clone()))?;
                log::info!("Double-width font: {}", face.path.display());
                Some(Font::load_double_width(
                    &face.path,
                    face.index,
                    &regular,
                    options.font_size,
                )?)
            }
            None => None,
        };

        Ok(FontPack::from_fonts(
            regular,
            bold,
            italic,
            bold_italic,
            double_width,
        ))
    }

    pub fn from_fonts(
        regular: Font,
        bold: Font,
        italic: Font,
        bold_italic: Font,
        double_width: Option<Font>,
    ) -> FontPack {
        FontPack {
            regular,
            bold,
            italic,
            bold_italic,
            double_width,
        }
    }

    pub fn px(&self) -> u16 {
        self.regular.px()
    }

    pub fn py(&self) -> u16 {
        self.regular.py()
    }

    pub fn regular(&self) -> &Font {
        &self.regular
    }

    pub fn bold(&self) -> &Font {
        &self.bold
    }

    pub fn italic(&self) -> &Font {
        &self.italic
    }

    pub fn bold_italic(&self) -> &Font {
        &self.bold_italic
    }

    pub fn double_width(&self) -> Option<&Font> {
        self.double_width.as_ref()
    }

    pub fn has_double_width(&self) -> bool {
        self.double_width.is_some()
    }

    /// The four style fonts in atlas layer order.
    pub fn styles(&self) -> [&Font; 4] {
        [&self.regular, &self.bold, &self.italic, &self.bold_italic]
    }

    /// Underline (top, thickness) per style: slots 0..4 for the normal-width
    /// styles, 4..8 for double-width cells of the same styles.
    pub fn ul_metrics(&self) -> [[f32; 2]; 8] {
        let mut metrics = [[0.0; 2]; 8];
        for (i, font) in self.styles().into_iter().enumerate() {
            metrics[i] = [font.ul_top(), font.ul_thick()];
            let wide = self.double_width.as_ref().unwrap_or(font);
            metrics[i + 4] = [wide.ul_top(), wide.ul_thick()];
        }
        metrics
    }

    /// Drop all CPU-side atlas data after it has been uploaded.
    pub fn release_fonts(&mut self) {
        self.regular.release();
        self.bold.release();
        self.italic.release();
        self.bold_italic.release();
        if let Some(dw) = self.double_width.as_mut() {
            dw.release();
        }
    }
}

fn family(name: &str) -> Family<'_> {
    match name {
        "monospace" => Family::Monospace,
        "serif" => Family::Serif,
        "sans-serif" => Family::SansSerif,
        other => Family::Name(other),
    }
}

/// Only a face with exactly the requested weight and style counts as found.
fn find_face(db: &Database, name: &str, weight: Weight, style: Style) -> Option<FaceLocation> {
    let families = [family(name)];
    let query = Query {
        families: &families,
        weight,
        stretch: Stretch::Normal,
        style,
    };
    let id = db.query(&query)?;
    let face = db.face(id)?;
    if face.weight != weight || face.style != style {
        return None;
    }
    match &face.source {
        Source::File(path) => Some(FaceLocation {
            path: path.clone(),
            index: face.index,
        }),
        _ => None,
    }
}
