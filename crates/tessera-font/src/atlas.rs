// Atlas geometry and glyph blitting into the flat luminance buffer.

use crate::face::{Glyph, PixelMode};
use crate::FontError;

/// Glyph-grid coordinate of one cell in the atlas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AtlasPos {
    pub x: u8,
    pub y: u8,
}

impl AtlasPos {
    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }
}

/// Packing grid of `nx * ny` glyph cells of `px * py` pixels each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasGeometry {
    pub nx: u16,
    pub ny: u16,
    pub px: u16,
    pub py: u16,
}

impl AtlasGeometry {
    /// Choose a near-square grid holding `n_glyphs` plus one spare slot, so
    /// that slot (0,0) stays blank.
    pub fn compute(n_glyphs: usize, px: u16, py: u16) -> Result<Self, FontError> {
        if px == 0 || py == 0 {
            return Err(FontError::GlyphSize { px, py });
        }

        let n = n_glyphs as u64 + 1;
        let (px64, py64) = (px as u64, py as u64);
        let side = ((n * px64 * py64) as f64).sqrt();
        let mut nx = (side / px as f64) as u64;
        let mut ny = (side / py as f64) as u64;
        while nx * ny < n {
            if px64 * nx < py64 * ny {
                nx += 1;
            } else {
                ny += 1;
            }
        }

        if nx > 255 || ny > 255 {
            log::error!(
                "Atlas geometry {nx}x{ny} not addressable by single byte coords. \
                 Please report this as a bug with your font attached!"
            );
            return Err(FontError::AtlasGeometry {
                nx: nx as u32,
                ny: ny as u32,
            });
        }

        Ok(Self {
            nx: nx as u16,
            ny: ny as u16,
            px,
            py,
        })
    }

    pub fn capacity(&self) -> usize {
        self.nx as usize * self.ny as usize
    }

    pub fn pixel_width(&self) -> u32 {
        self.nx as u32 * self.px as u32
    }

    pub fn pixel_height(&self) -> u32 {
        self.ny as u32 * self.py as u32
    }

    pub fn byte_len(&self) -> usize {
        self.pixel_width() as usize * self.pixel_height() as usize
    }

    /// Row-major slot number to grid position.
    pub fn slot(&self, seq: usize) -> AtlasPos {
        let nx = self.nx as usize;
        AtlasPos::new((seq % nx) as u8, (seq / nx) as u8)
    }

    /// Byte offset of the top-left pixel of the cell at `pos`.
    pub fn cell_offset(&self, pos: AtlasPos) -> usize {
        let stride = self.pixel_width() as usize;
        pos.y as usize * stride * self.py as usize + pos.x as usize * self.px as usize
    }

    /// Copy out the `px * py` pixels of one cell, row by row.
    pub fn cell_pixels(&self, atlas: &[u8], pos: AtlasPos) -> Vec<u8> {
        let stride = self.pixel_width() as usize;
        let origin = self.cell_offset(pos);
        let px = self.px as usize;
        (0..self.py as usize)
            .flat_map(|row| {
                let start = origin + row * stride;
                atlas[start..start + px].iter().copied()
            })
            .collect()
    }

    /// Write `glyph` into its cell. Bitmap parts falling outside the cell are
    /// clipped; with `clear` the whole cell is zeroed first.
    pub fn blit(
        &self,
        atlas: &mut [u8],
        pos: AtlasPos,
        baseline: u16,
        codepoint: u32,
        glyph: &Glyph,
        clear: bool,
    ) -> Result<(), FontError> {
        if let PixelMode::Other(mode) = glyph.mode {
            return Err(FontError::UnsupportedPixelMode { codepoint, mode });
        }

        let stride = self.pixel_width() as usize;
        let origin = self.cell_offset(pos);
        let (px, py) = (self.px as i64, self.py as i64);

        if clear {
            for row in 0..py as usize {
                let start = origin + row * stride;
                atlas[start..start + px as usize].fill(0);
            }
        }

        // Destination offset inside the cell.
        let mut dx = glyph.left as i64;
        let mut dy = if baseline > 0 {
            baseline as i64 - glyph.top as i64
        } else {
            0
        };

        // Source rows/columns to skip where the bitmap starts above or left of the cell.
        let skip_rows = (-dy).max(0);
        let skip_cols = (-dx).max(0);
        dx += skip_cols;
        dy += skip_rows;

        let rows = (glyph.rows as i64 - skip_rows).min(py - dy);
        let cols = (glyph.width as i64 - skip_cols).min(px - dx);
        if rows <= 0 || cols <= 0 {
            return Ok(());
        }

        let write_origin = origin + dy as usize * stride + dx as usize;
        for j in 0..rows as usize {
            let src_row = (j + skip_rows as usize) * glyph.pitch;
            let dst = write_origin + j * stride;
            for k in 0..cols as usize {
                let src_col = k + skip_cols as usize;
                atlas[dst + k] = match glyph.mode {
                    PixelMode::Mono => {
                        let byte = glyph.buffer[src_row + src_col / 8];
                        if byte & (0x80 >> (src_col % 8)) != 0 {
                            0xff
                        } else {
                            0
                        }
                    }
                    _ => glyph.buffer[src_row + src_col],
                };
            }
        }

        Ok(())
    }
}
