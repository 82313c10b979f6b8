// Core types for the Tessera grid renderer.
// Shared by the font atlas builder and the GPU pipeline controller.

mod options;

pub use options::{Options, OptionsError};

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

// ──────────────────────────────────────────────
// Geometry
// ──────────────────────────────────────────────

/// A cell coordinate on the character grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: u16,
    pub y: u16,
}

impl Point {
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// Row-major cell index on a grid `cols` cells wide.
    pub fn linear(&self, cols: u16) -> u32 {
        cols as u32 * self.y as u32 + self.x as u32
    }
}

// Points compare in reading order (row first) so that min/max over two
// selections yields the first and last cell they touch.
impl PartialOrd for Point {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Point {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.y.cmp(&other.y).then(self.x.cmp(&other.x))
    }
}

/// Selected region from `tl` up to `br`. The compute pass paints `br` as the
/// first unselected cell (column, for block selections); `tl == br` selects
/// nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub tl: Point,
    pub br: Point,
    /// Block selection instead of the usual line-wrapped stream.
    pub rectangular: bool,
}

impl Selection {
    pub const fn new(tl: Point, br: Point, rectangular: bool) -> Self {
        Self { tl, br, rectangular }
    }

    pub fn is_empty(&self) -> bool {
        self.tl == self.br
    }
}

// ──────────────────────────────────────────────
// Colors
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    /// Packed `0x00RRGGBB`, the layout the compute shader unpacks.
    pub const fn packed(&self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    pub fn to_f64(&self) -> [f64; 3] {
        [
            self.r as f64 / 255.0,
            self.g as f64 / 255.0,
            self.b as f64 / 255.0,
        ]
    }
}

// ──────────────────────────────────────────────
// Cursor
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum CursorStyle {
    Hidden = 0,
    #[default]
    FilledBlock = 1,
    HollowBlock = 2,
    Underline = 3,
    Beam = 4,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub pos: Point,
    pub style: CursorStyle,
    pub color: Rgb,
}

// ──────────────────────────────────────────────
// Cells
// ──────────────────────────────────────────────

bitflags::bitflags! {
    /// Per-cell attribute bits, stored in `Cell::attrs`.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct CellAttrs: u32 {
        const BOLD              = 0b0000_0001;
        const ITALIC            = 0b0000_0010;
        const UNDERLINE         = 0b0000_0100;
        const INVERSE           = 0b0000_1000;
        const WRAP              = 0b0001_0000;
        const DOUBLE_WIDTH      = 0b0010_0000;
        const DOUBLE_WIDTH_CONT = 0b0100_0000;
        const DIRTY             = 0b1000_0000;
    }
}

/// One grid cell as laid out in the GPU storage buffer.
/// 16 bytes; mirrors `struct Cell` in the compute shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Cell {
    /// Basic Multilingual Plane codepoint; only the low 16 bits are looked up.
    pub codepoint: u32,
    pub attrs: u32,
    /// `0x00RRGGBB`
    pub fg: u32,
    /// `0x00RRGGBB`
    pub bg: u32,
}

impl Cell {
    pub fn new(ch: char, attrs: CellAttrs, fg: Rgb, bg: Rgb) -> Self {
        Self {
            codepoint: ch as u32,
            attrs: attrs.bits(),
            fg: fg.packed(),
            bg: bg.packed(),
        }
    }

    pub fn attrs(&self) -> CellAttrs {
        CellAttrs::from_bits_truncate(self.attrs)
    }

    /// Atlas texture layer holding this cell's style variant.
    pub fn font_layer(&self) -> u32 {
        let attrs = self.attrs();
        match (attrs.contains(CellAttrs::BOLD), attrs.contains(CellAttrs::ITALIC)) {
            (true, true) => 3,
            (false, true) => 2,
            (true, false) => 1,
            (false, false) => 0,
        }
    }
}

#[cfg(test)]
mod tests;
