// Per-frame grid state: everything the compute pass is fed that does not
// live in a GPU resource. Kept free of wgpu so it can be tested directly.

use std::ops::Range;

use tessera_core::{Cursor, Point, Selection};

use crate::vertex::{ComputeParams, DrawParams};

/// Where the output image lands on the framebuffer, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct GridState {
    px: u16,
    py: u16,
    border: u16,
    show_wraps: bool,

    pixel_size: Option<(u32, u32)>,
    cols: u16,
    rows: u16,

    cursor: Cursor,
    prev_cursor: Point,
    selection: Selection,
    damage: Range<u32>,
    delta_frame: bool,
}

impl GridState {
    pub fn new(px: u16, py: u16, border: u16, show_wraps: bool) -> Self {
        Self {
            px,
            py,
            border,
            show_wraps,
            pixel_size: None,
            cols: 0,
            rows: 0,
            cursor: Cursor::default(),
            prev_cursor: Point::default(),
            selection: Selection::default(),
            damage: 0..0,
            delta_frame: false,
        }
    }

    /// Recompute the grid for a framebuffer of `width x height` pixels.
    /// Returns false if the size is the same as last time.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if self.pixel_size == Some((width, height)) {
            return false;
        }
        self.pixel_size = Some((width, height));

        let inset = 2 * self.border as u32;
        let fit = |pixels: u32, glyph: u16| -> u16 {
            let n = pixels.saturating_sub(inset) / glyph.max(1) as u32;
            n.clamp(1, u16::MAX as u32) as u16
        };
        self.cols = fit(width, self.px);
        self.rows = fit(height, self.py);
        true
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn cell_count(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    /// Pixel size of the compute output image.
    pub fn image_size(&self) -> (u32, u32) {
        (
            self.cols as u32 * self.px as u32,
            self.rows as u32 * self.py as u32,
        )
    }

    /// The output image placed at the border inset, clipped to the framebuffer.
    /// None before the first resize or when nothing of it is visible.
    pub fn viewport(&self) -> Option<Viewport> {
        let (fb_width, fb_height) = self.pixel_size?;
        let (width, height) = self.image_size();
        let origin = self.border as u32;
        let viewport = Viewport {
            x: origin,
            y: origin,
            width: width.min(fb_width.saturating_sub(origin)),
            height: height.min(fb_height.saturating_sub(origin)),
        };
        (viewport.width > 0 && viewport.height > 0).then_some(viewport)
    }

    pub fn set_cursor(&mut self, cursor: Cursor) {
        self.prev_cursor = self.cursor.pos;
        self.cursor = cursor;
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn prev_cursor(&self) -> Point {
        self.prev_cursor
    }

    /// Store the new selection and return the cells that need repainting:
    /// everything from the earliest top-left to the last bottom-right of the
    /// previous and new selection, both ends included.
    pub fn set_selection(&mut self, selection: Selection) -> Range<u32> {
        let prev = self.selection;
        let start = selection.tl.min(prev.tl).linear(self.cols);
        let end = selection.br.max(prev.br).linear(self.cols) + 1;

        self.selection = selection;
        self.damage = start..end;
        self.damage.clone()
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn damage(&self) -> Range<u32> {
        self.damage.clone()
    }

    pub fn set_delta_frame(&mut self, delta: bool) {
        self.delta_frame = delta;
    }

    pub fn delta_frame(&self) -> bool {
        self.delta_frame
    }

    pub fn compute_params(
        &self,
        ul_metrics: &[[f32; 2]; 8],
        has_double_width: bool,
    ) -> ComputeParams {
        let cursor = self.cursor;
        let sel = self.selection;
        ComputeParams {
            glyph_size_chars: [
                self.px as i32,
                self.py as i32,
                self.cols as i32,
                self.rows as i32,
            ],
            cursor_pos: [
                cursor.pos.x as i32,
                cursor.pos.y as i32,
                self.prev_cursor.x as i32,
                self.prev_cursor.y as i32,
            ],
            cursor_color_style: [
                cursor.color.r as i32,
                cursor.color.g as i32,
                cursor.color.b as i32,
                cursor.style as u8 as i32,
            ],
            select_rect: [
                sel.tl.x as i32,
                sel.tl.y as i32,
                sel.br.x as i32,
                sel.br.y as i32,
            ],
            select_state: [
                self.damage.start as i32,
                self.damage.end as i32,
                sel.rectangular as i32,
                self.delta_frame as i32,
            ],
            flags: [self.show_wraps as i32, has_double_width as i32, 0, 0],
            ul_metrics: ComputeParams::pack_ul_metrics(ul_metrics),
        }
    }

    pub fn draw_params(&self) -> DrawParams {
        let (width, height) = self
            .viewport()
            .map(|v| (v.width, v.height))
            .unwrap_or_default();
        DrawParams {
            view_pixels: [width as f32, height as f32],
            _pad: [0.0; 2],
        }
    }
}
