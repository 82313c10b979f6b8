// GPU character grid renderer.
// A compute pass paints every grid cell into an output image from the glyph
// atlases; a render pass then blits that image onto the framebuffer.

mod init;
mod mapping;
mod shaders;
mod state;
mod vertex;

use std::ops::Range;
use std::sync::Arc;

use tessera_core::{Cursor, Selection};

pub use mapping::{CellStore, Mapping};
pub use state::{GridState, Viewport};
pub use vertex::{ComputeParams, DrawParams, QuadVertex};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("{stage} shader failed: {log}")]
    Shader { stage: &'static str, log: String },
    #[error("{operation} called while a cell buffer mapping is open")]
    MappingOpen { operation: &'static str },
    #[error("{operation} called before the first resize")]
    NotSized { operation: &'static str },
}

impl RenderError {
    /// Programming errors in the caller, as opposed to backend failures.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            RenderError::MappingOpen { .. } | RenderError::NotSized { .. }
        )
    }
}

// ──────────────────────────────────────────────
// GPU resources
// ──────────────────────────────────────────────

/// An atlas texture array and the mapping image that indexes it.
pub(crate) struct AtlasTextures {
    #[allow(dead_code)]
    atlas: wgpu::Texture,
    atlas_view: wgpu::TextureView,
    #[allow(dead_code)]
    mapping: wgpu::Texture,
    mapping_view: wgpu::TextureView,
}

/// Everything sized by the grid, rebuilt on every resize.
pub(crate) struct FrameTargets {
    #[allow(dead_code)]
    output: wgpu::Texture,
    cell_buffer: wgpu::Buffer,
    compute_bind_group: wgpu::BindGroup,
    draw_bind_group: wgpu::BindGroup,
}

// ──────────────────────────────────────────────
// CharRenderer
// ──────────────────────────────────────────────

pub struct CharRenderer {
    // Pipelines
    compute_pipeline: wgpu::ComputePipeline,
    compute_bind_group_layout: wgpu::BindGroupLayout,
    draw_pipeline: wgpu::RenderPipeline,
    draw_bind_group_layout: wgpu::BindGroupLayout,

    // Uniforms and the static quad
    compute_params_buffer: wgpu::Buffer,
    draw_params_buffer: wgpu::Buffer,
    quad_vb: wgpu::Buffer,
    last_params: Option<ComputeParams>,

    // Atlases
    atlas: AtlasTextures,
    dw_atlas: AtlasTextures,
    has_double_width: bool,
    ul_metrics: [[f32; 2]; 8],

    // Grid-sized resources, None until the first resize
    targets: Option<FrameTargets>,
    cells: CellStore,
    state: GridState,
    clear_color: wgpu::Color,

    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
}

impl CharRenderer {
    pub fn cols(&self) -> u16 {
        self.state.cols()
    }

    pub fn rows(&self) -> u16 {
        self.state.rows()
    }

    pub fn state(&self) -> &GridState {
        &self.state
    }

    pub fn has_double_width(&self) -> bool {
        self.has_double_width
    }

    pub fn set_cursor(&mut self, cursor: Cursor) {
        self.state.set_cursor(cursor);
    }

    /// Returns the linear cell range damaged by the selection change.
    pub fn set_selection(&mut self, selection: Selection) -> Range<u32> {
        self.state.set_selection(selection)
    }

    pub fn set_delta_frame(&mut self, delta: bool) {
        self.state.set_delta_frame(delta);
    }

    /// Open the cell grid for writing. Fails if a mapping is already open.
    pub fn get_mapping(&self) -> Result<Mapping, RenderError> {
        self.cells.map()
    }

    /// Adapt the grid to a framebuffer of `width x height` pixels. Returns
    /// false when the size did not change. Cell contents are not preserved.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<bool, RenderError> {
        self.cells.ensure_unmapped("resize")?;
        if !self.state.resize(width, height) {
            return Ok(false);
        }

        let (cols, rows) = (self.state.cols(), self.state.rows());
        log::info!("Resize to {width} x {height} pixels, {cols} x {rows} chars");

        self.targets = Some(self.create_frame_targets());
        self.cells.reset(cols, rows)?;
        self.queue.write_buffer(
            &self.draw_params_buffer,
            0,
            bytemuck::bytes_of(&self.state.draw_params()),
        );
        self.last_params = None;
        Ok(true)
    }

    /// Record the compute pass and the blit into `encoder`, rendering into
    /// `target`. Does nothing before the first resize.
    pub fn draw(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
    ) -> Result<(), RenderError> {
        self.cells.ensure_unmapped("draw")?;
        let Some(targets) = self.targets.as_ref() else {
            return Ok(());
        };

        self.cells.flush(|cells| {
            self.queue
                .write_buffer(&targets.cell_buffer, 0, bytemuck::cast_slice(cells));
        });

        let params = self
            .state
            .compute_params(&self.ul_metrics, self.has_double_width);
        if self.last_params != Some(params) {
            self.queue
                .write_buffer(&self.compute_params_buffer, 0, bytemuck::bytes_of(&params));
            self.last_params = Some(params);
        }

        // The pass boundary makes the image writes visible to the blit below.
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("cell_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.compute_pipeline);
            pass.set_bind_group(0, &targets.compute_bind_group, &[]);
            pass.dispatch_workgroups(self.state.cols() as u32, self.state.rows() as u32, 1);
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("blit_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(v) = self.state.viewport() {
                pass.set_viewport(
                    v.x as f32,
                    v.y as f32,
                    v.width as f32,
                    v.height as f32,
                    0.0,
                    1.0,
                );
                pass.set_pipeline(&self.draw_pipeline);
                pass.set_bind_group(0, &targets.draw_bind_group, &[]);
                pass.set_vertex_buffer(0, self.quad_vb.slice(..));
                pass.draw(0..4, 0..1);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
