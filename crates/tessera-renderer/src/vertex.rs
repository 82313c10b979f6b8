// GPU-side uniform and vertex types for the compute and draw pipelines.

use bytemuck::{Pod, Zeroable};

/// Compute pass inputs. Every field is vec4-aligned so the struct maps
/// directly onto the WGSL uniform block.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct ComputeParams {
    /// glyph px, glyph py, cols, rows
    pub glyph_size_chars: [i32; 4],
    /// cursor x, cursor y, previous x, previous y
    pub cursor_pos: [i32; 4],
    /// r, g, b (0..255), cursor style
    pub cursor_color_style: [i32; 4],
    /// tl.x, tl.y, br.x, br.y
    pub select_rect: [i32; 4],
    /// damage start, damage end, rectangular, delta frame
    pub select_state: [i32; 4],
    /// show wraps, has double width, unused, unused
    pub flags: [i32; 4],
    /// Eight (underline top, thickness) pairs, two per row.
    pub ul_metrics: [[f32; 4]; 4],
}

impl ComputeParams {
    pub fn pack_ul_metrics(metrics: &[[f32; 2]; 8]) -> [[f32; 4]; 4] {
        let mut packed = [[0.0; 4]; 4];
        for (row, pair) in packed.iter_mut().zip(metrics.chunks_exact(2)) {
            *row = [pair[0][0], pair[0][1], pair[1][0], pair[1][1]];
        }
        packed
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct DrawParams {
    pub view_pixels: [f32; 2],
    pub _pad: [f32; 2],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
    pub texcoord: [f32; 2],
}

/// Full-viewport triangle strip; texcoord (0,0) is the top-left output pixel.
pub const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex {
        position: [-1.0, 1.0],
        texcoord: [0.0, 0.0],
    },
    QuadVertex {
        position: [1.0, 1.0],
        texcoord: [1.0, 0.0],
    },
    QuadVertex {
        position: [-1.0, -1.0],
        texcoord: [0.0, 1.0],
    },
    QuadVertex {
        position: [1.0, -1.0],
        texcoord: [1.0, 1.0],
    },
];

impl QuadVertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            },
            wgpu::VertexAttribute {
                offset: 8,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };
}
