use std::sync::Arc;

use tessera_core::{Cell, Options};
use tessera_font::{Font, FontPack, MAPPING_BYTES, MAPPING_SIDE};

use crate::mapping::CellStore;
use crate::shaders::{COMPUTE_SHADER, DRAW_SHADER};
use crate::state::GridState;
use crate::vertex::{ComputeParams, DrawParams, QuadVertex, QUAD_VERTICES};
use crate::{AtlasTextures, CharRenderer, FrameTargets, RenderError};

const OUTPUT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

impl CharRenderer {
    /// Build the pipelines and upload every atlas in `fonts`. The pack's
    /// CPU-side atlas buffers are released afterwards.
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        format: wgpu::TextureFormat,
        fonts: &mut FontPack,
        options: &Options,
    ) -> Result<Self, RenderError> {
        // --- Uniform buffers ---
        let compute_params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("compute_params"),
            size: std::mem::size_of::<ComputeParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let draw_params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("draw_params"),
            size: std::mem::size_of::<DrawParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // --- Static quad ---
        let quad_vb = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("quad_vb"),
            size: std::mem::size_of_val(&QUAD_VERTICES) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&quad_vb, 0, bytemuck::cast_slice(&QUAD_VERTICES));

        // --- Compute pipeline ---
        let compute_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("compute_bgl"),
                entries: &[
                    uniform_entry(0, wgpu::ShaderStages::COMPUTE),
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::StorageTexture {
                            access: wgpu::StorageTextureAccess::WriteOnly,
                            format: OUTPUT_FORMAT,
                            view_dimension: wgpu::TextureViewDimension::D2,
                        },
                        count: None,
                    },
                    atlas_entry(2),
                    mapping_entry(3),
                    atlas_entry(4),
                    mapping_entry(5),
                    wgpu::BindGroupLayoutEntry {
                        binding: 6,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: true },
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                ],
            });

        let compute_shader = create_shader(&device, "compute", COMPUTE_SHADER)?;
        let compute_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("compute_pipeline_layout"),
                bind_group_layouts: &[&compute_bind_group_layout],
                push_constant_ranges: &[],
            });
        let compute_pipeline = validated(&device, "compute link", || {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("compute_pipeline"),
                layout: Some(&compute_pipeline_layout),
                module: &compute_shader,
                entry_point: Some("cs_main"),
                compilation_options: Default::default(),
                cache: None,
            })
        })?;

        // --- Draw pipeline ---
        let draw_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("draw_bgl"),
                entries: &[
                    uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: false },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                ],
            });

        let draw_shader = create_shader(&device, "draw", DRAW_SHADER)?;
        let draw_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("draw_pipeline_layout"),
                bind_group_layouts: &[&draw_bind_group_layout],
                push_constant_ranges: &[],
            });
        let draw_pipeline = validated(&device, "draw link", || {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("draw_pipeline"),
                layout: Some(&draw_pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &draw_shader,
                    entry_point: Some("vs_main"),
                    buffers: &[QuadVertex::LAYOUT],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &draw_shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleStrip,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        })?;

        // --- Atlases ---
        let atlas = upload_atlases(&device, &queue, "atlas", &fonts.styles());
        let (dw_atlas, has_double_width) = match fonts.double_width() {
            Some(dw) => (upload_atlases(&device, &queue, "dw_atlas", &[dw]), true),
            None => (placeholder_atlas(&device), false),
        };
        log::info!(
            "Uploaded atlases: {}x{} glyphs of {}x{}, double width {}",
            fonts.regular().nx(),
            fonts.regular().ny(),
            fonts.px(),
            fonts.py(),
            if has_double_width { "on" } else { "off" }
        );

        let state = GridState::new(fonts.px(), fonts.py(), options.border, options.show_wraps);
        let ul_metrics = fonts.ul_metrics();
        fonts.release_fonts();

        let [r, g, b] = options.bg.to_f64();
        Ok(Self {
            compute_pipeline,
            compute_bind_group_layout,
            draw_pipeline,
            draw_bind_group_layout,
            compute_params_buffer,
            draw_params_buffer,
            quad_vb,
            last_params: None,
            atlas,
            dw_atlas,
            has_double_width,
            ul_metrics,
            targets: None,
            cells: CellStore::new(),
            state,
            clear_color: wgpu::Color { r, g, b, a: 1.0 },
            device,
            queue,
        })
    }

    /// Output image, cell buffer and the bind groups referencing them, sized
    /// for the current grid.
    pub(crate) fn create_frame_targets(&self) -> FrameTargets {
        let (width, height) = self.state.image_size();
        let output = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("output_image"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OUTPUT_FORMAT,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let output_view = output.create_view(&wgpu::TextureViewDescriptor::default());

        let cell_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("cell_buffer"),
            size: (self.state.cell_count() * std::mem::size_of::<Cell>()) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let compute_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("compute_bg"),
            layout: &self.compute_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.compute_params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&output_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&self.atlas.atlas_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&self.atlas.mapping_view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(&self.dw_atlas.atlas_view),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::TextureView(&self.dw_atlas.mapping_view),
                },
                wgpu::BindGroupEntry {
                    binding: 6,
                    resource: cell_buffer.as_entire_binding(),
                },
            ],
        });

        let draw_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("draw_bg"),
            layout: &self.draw_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.draw_params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&output_view),
                },
            ],
        });

        FrameTargets {
            output,
            cell_buffer,
            compute_bind_group,
            draw_bind_group,
        }
    }
}

// ──────────────────────────────────────────────
// Shader validation
// ──────────────────────────────────────────────

/// Run `create` inside a validation error scope and turn any error it raised
/// into `RenderError::Shader`.
fn validated<T>(
    device: &wgpu::Device,
    stage: &'static str,
    create: impl FnOnce() -> T,
) -> Result<T, RenderError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = create();
    match pollster::block_on(device.pop_error_scope()) {
        None => Ok(value),
        Some(err) => {
            let log = err.to_string();
            log::error!("Error in {stage} shader:\n{log}");
            Err(RenderError::Shader { stage, log })
        }
    }
}

fn create_shader(
    device: &wgpu::Device,
    stage: &'static str,
    source: &str,
) -> Result<wgpu::ShaderModule, RenderError> {
    validated(device, stage, || {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(stage),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        })
    })
}

// ──────────────────────────────────────────────
// Bind group layout entries
// ──────────────────────────────────────────────

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn atlas_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
            view_dimension: wgpu::TextureViewDimension::D2Array,
            multisampled: false,
        },
        count: None,
    }
}

fn mapping_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Uint,
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

// ──────────────────────────────────────────────
// Atlas upload
// ──────────────────────────────────────────────

/// One texture array layer per font, all sharing the first font's geometry,
/// plus the first font's mapping image. Overlay fonts share the regular
/// font's map, so one mapping serves every layer.
fn upload_atlases(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    fonts: &[&Font],
) -> AtlasTextures {
    let geometry = fonts[0].geometry();
    let size = wgpu::Extent3d {
        width: geometry.pixel_width(),
        height: geometry.pixel_height(),
        depth_or_array_layers: fonts.len() as u32,
    };
    let atlas = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::R8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    for (layer, font) in fonts.iter().enumerate() {
        if font.atlas().len() != geometry.byte_len() {
            log::warn!(
                "Skipping {} atlas layer {layer}: {} bytes, expected {}",
                label,
                font.atlas().len(),
                geometry.byte_len()
            );
            continue;
        }
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &atlas,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: 0,
                    y: 0,
                    z: layer as u32,
                },
                aspect: wgpu::TextureAspect::All,
            },
            font.atlas(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(size.width),
                rows_per_image: Some(size.height),
            },
            wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
        );
    }
    let atlas_view = array_view(&atlas);

    let mapping = mapping_texture(device, label);
    let image = fonts[0].atlas_mapping();
    debug_assert_eq!(image.len(), MAPPING_BYTES);
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &mapping,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &image,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(2 * MAPPING_SIDE),
            rows_per_image: Some(MAPPING_SIDE),
        },
        wgpu::Extent3d {
            width: MAPPING_SIDE,
            height: MAPPING_SIDE,
            depth_or_array_layers: 1,
        },
    );
    let mapping_view = mapping.create_view(&wgpu::TextureViewDescriptor::default());

    AtlasTextures {
        atlas,
        atlas_view,
        mapping,
        mapping_view,
    }
}

/// Bound in place of the double-width atlas when the pack has none.
fn placeholder_atlas(device: &wgpu::Device) -> AtlasTextures {
    let atlas = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("dw_atlas_placeholder"),
        size: wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::R8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let atlas_view = array_view(&atlas);

    let mapping = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("dw_mapping_placeholder"),
        size: wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rg8Uint,
        usage: wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let mapping_view = mapping.create_view(&wgpu::TextureViewDescriptor::default());

    AtlasTextures {
        atlas,
        atlas_view,
        mapping,
        mapping_view,
    }
}

fn mapping_texture(device: &wgpu::Device, label: &str) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(&format!("{label}_mapping")),
        size: wgpu::Extent3d {
            width: MAPPING_SIDE,
            height: MAPPING_SIDE,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rg8Uint,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    })
}

/// Array view even for single-layer textures, matching `texture_2d_array`.
fn array_view(texture: &wgpu::Texture) -> wgpu::TextureView {
    texture.create_view(&wgpu::TextureViewDescriptor {
        dimension: Some(wgpu::TextureViewDimension::D2Array),
        ..Default::default()
    })
}
