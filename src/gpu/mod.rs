//! wgpu backend for drawing batched particle quads.
//!
//! [`GpuRenderer`] owns the surface, one render pipeline per [`BlendMode`]
//! and the uploaded sprite textures. Each frame is recorded through a
//! [`GpuFrame`], which implements [`Renderer`]: every batch gets its own
//! render pass, drawn in submission order on top of the previous one.
//!
//! ```ignore
//! let mut gpu = pollster::block_on(GpuRenderer::new(window.clone(), [0.0, 0.0, 0.0, 1.0]))?;
//! let texture = gpu.upload_texture(&TextureData::radial(Fallback::default())?);
//! sim.set_sprites(SpriteSet::uniform(Sprite::new(texture, 32.0, 32.0)));
//!
//! let mut frame = gpu.frame()?;
//! submit(&sim.build_frame(), &mut frame)?;
//! frame.finish();
//! ```

mod shader;

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use tracing::{debug, info};
use wgpu::util::DeviceExt;
use winit::window::Window;

pub use shader::QUAD_SHADER;

use crate::batch::{Batch, Vertex};
use crate::error::GpuError;
use crate::renderer::Renderer;
use crate::textures::{FilterMode, TextureData, TextureHandle};
use crate::visuals::BlendMode;

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2, 2 => Float32x4];

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct ScreenUniform {
    size: [f32; 2],
    _padding: [f32; 2],
}

/// Blend state for premultiplied colour.
fn blend_state(mode: BlendMode) -> wgpu::BlendState {
    match mode {
        BlendMode::Alpha => wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING,
        BlendMode::Additive => wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        },
        BlendMode::Multiply => wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::Dst,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::Zero,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        },
    }
}

/// A sprite texture living on the GPU.
struct GpuTexture {
    bind_group: wgpu::BindGroup,
    _texture: wgpu::Texture,
}

/// Vertex and index buffers for one submission slot, grown on demand.
struct QuadBuffers {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
}

impl QuadBuffers {
    fn new(device: &wgpu::Device, vertex_bytes: u64, index_bytes: u64) -> Self {
        Self {
            vertices: device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Quad Vertex Buffer"),
                size: vertex_bytes.next_power_of_two(),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }),
            indices: device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Quad Index Buffer"),
                size: index_bytes.next_power_of_two(),
                usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }),
        }
    }

    fn fits(&self, vertex_bytes: u64, index_bytes: u64) -> bool {
        self.vertices.size() >= vertex_bytes && self.indices.size() >= index_bytes
    }
}

/// Surface, pipelines and textures for drawing particle batches.
pub struct GpuRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pipelines: [wgpu::RenderPipeline; 3],
    screen_buffer: wgpu::Buffer,
    screen_bind_group: wgpu::BindGroup,
    texture_layout: wgpu::BindGroupLayout,
    linear_sampler: wgpu::Sampler,
    nearest_sampler: wgpu::Sampler,
    textures: Vec<GpuTexture>,
    buffers: Vec<QuadBuffers>,
    background: wgpu::Color,
}

impl GpuRenderer {
    /// Set up the surface and pipelines for `window`.
    ///
    /// `background` is the clear colour, RGBA in `[0, 1]`.
    pub async fn new(window: Arc<Window>, background: [f32; 4]) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let adapter_info = adapter.get_info();
        info!(
            name = %adapter_info.name,
            backend = ?adapter_info.backend,
            "using GPU adapter"
        );

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or(GpuError::NoAdapter)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let screen = ScreenUniform {
            size: [config.width as f32, config.height as f32],
            _padding: [0.0; 2],
        };
        let screen_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Screen Uniform Buffer"),
            contents: bytemuck::bytes_of(&screen),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let screen_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Screen Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let screen_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Screen Bind Group"),
            layout: &screen_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: screen_buffer.as_entire_binding(),
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Sprite Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = |label, filter| {
            device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some(label),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: filter,
                min_filter: filter,
                mipmap_filter: wgpu::FilterMode::Nearest,
                ..Default::default()
            })
        };
        let linear_sampler = sampler("Sprite Sampler (linear)", wgpu::FilterMode::Linear);
        let nearest_sampler = sampler("Sprite Sampler (nearest)", wgpu::FilterMode::Nearest);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Quad Shader"),
            source: wgpu::ShaderSource::Wgsl(QUAD_SHADER.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Quad Pipeline Layout"),
            bind_group_layouts: &[&screen_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let pipelines = BlendMode::ALL.map(|mode| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(match mode {
                    BlendMode::Alpha => "Quad Pipeline (alpha)",
                    BlendMode::Additive => "Quad Pipeline (additive)",
                    BlendMode::Multiply => "Quad Pipeline (multiply)",
                }),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &VERTEX_ATTRIBUTES,
                    }],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: config.format,
                        blend: Some(blend_state(mode)),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        });

        let [r, g, b, a] = background.map(f64::from);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipelines,
            screen_buffer,
            screen_bind_group,
            texture_layout,
            linear_sampler,
            nearest_sampler,
            textures: Vec::new(),
            buffers: Vec::new(),
            background: wgpu::Color { r, g, b, a },
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            let screen = ScreenUniform {
                size: [new_size.width as f32, new_size.height as f32],
                _padding: [0.0; 2],
            };
            self.queue.write_buffer(&self.screen_buffer, 0, bytemuck::bytes_of(&screen));
        }
    }

    /// Surface size in pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Upload a sprite texture. The returned handle is what batches refer to.
    pub fn upload_texture(&mut self, data: &TextureData) -> TextureHandle {
        let size = wgpu::Extent3d {
            width: data.width,
            height: data.height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Sprite Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &data.data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * data.width),
                rows_per_image: Some(data.height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = match data.filter {
            FilterMode::Linear => &self.linear_sampler,
            FilterMode::Nearest => &self.nearest_sampler,
        };
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Sprite Bind Group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        let handle = TextureHandle::new(self.textures.len() as u32);
        debug!(
            id = handle.id(),
            width = data.width,
            height = data.height,
            "uploaded sprite texture"
        );
        self.textures.push(GpuTexture {
            bind_group,
            _texture: texture,
        });
        handle
    }

    /// Begin recording a frame.
    ///
    /// A lost or outdated surface is reconfigured and acquired again once.
    pub fn frame(&mut self) -> Result<GpuFrame<'_>, GpuError> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                debug!("surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                self.surface.get_current_texture()?
            }
            Err(e) => return Err(e.into()),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        Ok(GpuFrame {
            renderer: self,
            output,
            view,
            encoder,
            submissions: 0,
        })
    }
}

/// One frame being recorded. Call [`finish`](Self::finish) to present it.
pub struct GpuFrame<'a> {
    renderer: &'a mut GpuRenderer,
    output: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
    submissions: usize,
}

impl GpuFrame<'_> {
    /// Clear on the first pass, draw over the previous passes afterwards.
    fn load_op(&self) -> wgpu::LoadOp<wgpu::Color> {
        if self.submissions == 0 {
            wgpu::LoadOp::Clear(self.renderer.background)
        } else {
            wgpu::LoadOp::Load
        }
    }

    /// Submit the recorded passes and present.
    pub fn finish(mut self) {
        if self.submissions == 0 {
            // Nothing drawn; still clear to the background.
            let load = self.load_op();
            let _pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }
        self.renderer
            .queue
            .submit(std::iter::once(self.encoder.finish()));
        self.output.present();
    }
}

impl Renderer for GpuFrame<'_> {
    type Error = GpuError;

    fn draw_batch(&mut self, batch: &Batch) -> Result<(), GpuError> {
        if batch.is_empty() {
            return Ok(());
        }

        let load = self.load_op();
        let renderer = &mut *self.renderer;
        let texture = renderer
            .textures
            .get(batch.key.texture.id() as usize)
            .ok_or(GpuError::UnknownTexture(batch.key.texture))?;

        let vertex_bytes: &[u8] = bytemuck::cast_slice(&batch.vertices);
        let index_bytes: &[u8] = bytemuck::cast_slice(&batch.indices);
        let (vertex_len, index_len) = (vertex_bytes.len() as u64, index_bytes.len() as u64);

        // Each submission in a frame needs its own buffers: queued writes land
        // before any pass of the frame executes.
        let slot = self.submissions;
        match renderer.buffers.get(slot).map(|b| b.fits(vertex_len, index_len)) {
            Some(true) => {}
            Some(false) => {
                debug!(slot, vertex_len, index_len, "growing quad buffers");
                renderer.buffers[slot] = QuadBuffers::new(&renderer.device, vertex_len, index_len);
            }
            None => {
                renderer
                    .buffers
                    .push(QuadBuffers::new(&renderer.device, vertex_len, index_len));
            }
        }
        let buffers = &renderer.buffers[slot];
        renderer.queue.write_buffer(&buffers.vertices, 0, vertex_bytes);
        renderer.queue.write_buffer(&buffers.indices, 0, index_bytes);

        {
            let mut pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Quad Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(&renderer.pipelines[batch.key.blend.index()]);
            pass.set_bind_group(0, &renderer.screen_bind_group, &[]);
            pass.set_bind_group(1, &texture.bind_group, &[]);
            pass.set_vertex_buffer(0, buffers.vertices.slice(..vertex_len));
            pass.set_index_buffer(buffers.indices.slice(..index_len), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..batch.indices.len() as u32, 0, 0..1);
        }

        self.submissions += 1;
        Ok(())
    }
}
