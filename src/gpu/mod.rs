//! wgpu rendering backend.
//!
//! [`GpuContext`] owns the surface, device and queue for a window.
//! [`GpuBackend`] adds the particle pipeline and, while a field is loaded,
//! its [`FieldResources`]: five per-instance vertex buffers, one per
//! particle attribute. Each particle is drawn as an instanced quad (six
//! vertices) that the vertex stage sizes and places.

pub mod camera;

use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::error::GpuError;
use crate::field::ParticleField;
use crate::render_loop::{FieldBackend, FrameInput};
use crate::shader::{Uniforms, FRAGMENT_ENTRY, SHADER_SOURCE, VERTEX_ENTRY};
use crate::viewport::Viewport;
use crate::visuals::VisualConfig;

pub use camera::Camera;

/// Surface, device and queue for one window.
pub struct GpuContext {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
}

impl GpuContext {
    /// Acquire a surface for `window` and a device that can present to it.
    pub async fn new(window: Arc<Window>, viewport: Viewport) -> Result<Self, GpuError> {
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

        let info = adapter.get_info();
        tracing::info!(adapter = %info.name, backend = ?info.backend, "GPU adapter selected");

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Vortex Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        // Prefer a non-sRGB target: the glow is tuned for blending in
        // display space.
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or(GpuError::NoAdapter)?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: viewport.width.max(1),
            height: viewport.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Surface size in pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Resize the surface. Zero-sized requests are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.reconfigure();
        }
    }

    /// Re-apply the current configuration, e.g. after the surface was lost.
    pub fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }
}

/// GPU mirrors of one particle field.
pub struct FieldResources {
    positions: wgpu::Buffer,
    colors: wgpu::Buffer,
    sizes: wgpu::Buffer,
    golden_indices: wgpu::Buffer,
    chromatic_phases: wgpu::Buffer,
    count: u32,
    released: bool,
}

impl FieldResources {
    /// Upload `field`; `None` for an empty field.
    pub fn new(device: &wgpu::Device, field: &ParticleField) -> Option<Self> {
        if field.is_empty() {
            return None;
        }
        let attrs = field.attributes();
        let buffer = |label: &str, contents: &[u8]| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: wgpu::BufferUsages::VERTEX,
            })
        };
        Some(Self {
            positions: buffer("Position Buffer", bytemuck::cast_slice(&attrs.positions)),
            colors: buffer("Color Buffer", bytemuck::cast_slice(&attrs.colors)),
            sizes: buffer("Size Buffer", bytemuck::cast_slice(&attrs.sizes)),
            golden_indices: buffer("Golden Index Buffer", bytemuck::cast_slice(&attrs.golden_indices)),
            chromatic_phases: buffer("Chromatic Phase Buffer", bytemuck::cast_slice(&attrs.chromatic_phases)),
            count: attrs.len() as u32,
            released: false,
        })
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Free the GPU memory now instead of at drop. Idempotent.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        for buffer in self.buffers() {
            buffer.destroy();
        }
        self.released = true;
    }

    fn buffers(&self) -> [&wgpu::Buffer; 5] {
        [
            &self.positions,
            &self.colors,
            &self.sizes,
            &self.golden_indices,
            &self.chromatic_phases,
        ]
    }
}

impl Drop for FieldResources {
    fn drop(&mut self) {
        self.release();
    }
}

fn instance_layout(attributes: &'static [wgpu::VertexAttribute], stride: u64) -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: stride,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes,
    }
}

const POSITION_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
const COLOR_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x3];
const SIZE_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float32];
const GOLDEN_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![3 => Float32];
const CHROMATIC_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![4 => Float32];

/// The wgpu implementation of [`FieldBackend`].
pub struct GpuBackend {
    ctx: GpuContext,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    field: Option<FieldResources>,
    clear_color: wgpu::Color,
}

impl GpuBackend {
    /// Build the particle pipeline on `ctx`.
    ///
    /// Shader validation errors are caught here and returned as
    /// [`GpuError::ShaderCompilation`].
    pub async fn new(ctx: GpuContext, visuals: &VisualConfig) -> Result<Self, GpuError> {
        let device = &ctx.device;

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Uniform Buffer"),
            size: std::mem::size_of::<Uniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Uniform Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Vortex Shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER_SOURCE.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Vortex Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            push_constant_ranges: &[],
        });

        let buffers = [
            instance_layout(&POSITION_ATTRS, 12),
            instance_layout(&COLOR_ATTRS, 12),
            instance_layout(&SIZE_ATTRS, 4),
            instance_layout(&GOLDEN_ATTRS, 4),
            instance_layout(&CHROMATIC_ATTRS, 4),
        ];

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Vortex Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some(VERTEX_ENTRY),
                buffers: &buffers,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some(FRAGMENT_ENTRY),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.config.format,
                    blend: Some(visuals.blend_mode.to_blend_state()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            // Additive particles neither write nor test depth.
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        if let Some(err) = device.pop_error_scope().await {
            tracing::error!(error = %err, "particle shader rejected");
            return Err(GpuError::ShaderCompilation(err.to_string()));
        }

        let clear_color = visuals.clear_color(ctx.config.format.is_srgb());
        tracing::debug!(format = ?ctx.config.format, "particle pipeline created");

        Ok(Self {
            ctx,
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            field: None,
            clear_color,
        })
    }

    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    /// Particles currently resident on the GPU.
    pub fn resident_count(&self) -> u32 {
        self.field.as_ref().map_or(0, FieldResources::count)
    }
}

impl FieldBackend for GpuBackend {
    type Error = GpuError;

    fn upload(&mut self, field: &ParticleField) -> Result<(), GpuError> {
        self.release();
        self.field = FieldResources::new(&self.ctx.device, field);
        tracing::debug!(count = self.resident_count(), "field uploaded");
        Ok(())
    }

    fn resize(&mut self, viewport: Viewport) {
        self.ctx.resize(viewport.width, viewport.height);
    }

    fn draw(&mut self, frame: &FrameInput<'_>) -> Result<(), GpuError> {
        let (width, height) = self.ctx.size();
        let uniforms = Uniforms::new(
            frame.view_proj,
            [width as f32, height as f32],
            frame.time,
            frame.constant.value_f32(),
            &frame.params,
        );
        self.ctx
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let output = match self.ctx.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!("surface lost or outdated, reconfiguring");
                self.ctx.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(GpuError::Surface(wgpu::SurfaceError::OutOfMemory));
            }
            Err(e) => {
                tracing::warn!(error = %e, "skipping frame");
                return Ok(());
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Vortex Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
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

            if let Some(field) = self.field.as_ref() {
                render_pass.set_pipeline(&self.pipeline);
                render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                for (slot, buffer) in field.buffers().into_iter().enumerate() {
                    render_pass.set_vertex_buffer(slot as u32, buffer.slice(..));
                }
                render_pass.draw(0..6, 0..field.count);
            }
        }

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    fn release(&mut self) {
        if let Some(mut field) = self.field.take() {
            field.release();
            tracing::debug!(count = field.count, "field released");
        }
    }
}

impl Drop for GpuBackend {
    fn drop(&mut self) {
        FieldBackend::release(self);
        self.uniform_buffer.destroy();
    }
}
