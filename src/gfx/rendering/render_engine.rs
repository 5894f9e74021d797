use std::{iter, sync::Arc};

use wgpu::{DepthStencilState, RenderPipeline};

use super::shadow::{ShadowMap, ShadowMapSettings};
use crate::{
    gfx::{
        camera::{convert_matrix4_to_array, PerspectiveCamera},
        resources::{
            global_bindings::{GlobalBindings, GlobalUBO, SceneLighting},
            MaterialUniform, TextureResource,
        },
        scene::{Mesh, Scene, ShadowSettings, Vertex3D},
        viewport::Viewport,
    },
    wgpu_utils::{align_to, UniformBuffer},
};

/// Anything that can draw the scene from a camera onto a sized surface
///
/// The animation loop only talks to this trait, so the scene logic can be
/// driven headless in tests.
pub trait Renderer {
    /// Draws one frame
    fn render(
        &mut self,
        scene: &mut Scene,
        camera: &PerspectiveCamera,
    ) -> Result<(), wgpu::SurfaceError>;

    /// Matches the drawing surface to a new size and pixel ratio
    fn resize(&mut self, viewport: Viewport);
}

/// Per-draw uniform content
///
/// MUST match the `Draw` struct in `scene.wgsl` exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawUniform {
    pub model: [[f32; 4]; 4],
    pub material: MaterialUniform,
    /// x: casts a shadow, y: receives shadows
    pub shadow: [u32; 4],
}
// Total: 64 + 32 + 16 = 112 bytes

impl DrawUniform {
    pub fn casts_shadow(&self) -> bool {
        self.shadow[0] != 0
    }

    pub fn receives_shadow(&self) -> bool {
        self.shadow[1] != 0
    }
}

/// One surface ready to be drawn
pub struct DrawCommand<'a> {
    pub mesh: &'a Mesh,
    pub uniform: DrawUniform,
}

/// Flattens the scene into draw commands, one per mesh surface
pub fn collect_draws(scene: &Scene) -> Vec<DrawCommand<'_>> {
    let mut draws = Vec::new();
    scene.visit(|node, world, _| {
        let Some(mesh_node) = node.as_mesh() else {
            return;
        };
        for surface in &mesh_node.surfaces {
            let material = scene
                .material_manager
                .get_material_for_object(surface.material.as_deref());
            draws.push(DrawCommand {
                mesh: &surface.mesh,
                uniform: DrawUniform {
                    model: convert_matrix4_to_array(*world),
                    material: material.uniform(),
                    shadow: [
                        mesh_node.cast_shadow as u32,
                        mesh_node.receive_shadow as u32,
                        0,
                        0,
                    ],
                },
            });
        }
    });
    draws
}

/// Indices of the draws that go into the shadow map
pub fn shadow_casters<'a>(draws: &'a [DrawCommand<'_>]) -> impl Iterator<Item = usize> + 'a {
    draws
        .iter()
        .enumerate()
        .filter(|(_, draw)| draw.uniform.casts_shadow())
        .map(|(i, _)| i)
}

const DRAW_UNIFORM_SIZE: u64 = std::mem::size_of::<DrawUniform>() as u64;

/// Growable uniform buffer addressed with dynamic offsets, one slot per draw
struct DrawBuffer {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    stride: u64,
    capacity: usize,
}

impl DrawBuffer {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        stride: u64,
        capacity: usize,
    ) -> Self {
        let capacity = capacity.max(1);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw Uniform Buffer"),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Draw Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(DRAW_UNIFORM_SIZE),
                }),
            }],
        });

        Self {
            buffer,
            bind_group,
            stride,
            capacity,
        }
    }
}

/// Forward renderer drawing the scene graph into a window surface
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,

    pipeline: RenderPipeline,
    shadow_pipeline: RenderPipeline,

    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,
    draw_layout: wgpu::BindGroupLayout,
    draws: DrawBuffer,

    shadow_map: ShadowMap,
    shadow_settings: ShadowMapSettings,
    pixel_ratio: f64,
}

impl RenderEngine {
    /// Creates the renderer for a window
    ///
    /// Shadow mapping is enabled with soft PCF filtering.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        viewport: Viewport,
    ) -> anyhow::Result<RenderEngine> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 4096,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("surface reports no supported formats"))?;
        let alpha_mode = surface_capabilities
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: viewport.width.max(1),
            height: viewport.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, "depth_texture");

        // GLOBAL UNIFORMS - CAMERA AND LIGHTS

        let global_ubo: GlobalUBO = UniformBuffer::new(&device, "Globals");
        let global_bindings = GlobalBindings::new(&device, &global_ubo);

        let draw_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Draw Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(DRAW_UNIFORM_SIZE),
                },
                count: None,
            }],
        });
        let stride = align_to(
            DRAW_UNIFORM_SIZE,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );
        let draws = DrawBuffer::new(&device, &draw_layout, stride, 64);

        let shadow_settings = ShadowMapSettings::default();
        let shadow_map = ShadowMap::new(&device, ShadowSettings::default().map_size);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("scene.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[
                global_bindings.bind_group_layout(),
                &draw_layout,
                shadow_map.bind_group_layout(),
            ],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Scene Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex3D::desc()],
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
                unclipped_depth: false,
            },
            depth_stencil: Some(DepthStencilState {
                format: TextureResource::DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            multiview: None,
            cache: None,
        });

        // Depth only, no culling so thin geometry still casts
        let shadow_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Shadow Pipeline Layout"),
                bind_group_layouts: &[global_bindings.bind_group_layout(), &draw_layout],
                push_constant_ranges: &[],
            });
        let shadow_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Shadow Pipeline"),
            layout: Some(&shadow_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_shadow"),
                buffers: &[Vertex3D::desc()],
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(DepthStencilState {
                format: TextureResource::DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState {
                    constant: 2,
                    slope_scale: 2.0,
                    clamp: 0.0,
                },
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: None,
            multiview: None,
            cache: None,
        });

        log::debug!(
            "Render engine ready: {}x{} {:?}, shadows {:?}",
            config.width,
            config.height,
            format,
            shadow_settings
        );

        Ok(RenderEngine {
            surface,
            device: device.into(),
            queue: queue.into(),
            config,
            depth_texture,
            pipeline,
            shadow_pipeline,
            global_ubo,
            global_bindings,
            draw_layout,
            draws,
            shadow_map,
            shadow_settings,
            pixel_ratio: viewport.scale_factor,
        })
    }

    /// Grows the draw buffer so it can hold `count` draws
    fn reserve_draws(&mut self, count: usize) {
        if count <= self.draws.capacity {
            return;
        }
        let capacity = count.next_power_of_two();
        log::debug!("Growing draw buffer to {} slots", capacity);
        self.draws = DrawBuffer::new(&self.device, &self.draw_layout, self.draws.stride, capacity);
    }

    pub fn shadow_settings(&self) -> ShadowMapSettings {
        self.shadow_settings
    }

    /// Device pixel ratio of the surface, as last reported by a resize
    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }
}

impl Renderer for RenderEngine {
    fn render(
        &mut self,
        scene: &mut Scene,
        camera: &PerspectiveCamera,
    ) -> Result<(), wgpu::SurfaceError> {
        scene.init_gpu_resources(&self.device);

        let lighting = SceneLighting::gather(scene);
        let globals = lighting.to_uniform(&camera.uniform(), &self.shadow_settings);
        self.global_ubo.update_content(&self.queue, globals);
        if let Some(caster) = &lighting.shadow {
            self.shadow_map
                .ensure_size(&self.device, caster.settings.map_size);
        }

        let draws = collect_draws(scene);
        self.reserve_draws(draws.len());
        let stride = self.draws.stride as usize;
        let mut staging = vec![0u8; stride * draws.len()];
        for (i, draw) in draws.iter().enumerate() {
            let offset = i * stride;
            staging[offset..offset + DRAW_UNIFORM_SIZE as usize]
                .copy_from_slice(bytemuck::bytes_of(&draw.uniform));
        }
        if !staging.is_empty() {
            self.queue.write_buffer(&self.draws.buffer, 0, &staging);
        }

        let surface_texture = self.surface.get_current_texture()?;
        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.shadow_map.view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if globals.shadow.is_enabled() {
                shadow_pass.set_pipeline(&self.shadow_pipeline);
                shadow_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);
                for i in shadow_casters(&draws) {
                    let draw = &draws[i];
                    let Some(buffers) = draw.mesh.gpu_buffers() else {
                        continue;
                    };
                    let offset = (i * stride) as wgpu::DynamicOffset;
                    shadow_pass.set_bind_group(1, &self.draws.bind_group, &[offset]);
                    shadow_pass.set_vertex_buffer(0, buffers.vertex_buffer.slice(..));
                    shadow_pass.set_index_buffer(
                        buffers.index_buffer.slice(..),
                        wgpu::IndexFormat::Uint32,
                    );
                    shadow_pass.draw_indexed(0..draw.mesh.index_count(), 0, 0..1);
                }
            }
        }

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(scene.background.into()),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);
            render_pass.set_bind_group(2, self.shadow_map.bind_group(), &[]);

            for (i, draw) in draws.iter().enumerate() {
                let Some(buffers) = draw.mesh.gpu_buffers() else {
                    continue;
                };
                let offset = (i * stride) as wgpu::DynamicOffset;
                render_pass.set_bind_group(1, &self.draws.bind_group, &[offset]);
                render_pass.set_vertex_buffer(0, buffers.vertex_buffer.slice(..));
                render_pass
                    .set_index_buffer(buffers.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..draw.mesh.index_count(), 0, 0..1);
            }
        }

        self.queue.submit(iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    /// Reconfigures the surface; zero sizes are ignored
    fn resize(&mut self, viewport: Viewport) {
        self.pixel_ratio = viewport.scale_factor;
        if viewport.is_empty() {
            return;
        }

        self.config.width = viewport.width;
        self.config.height = viewport.height;
        self.surface.configure(&self.device, &self.config);

        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
    }
}
