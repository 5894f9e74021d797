//! Global uniform bindings for camera and scene lighting
//!
//! Manages the uniform buffer and bind group for per-frame state shared by
//! every draw: the camera matrices, the ambient term, the point lights
//! gathered from the scene graph and the shadow light's projection. Bound to
//! slot 0 of the scene and shadow pipelines.

use cgmath::{Matrix4, Vector3, Vector4};

use crate::{
    gfx::{
        camera::CameraUniform,
        rendering::shadow::{ShadowCaster, ShadowMapSettings, ShadowUniform},
        scene::{LightKind, Scene},
    },
    wgpu_utils::UniformBuffer,
};

/// Number of point lights the shader evaluates
pub const MAX_POINT_LIGHTS: usize = 4;

/// Global uniform buffer content
///
/// MUST match the `Globals` struct in `scene.wgsl` exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUniform {
    view_proj: [[f32; 4]; 4],
    view_position: [f32; 4],
    /// Summed ambient colour × intensity
    ambient: [f32; 4],
    point_positions: [[f32; 4]; MAX_POINT_LIGHTS],
    /// Point light colour × intensity
    point_colors: [[f32; 4]; MAX_POINT_LIGHTS],
    light_count: [u32; 4],
    pub shadow: ShadowUniform,
}
// Total: 64 + 16 + 16 + 64 + 64 + 16 + 96 = 336 bytes

/// A point light resolved to world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLightData {
    pub position: [f32; 3],
    pub radiance: [f32; 3],
}

/// Lighting gathered from the scene for one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneLighting {
    pub ambient: [f32; 3],
    pub points: Vec<PointLightData>,
    /// First point light carrying shadow settings, if it made it into `points`
    pub shadow: Option<ShadowCaster>,
}

impl SceneLighting {
    /// Collects every light in the scene graph
    ///
    /// Ambient lights add up; point lights beyond [`MAX_POINT_LIGHTS`] are
    /// dropped in traversal order.
    pub fn gather(scene: &Scene) -> Self {
        let mut lighting = SceneLighting::default();
        scene.visit(|node, world, _| {
            let Some(light) = node.as_light() else {
                return;
            };
            let radiance = light.color.scaled(light.intensity);
            match light.kind {
                LightKind::Ambient => {
                    for (sum, value) in lighting.ambient.iter_mut().zip(radiance) {
                        *sum += value;
                    }
                }
                LightKind::Point { shadow } => {
                    if lighting.points.len() >= MAX_POINT_LIGHTS {
                        return;
                    }
                    let position = world_origin(world);
                    if let (Some(settings), None) = (shadow, &lighting.shadow) {
                        lighting.shadow = Some(ShadowCaster {
                            light_index: lighting.points.len(),
                            position: Vector3::from(position),
                            settings,
                        });
                    }
                    lighting.points.push(PointLightData { position, radiance });
                }
            }
        });
        lighting
    }

    pub fn to_uniform(
        &self,
        camera: &CameraUniform,
        shadow_map: &ShadowMapSettings,
    ) -> GlobalUniform {
        let mut point_positions = [[0.0; 4]; MAX_POINT_LIGHTS];
        let mut point_colors = [[0.0; 4]; MAX_POINT_LIGHTS];
        for (i, point) in self.points.iter().take(MAX_POINT_LIGHTS).enumerate() {
            let [x, y, z] = point.position;
            point_positions[i] = [x, y, z, 1.0];
            let [r, g, b] = point.radiance;
            point_colors[i] = [r, g, b, 1.0];
        }
        let [r, g, b] = self.ambient;

        GlobalUniform {
            view_proj: camera.view_proj,
            view_position: camera.view_position,
            ambient: [r, g, b, 1.0],
            point_positions,
            point_colors,
            light_count: [self.points.len().min(MAX_POINT_LIGHTS) as u32, 0, 0, 0],
            shadow: ShadowUniform::new(self.shadow.as_ref(), shadow_map),
        }
    }
}

fn world_origin(world: &Matrix4<f32>) -> [f32; 3] {
    let origin = world * Vector4::new(0.0, 0.0, 0.0, 1.0);
    [origin.x, origin.y, origin.z]
}

/// Type alias for the global uniform buffer
pub type GlobalUBO = UniformBuffer<GlobalUniform>;

/// Bind group layout and bind group for the global uniforms
pub struct GlobalBindings {
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device, ubo: &GlobalUBO) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Globals Bind Group Layout"),
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

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Global Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.binding_resource(),
            }],
        });

        GlobalBindings {
            bind_group_layout,
            bind_group,
        }
    }

    /// Used when creating render pipelines that need the global uniforms
    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}
