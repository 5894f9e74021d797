//! Shadow mapping for the shadow-casting point light
//!
//! One depth map is rendered from the light towards the scene origin. Meshes
//! flagged `cast_shadow` are drawn into it; meshes flagged `receive_shadow`
//! sample it with a PCF kernel whose width follows the light's shadow radius.

use cgmath::{Deg, InnerSpace, Matrix4, Point3, Vector3};

use crate::gfx::{
    camera::{convert_matrix4_to_array, perspective_camera::OPENGL_TO_WGPU_MATRIX},
    resources::TextureResource,
    scene::ShadowSettings,
};

/// Field of view of the light's shadow camera
pub const SHADOW_FOV_DEG: f32 = 120.0;
pub const SHADOW_NEAR: f32 = 0.05;
pub const SHADOW_FAR: f32 = 50.0;

/// Shadow map filtering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowFilter {
    /// Single depth comparison
    Basic,
    /// 3×3 comparison kernel
    Pcf,
    /// 5×5 comparison kernel
    PcfSoft,
}

impl ShadowFilter {
    /// Kernel half-width in taps
    pub fn kernel_radius(self) -> u32 {
        match self {
            ShadowFilter::Basic => 0,
            ShadowFilter::Pcf => 1,
            ShadowFilter::PcfSoft => 2,
        }
    }
}

/// Renderer-wide shadow configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowMapSettings {
    pub enabled: bool,
    pub filter: ShadowFilter,
}

impl Default for ShadowMapSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            filter: ShadowFilter::PcfSoft,
        }
    }
}

/// The shadow-casting light resolved for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowCaster {
    /// Index of the light among the point lights sent to the shader
    pub light_index: usize,
    /// World-space light position
    pub position: Vector3<f32>,
    pub settings: ShadowSettings,
}

impl ShadowCaster {
    /// wgpu-ready view-projection of the light looking at the scene origin
    pub fn view_projection(&self) -> Matrix4<f32> {
        let target = Vector3::new(0.0, 0.0, 0.0);
        let direction = (target - self.position).normalize();
        let up = if direction.y.abs() > 0.99 {
            Vector3::unit_z()
        } else {
            Vector3::unit_y()
        };
        let view = Matrix4::look_at_rh(
            Point3::new(self.position.x, self.position.y, self.position.z),
            Point3::new(target.x, target.y, target.z),
            up,
        );
        let projection = cgmath::perspective(Deg(SHADOW_FOV_DEG), 1.0, SHADOW_NEAR, SHADOW_FAR);
        OPENGL_TO_WGPU_MATRIX * projection * view
    }
}

/// Shadow block of the global uniform
///
/// MUST match the `Shadow` struct in `scene.wgsl` exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShadowUniform {
    pub view_proj: [[f32; 4]; 4],
    /// x: enabled, y: kernel half-width in taps, z: blur radius in texels, w: texel size
    pub params: [f32; 4],
    /// x: index of the shadowed point light
    pub light: [u32; 4],
}
// Total: 64 + 16 + 16 = 96 bytes

impl ShadowUniform {
    pub fn new(caster: Option<&ShadowCaster>, settings: &ShadowMapSettings) -> Self {
        let Some(caster) = caster.filter(|_| settings.enabled) else {
            return Self::disabled();
        };
        let map_size = caster.settings.map_size.max(1) as f32;
        Self {
            view_proj: convert_matrix4_to_array(caster.view_projection()),
            params: [
                1.0,
                settings.filter.kernel_radius() as f32,
                caster.settings.radius.max(0.0),
                1.0 / map_size,
            ],
            light: [caster.light_index as u32, 0, 0, 0],
        }
    }

    pub fn disabled() -> Self {
        Self {
            view_proj: convert_matrix4_to_array(Matrix4::from_scale(1.0)),
            params: [0.0; 4],
            light: [0; 4],
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.params[0] > 0.5
    }
}

/// Depth map the shadow light renders into, with its comparison sampler
pub struct ShadowMap {
    depth: TextureResource,
    sampler: wgpu::Sampler,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    size: u32,
}

impl ShadowMap {
    pub fn new(device: &wgpu::Device, size: u32) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shadow Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Depth,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        let size = size.max(1);
        let depth = TextureResource::create_shadow_map(device, size);
        let bind_group = Self::create_bind_group(device, &bind_group_layout, &depth, &sampler);

        Self {
            depth,
            sampler,
            bind_group_layout,
            bind_group,
            size,
        }
    }

    fn create_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        depth: &TextureResource,
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shadow Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&depth.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    /// Recreates the depth map when the light asks for another resolution
    pub fn ensure_size(&mut self, device: &wgpu::Device, size: u32) {
        let size = size.max(1);
        if size == self.size {
            return;
        }
        log::debug!("Resizing shadow map to {}x{}", size, size);
        self.depth = TextureResource::create_shadow_map(device, size);
        self.bind_group =
            Self::create_bind_group(device, &self.bind_group_layout, &self.depth, &self.sampler);
        self.size = size;
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.depth.view
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}
