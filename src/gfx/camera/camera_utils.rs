use cgmath::{Matrix4, SquareMatrix, Vector3};

/// Camera data as laid out in the global uniform block
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug, PartialEq)]
pub struct CameraUniform {
    /// Eye position; `w` is padding so the block stays 16-byte aligned
    pub view_position: [f32; 4],
    /// wgpu-ready view-projection matrix
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new(eye: Vector3<f32>, view_proj: Matrix4<f32>) -> Self {
        Self {
            view_position: eye.extend(1.0).into(),
            view_proj: convert_matrix4_to_array(view_proj),
        }
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new(Vector3::new(0.0, 0.0, 0.0), Matrix4::identity())
    }
}

pub fn convert_matrix4_to_array(matrix4: Matrix4<f32>) -> [[f32; 4]; 4] {
    matrix4.into()
}
