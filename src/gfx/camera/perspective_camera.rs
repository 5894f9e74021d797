use super::camera_utils::CameraUniform;
use crate::gfx::viewport::Viewport;
use cgmath::*;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Vertical field of view of the scene camera, in degrees
pub const FIELD_OF_VIEW_DEG: f32 = 55.0;

/// Fixed-position camera that can be re-aimed at any point
///
/// Projection math follows the OpenGL convention (NDC depth in `-1..=1`), so
/// [`PerspectiveCamera::unproject`] takes the same coordinates a pointer
/// handler produces. The wgpu depth remap is only applied when building the
/// GPU uniform.
#[derive(Debug, Clone, Copy)]
pub struct PerspectiveCamera {
    pub eye: Vector3<f32>,
    pub target: Vector3<f32>,
    pub up: Vector3<f32>,
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl PerspectiveCamera {
    pub fn new(fovy: impl Into<Rad<f32>>, aspect: f32, znear: f32, zfar: f32) -> Self {
        Self {
            eye: Vector3::zero(),
            target: -Vector3::unit_z(),
            up: Vector3::unit_y(),
            aspect,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn set_position(&mut self, eye: Vector3<f32>) {
        self.eye = eye;
    }

    /// Aims the camera at a world-space point
    pub fn look_at(&mut self, target: Vector3<f32>) {
        self.target = target;
    }

    pub fn world_position(&self) -> Vector3<f32> {
        self.eye
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    /// Updates the aspect ratio for a new surface size; zero sizes are ignored
    pub fn resize_projection(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.set_aspect(width as f32 / height as f32);
        }
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(
            Point3::from_vec(self.eye),
            Point3::from_vec(self.target),
            self.up,
        )
    }

    /// OpenGL-convention projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }

    /// Maps a normalized device coordinate back into world space
    ///
    /// Falls back to the eye position when the view-projection matrix is
    /// singular.
    pub fn unproject(&self, ndc: Vector3<f32>) -> Vector3<f32> {
        let Some(inverse) = (self.projection_matrix() * self.view_matrix()).invert() else {
            return self.eye;
        };
        let world = inverse * ndc.extend(1.0);
        if world.w.abs() <= f32::EPSILON {
            return self.eye;
        }
        world.truncate() / world.w
    }

    /// View-projection matrix with wgpu's `0..=1` depth range
    pub fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * self.projection_matrix() * self.view_matrix()
    }

    pub fn uniform(&self) -> CameraUniform {
        CameraUniform::new(self.eye, self.build_view_projection_matrix())
    }
}

/// Builds the scene camera: 55° field of view, near 0.1, far 100, placed at
/// `(0, 0, 1.1)` and looking at the origin
pub fn build_camera(viewport: &Viewport) -> PerspectiveCamera {
    let mut camera = PerspectiveCamera::new(Deg(FIELD_OF_VIEW_DEG), viewport.aspect(), 0.1, 100.0);
    camera.set_position(Vector3::new(0.0, 0.0, 1.1));
    camera.look_at(Vector3::zero());
    camera
}
