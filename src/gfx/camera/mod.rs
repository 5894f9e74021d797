pub mod camera_utils;
pub mod perspective_camera;

// Re-export main types
pub use camera_utils::{convert_matrix4_to_array, CameraUniform};
pub use perspective_camera::{build_camera, PerspectiveCamera};
