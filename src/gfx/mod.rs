//! # Graphics Module
//!
//! Everything needed to put the lamp scene on screen and to ask what is under
//! the pointer.
//!
//! ## Architecture Overview
//!
//! - **Camera** ([`camera`]) - fixed perspective camera that can be re-aimed
//! - **Picking** ([`picking`]) - rays, bounding boxes and scene raycasting
//! - **Rendering** ([`rendering`]) - forward wgpu pass behind the [`Renderer`] trait
//! - **Resources** ([`resources`]) - colours, materials and GPU uniforms
//! - **Scene** ([`scene`]) - the node tree with its lights and meshes
//!
//! ## Usage
//!
//! ```no_run
//! use atelier::gfx::{build_camera, scene::build_scene, Viewport};
//!
//! let scene = build_scene();
//! let camera = build_camera(&Viewport::new(1280, 720, 1.0));
//! // let renderer = RenderEngine::new(window, viewport).await?;
//! ```

pub mod camera;
pub mod picking;
pub mod rendering;
pub mod resources;
pub mod scene;
pub mod viewport;

// Re-export commonly used types
pub use camera::{build_camera, PerspectiveCamera};
pub use rendering::{RenderEngine, Renderer};
pub use viewport::Viewport;
