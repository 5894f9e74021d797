//! # Scene Management Module
//!
//! Scene graph for the Atelier renderer: an owned tree of [`SceneNode`]s
//! (groups, loaded models, meshes and lights), the [`Scene`] container that
//! holds the tree together with its materials and background colour, and the
//! [`build_scene`] constructor for the initial lighting setup.
//!
//! ## Key Components
//!
//! - [`Scene`] - top-level nodes, material storage and background colour
//! - [`SceneNode`] - a node with a [`NodeRole`] tag, local [`Transform`] and children
//! - [`Mesh`] - indexed triangles with a local bounding box and lazy GPU buffers
//! - [`Light`] - ambient and point lights, optionally shadow-casting
//! - [`Vertex3D`] - GPU vertex layout

pub mod builder;
pub mod light;
pub mod mesh;
pub mod node;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use builder::{build_scene, INITIAL_SHADOW_RADIUS, SHADOW_LIGHT_NAME, WARM_AMBER};
pub use light::{Light, LightKind, ShadowSettings};
pub use mesh::Mesh;
pub use node::{MeshNode, ModelInfo, NodeKind, NodeRole, SceneNode, Surface, Transform};
pub use scene::{NodePath, Scene, SceneStatistics};
pub use vertex::Vertex3D;
