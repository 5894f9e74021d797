pub mod color;
pub mod global_bindings;
pub mod material;
pub mod texture_resource;

pub use color::Color;
pub use global_bindings::{GlobalBindings, GlobalUniform, SceneLighting, MAX_POINT_LIGHTS};
pub use material::{Material, MaterialId, MaterialManager, MaterialUniform};
pub use texture_resource::TextureResource;
