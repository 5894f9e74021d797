// src/gfx/rendering/mod.rs
//! Core rendering functionality
//!
//! Shadow and forward passes over the scene graph plus the [`Renderer`] seam
//! the animation loop draws through.

pub mod render_engine;
pub mod shadow;

// Re-export main types
pub use render_engine::{
    collect_draws, shadow_casters, DrawCommand, DrawUniform, RenderEngine, Renderer,
};
pub use shadow::{ShadowCaster, ShadowFilter, ShadowMapSettings, ShadowUniform};
