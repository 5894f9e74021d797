// src/lib.rs
//! Atelier
//!
//! An interactive 3D scene built on wgpu and winit. Models named by a JSON
//! manifest load in the background and appear on pivots as they arrive, a
//! steaming centrepiece spins, and clicking the lamp switches the whole scene
//! between its day and night lighting.

pub mod app;
pub mod assets;
pub mod cli;
pub mod config;
pub mod gfx;
pub mod interaction;
pub mod models;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::AtelierApp;
pub use config::AppConfig;
