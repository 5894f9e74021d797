//! # Interaction
//!
//! Everything that reacts to time or input: the [`AnimationLoop`], pointer
//! hover/click handling and the lamp-driven lighting theme.

pub mod animation;
pub mod lighting;
pub mod pointer;

pub use animation::{rotate_pivots, AnimationLoop};
pub use lighting::{handle_lamp_click, toggle_theme, update_bulb_material, LightingState};
pub use pointer::{on_pointer_click, on_pointer_move, on_resize, pick, CanvasBounds};
