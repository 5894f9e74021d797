//! # Models
//!
//! Asynchronous model loading: [`ModelLoader`] turns manifest entries into
//! pivots and hands them to the frame loop through a [`SceneQueue`].

pub mod loader;
pub mod queue;

pub use loader::{prepare_model, slot_material_id, LoadReport, ModelLoader};
pub use queue::{scene_queue, LoadedModel, ModelSender, SceneQueue};
