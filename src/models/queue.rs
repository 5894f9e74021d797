//! Hand-off of loaded models from the loader to the frame loop.
//!
//! The loader may run on another thread; the scene is only ever touched by
//! the thread that owns it, between frames, through [`SceneQueue::drain_into`].

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::gfx::{resources::Material, scene::{Scene, SceneNode}};

/// A pivot ready for insertion, with the materials its meshes reference
pub struct LoadedModel {
    pub pivot: SceneNode,
    pub materials: Vec<Material>,
}

/// Loader side of the queue
#[derive(Clone)]
pub struct ModelSender {
    sender: UnboundedSender<LoadedModel>,
}

impl ModelSender {
    /// Enqueues a model; returns `false` once the scene side has gone away
    pub fn send(&self, model: LoadedModel) -> bool {
        self.sender.unbounded_send(model).is_ok()
    }
}

/// Scene side of the queue
pub struct SceneQueue {
    receiver: UnboundedReceiver<LoadedModel>,
}

/// Creates a connected sender / queue pair
pub fn scene_queue() -> (ModelSender, SceneQueue) {
    let (sender, receiver) = mpsc::unbounded();
    (ModelSender { sender }, SceneQueue { receiver })
}

impl SceneQueue {
    /// Inserts every model received so far as a new top-level node
    ///
    /// Never blocks. Returns how many pivots were inserted.
    pub fn drain_into(&mut self, scene: &mut Scene) -> usize {
        let mut inserted = 0;
        while let Ok(Some(model)) = self.receiver.try_next() {
            log::debug!("Inserting {} into the scene", model.pivot.name);
            scene.add_materials(model.materials);
            scene.add(model.pivot);
            inserted += 1;
        }
        inserted
    }
}
