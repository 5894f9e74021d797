//! # Assets
//!
//! The model manifest and everything needed to turn the files it names into
//! scene nodes. [`AssetSource`] is the seam the loader fetches through;
//! [`FsAssetSource`] serves a directory on disk and decodes glTF/GLB and OBJ.

pub mod error;
pub mod gltf_loader;
pub mod manifest;
pub mod obj_loader;
pub mod source;

pub use error::{AssetLoadError, FetchError, LoadError};
pub use manifest::{Manifest, ManifestEntry, ModelRole};
pub use source::{AssetSource, FsAssetSource};

use crate::gfx::{resources::Material, scene::SceneNode};

/// A decoded asset: its root node plus the materials its surfaces reference
pub struct LoadedAsset {
    pub root: SceneNode,
    pub materials: Vec<Material>,
}

/// Asset name used for the root node and material namespace: the file stem
pub fn asset_name(path: &str) -> String {
    std::path::Path::new(path)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(path)
        .to_string()
}
