use std::path::{Path, PathBuf};

use futures::future::BoxFuture;

use super::{
    error::{AssetLoadError, FetchError},
    gltf_loader, obj_loader, LoadedAsset, Manifest,
};

/// Where the manifest and the model files come from
///
/// Implementations must be shareable with the loader thread.
pub trait AssetSource: Send + Sync {
    /// Fetches and parses the model manifest
    fn fetch_manifest(&self) -> BoxFuture<'_, Result<Manifest, FetchError>>;

    /// Fetches and decodes one asset named by a manifest path
    fn load_asset<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<LoadedAsset, AssetLoadError>>;
}

/// Reads the manifest and assets from a directory on disk
#[derive(Debug, Clone)]
pub struct FsAssetSource {
    root: PathBuf,
    manifest: String,
}

impl FsAssetSource {
    pub fn new(root: impl Into<PathBuf>, manifest: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            manifest: manifest.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a manifest path against the asset root; leading slashes are ignored
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches(['/', '\\']))
    }

    fn read_manifest(&self) -> Result<Manifest, FetchError> {
        let path = self.resolve(&self.manifest);
        let text = std::fs::read_to_string(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                FetchError::NotFound(path.clone())
            } else {
                FetchError::Io {
                    path: path.clone(),
                    source,
                }
            }
        })?;
        Manifest::from_json(&text)
    }

    fn decode(&self, path: &str) -> Result<LoadedAsset, AssetLoadError> {
        let full_path = self.resolve(path);
        if !full_path.is_file() {
            return Err(FetchError::NotFound(full_path).into());
        }

        let name = super::asset_name(path);
        let extension = full_path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "gltf" | "glb" => gltf_loader::load_gltf(&full_path, &name, path),
            "obj" => obj_loader::load_obj(&full_path, &name, path),
            other => Err(AssetLoadError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl AssetSource for FsAssetSource {
    fn fetch_manifest(&self) -> BoxFuture<'_, Result<Manifest, FetchError>> {
        Box::pin(async move { self.read_manifest() })
    }

    fn load_asset<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<LoadedAsset, AssetLoadError>> {
        Box::pin(async move { self.decode(path) })
    }
}
