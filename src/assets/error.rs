use std::path::PathBuf;

use thiserror::Error;

/// Failure to obtain raw data (manifest or asset) from the source
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{0} was not found")]
    NotFound(PathBuf),
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed manifest")]
    Json(#[from] serde_json::Error),
}

/// Failure to turn one asset into scene nodes
#[derive(Debug, Error)]
pub enum AssetLoadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("glTF decode failed")]
    Gltf(#[from] gltf::Error),
    #[error("OBJ decode failed")]
    Obj(#[from] tobj::LoadError),
    #[error("unsupported asset format: {0}")]
    UnsupportedFormat(String),
    #[error("{0} contains no scene")]
    Empty(String),
}

/// Error surfaced by the model loader
#[derive(Debug, Error)]
pub enum LoadError {
    /// The manifest could not be fetched; nothing was loaded
    #[error("could not fetch the model manifest")]
    Manifest(#[source] FetchError),
    /// One asset failed; the rest of the batch carries on
    #[error("could not load model {path}")]
    Asset {
        path: String,
        #[source]
        source: AssetLoadError,
    },
}

/// Formats an error followed by its chain of causes, `outer: inner: root`
pub fn describe(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut cause = err.source();
    while let Some(inner) = cause {
        text.push_str(": ");
        text.push_str(&inner.to_string());
        cause = inner.source();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_asset_error_keeps_its_cause() {
        let err = LoadError::Asset {
            path: "models/lampe.glb".to_string(),
            source: AssetLoadError::UnsupportedFormat("fbx".to_string()),
        };
        assert_eq!(err.to_string(), "could not load model models/lampe.glb");
        assert_eq!(
            err.source().map(|e| e.to_string()),
            Some("unsupported asset format: fbx".to_string())
        );
        assert_eq!(
            describe(&err),
            "could not load model models/lampe.glb: unsupported asset format: fbx"
        );
    }
}
