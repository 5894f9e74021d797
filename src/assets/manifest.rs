//! Model manifest: which assets to load and where to put them.

use serde::Deserialize;

use super::error::FetchError;

/// Role a manifest entry may force onto a whole model
///
/// Other node roles (lamp parts, pivots, the shadow light) come from authored
/// names or are assigned by the scene itself, so the manifest rejects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelRole {
    /// Keeps the model still even when its asset name would make it spin
    Plain,
    /// Spins continuously on its pivot
    Rotating,
    /// Every mesh of the model receives shadows instead of casting them
    Ground,
}

/// One asset to load
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ManifestEntry {
    pub path: String,
    pub position: [f32; 3],
    /// Overrides the role derived from the asset name
    #[serde(default)]
    pub role: Option<ModelRole>,
}

/// Parsed `models.json`
///
/// Both lists are optional in the file and default to empty.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub objects: Vec<ManifestEntry>,
    #[serde(default)]
    pub letters: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn from_json(text: &str) -> Result<Self, FetchError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Every entry paired with its letter flag, objects first
    pub fn entries(&self) -> impl Iterator<Item = (&ManifestEntry, bool)> {
        self.objects
            .iter()
            .map(|entry| (entry, false))
            .chain(self.letters.iter().map(|entry| (entry, true)))
    }

    pub fn len(&self) -> usize {
        self.objects.len() + self.letters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
