use serde::{Deserialize, Serialize};

/// Metadata document (`manifest.json`) that every skill package must carry.
///
/// Only `name` and `slug` are enforced by the archive validator; the remaining
/// fields default to empty when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub entry_point: String,
}

impl Manifest {
    /// Both identity fields are present and non-empty.
    pub fn has_identity(&self) -> bool {
        !self.name.is_empty() && !self.slug.is_empty()
    }
}
