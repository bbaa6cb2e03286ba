use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use super::Manifest;

/// Outcome of the content scan recorded on a skill row
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    #[default]
    Pending,
    Clean,
    Flagged,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Pending => "pending",
            ScanStatus::Clean => "clean",
            ScanStatus::Flagged => "flagged",
        }
    }
}

impl Display for ScanStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ScanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ScanStatus::Pending),
            "clean" => Ok(ScanStatus::Clean),
            "flagged" => Ok(ScanStatus::Flagged),
            other => Err(format!("unknown scan status: {}", other)),
        }
    }
}

/// Durable record of an admitted skill package
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub id: i64,
    pub author_id: i64,
    pub name: String,
    pub slug: String,
    pub version: String,
    pub description: String,
    pub category: String,
    pub tags: Vec<String>,
    pub entry_point: String,
    pub file_path: String,
    pub file_size: i64,
    pub sha256: String,
    pub scan_status: ScanStatus,
    pub downloads: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Skill {
    /// Filename offered to clients downloading the package.
    pub fn download_filename(&self) -> String {
        format!("{}-{}.zip", self.slug, self.version)
    }
}

/// Insert payload for a skill that passed every admission stage
#[derive(Debug, Clone)]
pub struct NewSkill {
    pub author_id: i64,
    pub name: String,
    pub slug: String,
    pub version: String,
    pub description: String,
    pub category: String,
    pub tags: Vec<String>,
    pub entry_point: String,
    pub file_path: String,
    pub file_size: i64,
    pub sha256: String,
    pub scan_status: ScanStatus,
}

impl NewSkill {
    pub fn from_manifest(
        author_id: i64,
        manifest: Manifest,
        file_path: String,
        file_size: i64,
        sha256: String,
        scan_status: ScanStatus,
    ) -> Self {
        Self {
            author_id,
            name: manifest.name,
            slug: manifest.slug,
            version: manifest.version,
            description: manifest.description,
            category: manifest.category,
            tags: manifest.tags,
            entry_point: manifest.entry_point,
            file_path,
            file_size,
            sha256,
            scan_status,
        }
    }
}
