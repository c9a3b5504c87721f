//! Metadata records shared by every metadata backend.
//!
//! Both the document and the relational backend produce exactly these
//! shapes, so callers never see which one is configured.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every model with its versions, ordered by name then numeric version.
pub type ModelListing = BTreeMap<String, Vec<ModelVersionRecord>>;

/// One immutable version of a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVersionRecord {
    pub name: String,
    /// Integer-valued label, assigned by the registry.
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    /// Artifact location relative to the storage root.
    pub storage_path: String,
    #[serde(default)]
    pub file_size: u64,
}

/// A version about to be recorded by a metadata backend.
#[derive(Debug, Clone)]
pub struct NewModelVersion {
    pub name: String,
    pub version: String,
    pub description: String,
    pub storage_path: String,
    pub file_size: u64,
    pub created_at: DateTime<Utc>,
    /// Tags in caller order; a repeated key keeps its last value.
    pub tags: Vec<(String, String)>,
}

impl NewModelVersion {
    /// The record this version becomes once stored.
    pub fn into_record(self) -> ModelVersionRecord {
        ModelVersionRecord {
            name: self.name,
            version: self.version,
            description: self.description,
            tags: self.tags.into_iter().collect(),
            created_at: self.created_at,
            storage_path: self.storage_path,
            file_size: self.file_size,
        }
    }
}

/// A version carrying the searched-for tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagMatch {
    pub name: String,
    pub version: String,
    pub description: String,
    pub tag_key: String,
    pub tag_value: String,
    pub created_at: DateTime<Utc>,
}

/// Registry-wide totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub total_models: u64,
    pub total_versions: u64,
    pub total_size_bytes: u64,
    pub total_size_mb: f64,
}

/// Per-model totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStats {
    pub version_count: u64,
    pub total_size_bytes: u64,
    pub total_size_mb: f64,
    pub latest_version: String,
    pub latest_created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub summary: StatsSummary,
    pub models: BTreeMap<String, ModelStats>,
}

impl RegistryStats {
    /// Aggregate statistics from a full listing.
    pub fn from_listing(listing: &ModelListing) -> Self {
        let mut stats = Self::default();
        for (name, versions) in listing {
            let total_size_bytes: u64 = versions.iter().map(|v| v.file_size).sum();
            let latest_version = versions
                .iter()
                .map(|v| version_number(&v.version))
                .max()
                .unwrap_or(0);
            stats.models.insert(
                name.clone(),
                ModelStats {
                    version_count: versions.len() as u64,
                    total_size_bytes,
                    total_size_mb: bytes_to_mb(total_size_bytes),
                    latest_version: latest_version.to_string(),
                    latest_created_at: versions.iter().map(|v| v.created_at).max(),
                },
            );
            stats.summary.total_models += 1;
            stats.summary.total_versions += versions.len() as u64;
            stats.summary.total_size_bytes += total_size_bytes;
        }
        stats.summary.total_size_mb = bytes_to_mb(stats.summary.total_size_bytes);
        stats
    }
}

/// Numeric value of a version label. Labels are always written by the
/// registry as integers; anything else sorts first.
pub fn version_number(label: &str) -> u64 {
    label.trim().parse().unwrap_or(0)
}

/// Sort versions numerically, so "10" follows "9".
pub fn sort_versions(versions: &mut [ModelVersionRecord]) {
    versions.sort_by_key(|v| version_number(&v.version));
}

/// The numerically greatest version, if any.
pub fn latest_version(versions: &[ModelVersionRecord]) -> Option<&ModelVersionRecord> {
    versions.iter().max_by_key(|v| version_number(&v.version))
}

/// Label following both the persisted counter and every existing label.
pub fn next_version_label<'a>(
    counter: u64,
    existing: impl IntoIterator<Item = &'a str>,
) -> String {
    let max_existing = existing.into_iter().map(version_number).max().unwrap_or(0);
    (counter.max(max_existing) + 1).to_string()
}

pub(crate) fn bytes_to_mb(bytes: u64) -> f64 {
    (bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
}
