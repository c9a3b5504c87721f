//! Metadata persistence layer.
//!
//! [`MetadataBackend`] defines how model / version / tag records are stored.
//! Two implementations ship with the crate: [`DocumentStore`] (one JSON
//! file) and [`SqliteMetadataStore`] (three related tables). Both return the
//! records from [`crate::record`] so the registry never depends on which one
//! is in use. [`MetadataStore`] picks one at construction time.

mod document;
mod sqlite;

pub use document::DocumentStore;
pub use sqlite::SqliteMetadataStore;

use std::future::Future;

use crate::error::Result;
use crate::record::{ModelListing, ModelVersionRecord, NewModelVersion, RegistryStats, TagMatch};

/// Structured store for model, version and tag records.
pub trait MetadataBackend: Send + Sync + 'static {
    /// Label the next saved version of `model_name` should receive.
    ///
    /// `"1"` for an unknown model; otherwise one past both the highest label
    /// ever assigned and the highest label still present.
    fn next_version_label(&self, model_name: &str) -> impl Future<Output = Result<String>> + Send;

    /// Record a version and all of its tags atomically.
    ///
    /// Creates the model on first use. Fails with `Integrity` when the label
    /// is not above every label already assigned to the model.
    fn save_version(
        &self,
        version: NewModelVersion,
    ) -> impl Future<Output = Result<ModelVersionRecord>> + Send;

    fn list_models(&self) -> impl Future<Output = Result<ModelListing>> + Send;

    /// Versions of one model in numeric order; `NotFound` for unknown models.
    fn get_versions(
        &self,
        model_name: &str,
    ) -> impl Future<Output = Result<Vec<ModelVersionRecord>>> + Send;

    fn get_version(
        &self,
        model_name: &str,
        version: &str,
    ) -> impl Future<Output = Result<ModelVersionRecord>> + Send;

    fn get_latest_version_label(
        &self,
        model_name: &str,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Remove one version and its tags, returning what was removed.
    ///
    /// The model itself goes away with its last version.
    fn delete_version(
        &self,
        model_name: &str,
        version: &str,
    ) -> impl Future<Output = Result<ModelVersionRecord>> + Send;

    /// Remove a model with every version and tag, returning the removed
    /// versions.
    fn delete_model(
        &self,
        model_name: &str,
    ) -> impl Future<Output = Result<Vec<ModelVersionRecord>>> + Send;

    fn statistics(&self) -> impl Future<Output = Result<RegistryStats>> + Send;

    /// Versions carrying `tag_key`, optionally restricted to `tag_value`.
    fn find_by_tag(
        &self,
        tag_key: &str,
        tag_value: Option<&str>,
    ) -> impl Future<Output = Result<Vec<TagMatch>>> + Send;
}

/// Metadata backend selected by configuration.
#[derive(Debug, Clone)]
pub enum MetadataStore {
    Document(DocumentStore),
    Sqlite(SqliteMetadataStore),
}

impl MetadataStore {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Document(_) => "document",
            Self::Sqlite(_) => "sqlite",
        }
    }
}

impl From<DocumentStore> for MetadataStore {
    fn from(store: DocumentStore) -> Self {
        Self::Document(store)
    }
}

impl From<SqliteMetadataStore> for MetadataStore {
    fn from(store: SqliteMetadataStore) -> Self {
        Self::Sqlite(store)
    }
}

impl MetadataBackend for MetadataStore {
    async fn next_version_label(&self, model_name: &str) -> Result<String> {
        match self {
            Self::Document(s) => s.next_version_label(model_name).await,
            Self::Sqlite(s) => s.next_version_label(model_name).await,
        }
    }

    async fn save_version(&self, version: NewModelVersion) -> Result<ModelVersionRecord> {
        match self {
            Self::Document(s) => s.save_version(version).await,
            Self::Sqlite(s) => s.save_version(version).await,
        }
    }

    async fn list_models(&self) -> Result<ModelListing> {
        match self {
            Self::Document(s) => s.list_models().await,
            Self::Sqlite(s) => s.list_models().await,
        }
    }

    async fn get_versions(&self, model_name: &str) -> Result<Vec<ModelVersionRecord>> {
        match self {
            Self::Document(s) => s.get_versions(model_name).await,
            Self::Sqlite(s) => s.get_versions(model_name).await,
        }
    }

    async fn get_version(&self, model_name: &str, version: &str) -> Result<ModelVersionRecord> {
        match self {
            Self::Document(s) => s.get_version(model_name, version).await,
            Self::Sqlite(s) => s.get_version(model_name, version).await,
        }
    }

    async fn get_latest_version_label(&self, model_name: &str) -> Result<String> {
        match self {
            Self::Document(s) => s.get_latest_version_label(model_name).await,
            Self::Sqlite(s) => s.get_latest_version_label(model_name).await,
        }
    }

    async fn delete_version(&self, model_name: &str, version: &str) -> Result<ModelVersionRecord> {
        match self {
            Self::Document(s) => s.delete_version(model_name, version).await,
            Self::Sqlite(s) => s.delete_version(model_name, version).await,
        }
    }

    async fn delete_model(&self, model_name: &str) -> Result<Vec<ModelVersionRecord>> {
        match self {
            Self::Document(s) => s.delete_model(model_name).await,
            Self::Sqlite(s) => s.delete_model(model_name).await,
        }
    }

    async fn statistics(&self) -> Result<RegistryStats> {
        match self {
            Self::Document(s) => s.statistics().await,
            Self::Sqlite(s) => s.statistics().await,
        }
    }

    async fn find_by_tag(&self, tag_key: &str, tag_value: Option<&str>) -> Result<Vec<TagMatch>> {
        match self {
            Self::Document(s) => s.find_by_tag(tag_key, tag_value).await,
            Self::Sqlite(s) => s.find_by_tag(tag_key, tag_value).await,
        }
    }
}
