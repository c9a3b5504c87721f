//! Model registry orchestration.
//!
//! [`ModelRegistry`] is the only component with business rules: it assigns
//! version labels, derives artifact paths, and keeps the artifact and
//! metadata sides in step. All persistence is delegated to one
//! [`StorageBackend`] and one [`MetadataBackend`].

use chrono::{SubsecRound, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{RegistryError, Result};
use crate::metadata::{MetadataBackend, MetadataStore};
use crate::record::{ModelListing, ModelVersionRecord, NewModelVersion, RegistryStats, TagMatch};
use crate::storage::{artifact_path, LocalStorage, StorageBackend};

/// Versioned store of serialized model objects.
#[derive(Debug, Clone)]
pub struct ModelRegistry<S = LocalStorage, M = MetadataStore> {
    storage: S,
    metadata: M,
}

/// Reject names that are empty or could leave the model's artifact directory.
fn validate_model_name(name: &str) -> Result<()> {
    let bad = name.trim().is_empty()
        || name == "."
        || name == ".."
        || name.chars().any(|c| c == '/' || c == '\\' || c.is_control());
    if bad {
        return Err(RegistryError::InvalidInput(format!(
            "invalid model name {name:?}"
        )));
    }
    Ok(())
}

impl<S, M> ModelRegistry<S, M>
where
    S: StorageBackend,
    M: MetadataBackend,
{
    pub fn new(storage: S, metadata: M) -> Self {
        Self { storage, metadata }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn metadata(&self) -> &M {
        &self.metadata
    }

    /// Store `object` as the next version of `name` and return its label.
    ///
    /// The artifact is written first; if that fails nothing is recorded. If
    /// recording the metadata fails afterwards, the freshly written artifact
    /// and any directory it left empty are removed on a best-effort basis,
    /// and the metadata error is returned.
    pub async fn save_model<T, I, K, V>(
        &self,
        object: &T,
        name: &str,
        description: &str,
        tags: I,
    ) -> Result<String>
    where
        T: Serialize + Sync,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        validate_model_name(name)?;
        let tags: Vec<(String, String)> = tags
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let version = self.metadata.next_version_label(name).await?;
        let storage_path = artifact_path(name, &version, self.storage.extension());

        self.storage.save(object, &storage_path).await?;
        let file_size = self.storage.size(&storage_path).await?;

        let new_version = NewModelVersion {
            name: name.to_owned(),
            version: version.clone(),
            description: description.to_owned(),
            storage_path: storage_path.clone(),
            file_size,
            created_at: Utc::now().trunc_subsecs(6),
            tags,
        };

        if let Err(e) = self.metadata.save_version(new_version).await {
            if let Err(cleanup) = self.storage.delete(&storage_path).await {
                warn!(
                    model = name,
                    path = %storage_path,
                    error = %cleanup,
                    "failed to remove orphan artifact after metadata error"
                );
            }
            return Err(e);
        }

        info!(model = name, version = %version, bytes = file_size, "model version saved");
        Ok(version)
    }

    /// Load a version of `name`; the latest one when `version` is `None`.
    pub async fn load_model<T>(&self, name: &str, version: Option<&str>) -> Result<T>
    where
        T: DeserializeOwned + Send,
    {
        let record = self.model_info(name, version).await?;
        let object = self.storage.load(&record.storage_path).await?;
        debug!(model = name, version = %record.version, "model loaded");
        Ok(object)
    }

    /// Metadata of a version of `name` without touching its artifact.
    pub async fn model_info(&self, name: &str, version: Option<&str>) -> Result<ModelVersionRecord> {
        match version {
            Some(version) => self.metadata.get_version(name, version).await,
            None => {
                let latest = self.metadata.get_latest_version_label(name).await?;
                self.metadata.get_version(name, &latest).await
            }
        }
    }

    /// Delete one version, or the whole model with every version when
    /// `version` is `None`. Returns the removed versions.
    pub async fn delete_model(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> Result<Vec<ModelVersionRecord>> {
        let removed = match version {
            Some(version) => vec![self.metadata.delete_version(name, version).await?],
            None => self.metadata.delete_model(name).await?,
        };

        for record in &removed {
            self.storage.delete(&record.storage_path).await?;
        }

        info!(
            model = name,
            versions = removed.len(),
            whole_model = version.is_none(),
            "model versions deleted"
        );
        Ok(removed)
    }

    /// Every model with every version, ordered by name then version.
    pub async fn list_models(&self) -> Result<ModelListing> {
        self.metadata.list_models().await
    }

    pub async fn get_model_versions(&self, name: &str) -> Result<Vec<ModelVersionRecord>> {
        self.metadata.get_versions(name).await
    }

    pub async fn get_latest_version(&self, name: &str) -> Result<String> {
        self.metadata.get_latest_version_label(name).await
    }

    pub async fn statistics(&self) -> Result<RegistryStats> {
        self.metadata.statistics().await
    }

    pub async fn find_models_by_tag(
        &self,
        tag_key: &str,
        tag_value: Option<&str>,
    ) -> Result<Vec<TagMatch>> {
        self.metadata.find_by_tag(tag_key, tag_value).await
    }
}
