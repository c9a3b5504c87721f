//! Flat-file document metadata backend.
//!
//! The whole registry lives in one JSON document that is read, modified and
//! written back by every operation. There is no locking: with two writers
//! the last one wins.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::MetadataBackend;
use crate::error::{RegistryError, Result};
use crate::record::{
    latest_version, next_version_label, sort_versions, version_number, ModelListing,
    ModelVersionRecord, NewModelVersion, RegistryStats, TagMatch,
};

/// On-disk layout of the document.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    /// Model name to its versions, oldest first.
    #[serde(default)]
    models: ModelListing,
    /// Highest label ever assigned per model.
    #[serde(default)]
    last_versions: BTreeMap<String, u64>,
}

impl Document {
    fn versions(&self, model_name: &str) -> Result<&Vec<ModelVersionRecord>> {
        self.models
            .get(model_name)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| RegistryError::model_not_found(model_name))
    }
}

/// Metadata backend persisting everything in a single JSON file.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    path: PathBuf,
}

impl DocumentStore {
    /// Use the document at `path`, creating its parent directory. The file
    /// itself is created on first write.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| operational(parent, e))?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Document> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                RegistryError::Operational(format!(
                    "metadata document {} is unreadable: {e}",
                    self.path.display()
                ))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Document::default()),
            Err(e) => Err(operational(&self.path, e)),
        }
    }

    async fn write(&self, doc: &Document) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(doc)
            .map_err(|e| RegistryError::Operational(format!("failed to encode metadata: {e}")))?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| operational(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| operational(&self.path, e))?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "metadata document written");
        Ok(())
    }
}

fn operational(path: &Path, e: std::io::Error) -> RegistryError {
    RegistryError::Operational(format!("{}: {e}", path.display()))
}

impl MetadataBackend for DocumentStore {
    async fn next_version_label(&self, model_name: &str) -> Result<String> {
        let doc = self.read().await?;
        let counter = doc.last_versions.get(model_name).copied().unwrap_or(0);
        let existing = doc.models.get(model_name).into_iter().flatten();
        Ok(next_version_label(counter, existing.map(|v| v.version.as_str())))
    }

    async fn save_version(&self, version: NewModelVersion) -> Result<ModelVersionRecord> {
        let mut doc = self.read().await?;
        let number = version_number(&version.version);
        let assigned = doc
            .models
            .get(&version.name)
            .into_iter()
            .flatten()
            .map(|v| version_number(&v.version))
            .chain(doc.last_versions.get(&version.name).copied())
            .max()
            .unwrap_or(0);
        if number == 0 || number <= assigned {
            return Err(RegistryError::Integrity(format!(
                "version '{}' of model '{}' was already assigned",
                version.version, version.name
            )));
        }

        let record = version.into_record();
        let versions = doc.models.entry(record.name.clone()).or_default();
        versions.push(record.clone());
        sort_versions(versions);
        doc.last_versions.insert(record.name.clone(), number);

        self.write(&doc).await?;
        Ok(record)
    }

    async fn list_models(&self) -> Result<ModelListing> {
        let mut doc = self.read().await?;
        doc.models.retain(|_, versions| !versions.is_empty());
        for versions in doc.models.values_mut() {
            sort_versions(versions);
        }
        Ok(doc.models)
    }

    async fn get_versions(&self, model_name: &str) -> Result<Vec<ModelVersionRecord>> {
        let doc = self.read().await?;
        let mut versions = doc.versions(model_name)?.clone();
        sort_versions(&mut versions);
        Ok(versions)
    }

    async fn get_version(&self, model_name: &str, version: &str) -> Result<ModelVersionRecord> {
        let doc = self.read().await?;
        doc.versions(model_name)?
            .iter()
            .find(|v| v.version == version)
            .cloned()
            .ok_or_else(|| RegistryError::version_not_found(model_name, version))
    }

    async fn get_latest_version_label(&self, model_name: &str) -> Result<String> {
        let doc = self.read().await?;
        latest_version(doc.versions(model_name)?)
            .map(|v| v.version.clone())
            .ok_or_else(|| RegistryError::model_not_found(model_name))
    }

    async fn delete_version(&self, model_name: &str, version: &str) -> Result<ModelVersionRecord> {
        let mut doc = self.read().await?;
        doc.versions(model_name)?;
        let versions = doc
            .models
            .get_mut(model_name)
            .ok_or_else(|| RegistryError::model_not_found(model_name))?;
        let idx = versions
            .iter()
            .position(|v| v.version == version)
            .ok_or_else(|| RegistryError::version_not_found(model_name, version))?;
        let removed = versions.remove(idx);

        if versions.is_empty() {
            doc.models.remove(model_name);
            doc.last_versions.remove(model_name);
        }
        self.write(&doc).await?;
        Ok(removed)
    }

    async fn delete_model(&self, model_name: &str) -> Result<Vec<ModelVersionRecord>> {
        let mut doc = self.read().await?;
        doc.versions(model_name)?;
        let removed = doc.models.remove(model_name).unwrap_or_default();
        doc.last_versions.remove(model_name);
        self.write(&doc).await?;
        Ok(removed)
    }

    async fn statistics(&self) -> Result<RegistryStats> {
        let listing = self.list_models().await?;
        Ok(RegistryStats::from_listing(&listing))
    }

    async fn find_by_tag(&self, tag_key: &str, tag_value: Option<&str>) -> Result<Vec<TagMatch>> {
        let listing = self.list_models().await?;
        let matches = listing
            .values()
            .flatten()
            .filter_map(|v| {
                let value = v.tags.get(tag_key)?;
                if tag_value.is_some_and(|wanted| wanted != value) {
                    return None;
                }
                Some(TagMatch {
                    name: v.name.clone(),
                    version: v.version.clone(),
                    description: v.description.clone(),
                    tag_key: tag_key.to_owned(),
                    tag_value: value.clone(),
                    created_at: v.created_at,
                })
            })
            .collect();
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn new_version(name: &str, version: &str, tags: &[(&str, &str)]) -> NewModelVersion {
        NewModelVersion {
            name: name.into(),
            version: version.into(),
            description: format!("{name} v{version}"),
            storage_path: format!("{name}/v{version}/model.json"),
            file_size: 42,
            created_at: Utc::now(),
            tags: tags
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
        }
    }

    async fn store(dir: &TempDir) -> DocumentStore {
        DocumentStore::open(dir.path().join("meta/registry.json"))
            .await
            .expect("open")
    }

    #[tokio::test]
    async fn empty_document_lists_nothing() {
        let dir = TempDir::new().expect("tempdir");
        let store = store(&dir).await;
        assert!(store.list_models().await.expect("list").is_empty());
        assert_eq!(store.next_version_label("m").await.expect("next"), "1");
        assert!(store.get_versions("m").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn layout_groups_versions_under_model_name() {
        let dir = TempDir::new().expect("tempdir");
        let store = store(&dir).await;
        store
            .save_version(new_version("m", "1", &[("type", "function")]))
            .await
            .expect("save");

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(store.path()).expect("read")).expect("json");
        let entry = &raw["models"]["m"][0];
        for field in ["name", "version", "description", "tags", "created_at", "storage_path", "file_size"] {
            assert!(entry.get(field).is_some(), "missing field {field}");
        }
        assert_eq!(entry["tags"]["type"], "function");
        assert_eq!(raw["last_versions"]["m"], 1);
    }

    #[tokio::test]
    async fn reused_label_is_an_integrity_error() {
        let dir = TempDir::new().expect("tempdir");
        let store = store(&dir).await;
        store.save_version(new_version("m", "1", &[])).await.expect("save");
        let err = store.save_version(new_version("m", "1", &[])).await.unwrap_err();
        assert!(matches!(err, RegistryError::Integrity(_)), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn deleting_latest_does_not_resurrect_its_label() {
        let dir = TempDir::new().expect("tempdir");
        let store = store(&dir).await;
        store.save_version(new_version("m", "1", &[])).await.expect("v1");
        store.save_version(new_version("m", "2", &[])).await.expect("v2");
        store.delete_version("m", "2").await.expect("delete");

        assert_eq!(store.next_version_label("m").await.expect("next"), "3");
        assert_eq!(store.get_latest_version_label("m").await.expect("latest"), "1");
    }

    #[tokio::test]
    async fn deleting_last_version_removes_model() {
        let dir = TempDir::new().expect("tempdir");
        let store = store(&dir).await;
        store.save_version(new_version("m", "1", &[])).await.expect("v1");
        store.delete_version("m", "1").await.expect("delete");

        assert!(store.list_models().await.expect("list").is_empty());
        let err = store.get_version("m", "1").await.unwrap_err();
        assert_eq!(err.to_string(), "Model 'm' not found");
    }

    #[tokio::test]
    async fn find_by_tag_filters_on_value() {
        let dir = TempDir::new().expect("tempdir");
        let store = store(&dir).await;
        store
            .save_version(new_version("a", "1", &[("type", "regression")]))
            .await
            .expect("a");
        store
            .save_version(new_version("b", "1", &[("type", "classifier")]))
            .await
            .expect("b");

        assert_eq!(store.find_by_tag("type", None).await.expect("any").len(), 2);
        let hits = store.find_by_tag("type", Some("classifier")).await.expect("one");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "b");
        assert!(store.find_by_tag("owner", None).await.expect("none").is_empty());
    }

    #[tokio::test]
    async fn unreadable_document_is_operational() {
        let dir = TempDir::new().expect("tempdir");
        let store = store(&dir).await;
        std::fs::write(store.path(), b"[1, 2").expect("write");
        let err = store.list_models().await.unwrap_err();
        assert!(matches!(err, RegistryError::Operational(_)), "unexpected error: {err}");
    }
}
