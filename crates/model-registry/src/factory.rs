//! Assemble a registry from configuration.

use std::path::Path;

use tracing::{debug, info};

use crate::config::{BackendKind, RegistryConfig};
use crate::error::{RegistryError, Result};
use crate::metadata::{DocumentStore, MetadataStore, SqliteMetadataStore};
use crate::registry::ModelRegistry;
use crate::storage::LocalStorage;

/// Build the registry `config` describes.
///
/// `local` pairs local artifacts with a JSON metadata document; `database`
/// pairs them with SQLite metadata and runs pending migrations. `s3` is
/// recognised but rejected.
pub async fn create_registry(config: &RegistryConfig) -> Result<ModelRegistry> {
    if config.backend == BackendKind::S3 {
        return Err(RegistryError::InvalidInput(
            "object storage backend is not implemented".into(),
        ));
    }

    let mut storage = LocalStorage::init(config.artifact_root.clone()).await?;
    let metadata: MetadataStore = match config.backend {
        BackendKind::Database => {
            SqliteMetadataStore::connect(config.database_path.clone(), config.max_connections)
                .await?
                .into()
        }
        _ => DocumentStore::open(config.metadata_path.clone()).await?.into(),
    };

    let reserved = match config.metadata_location() {
        Some(location) => file_in_root(&config.artifact_root, location).await,
        None => None,
    };
    if let Some(file_name) = reserved {
        debug!(file = %file_name, "metadata file name reserved in artifact root");
        storage = storage.reserve(file_name);
    }

    info!(
        backend = %config.backend,
        root = %config.artifact_root.display(),
        metadata = metadata.kind(),
        "model registry ready"
    );
    Ok(ModelRegistry::new(storage, metadata))
}

/// Name of `location` when it sits directly inside `root`.
async fn file_in_root(root: &Path, location: &Path) -> Option<String> {
    let parent = location.parent()?;
    let file_name = location.file_name()?.to_str()?.to_owned();
    let same = match (
        tokio::fs::canonicalize(root).await,
        tokio::fs::canonicalize(parent).await,
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => root == parent,
    };
    same.then_some(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn local_preset_uses_document_metadata() {
        let dir = TempDir::new().expect("tempdir");
        let config = RegistryConfig::local(dir.path().join("models"));
        let registry = create_registry(&config).await.expect("registry");

        assert_eq!(registry.metadata().kind(), "document");
        assert!(dir.path().join("models").is_dir());
        registry.save_model(&[1.0, 2.0], "m", "", [("k", "v")]).await.expect("save");
        assert!(dir.path().join("models/registry.json").is_file());
    }

    #[tokio::test]
    async fn database_preset_uses_sqlite_metadata() {
        let dir = TempDir::new().expect("tempdir");
        let config = RegistryConfig::database(dir.path());
        let registry = create_registry(&config).await.expect("registry");

        assert_eq!(registry.metadata().kind(), "sqlite");
        assert!(dir.path().join("registry.db").is_file());
        assert_eq!(registry.save_model(&"x", "m", "", [("k", "v")]).await.expect("save"), "1");
    }

    async fn assert_metadata_names_rejected(config: RegistryConfig, names: &[&str]) {
        let registry = create_registry(&config).await.expect("registry");
        registry.save_model(&1, "healthy", "", [("k", "v")]).await.expect("first save");

        for name in names {
            let err = registry.save_model(&0, name, "", [("k", "v")]).await.unwrap_err();
            assert!(matches!(err, RegistryError::InvalidInput(_)), "{name}: {err}");
            assert!(!config.artifact_root.join(name).is_dir(), "{name} left a directory");
        }

        let next = registry
            .save_model(&2, "healthy", "", [("k", "v")])
            .await
            .expect("registry still writable");
        assert_eq!(next, "2");
    }

    #[tokio::test]
    async fn document_file_names_cannot_be_model_names() {
        let dir = TempDir::new().expect("tempdir");
        assert_metadata_names_rejected(
            RegistryConfig::local(dir.path()),
            &["registry.json", "registry.json.tmp"],
        )
        .await;
    }

    #[tokio::test]
    async fn database_file_names_cannot_be_model_names() {
        let dir = TempDir::new().expect("tempdir");
        assert_metadata_names_rejected(
            RegistryConfig::database(dir.path()),
            &["registry.db", "registry.db-journal", "registry.db-wal", "registry.db-shm"],
        )
        .await;
    }

    #[tokio::test]
    async fn metadata_outside_root_reserves_nothing() {
        let dir = TempDir::new().expect("tempdir");
        let mut config = RegistryConfig::local(dir.path().join("artifacts"));
        config.metadata_path = dir.path().join("meta/registry.json");
        let registry = create_registry(&config).await.expect("registry");

        let version = registry
            .save_model(&1, "registry.json", "", [("k", "v")])
            .await
            .expect("save");
        assert_eq!(version, "1");
    }

    #[tokio::test]
    async fn object_storage_is_rejected() {
        let dir = TempDir::new().expect("tempdir");
        let config = RegistryConfig::rooted(BackendKind::S3, dir.path().join("never"));
        let err = create_registry(&config).await.unwrap_err();

        assert!(matches!(err, RegistryError::InvalidInput(_)), "unexpected error: {err}");
        assert!(!dir.path().join("never").exists());
    }
}
