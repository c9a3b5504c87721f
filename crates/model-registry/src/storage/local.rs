//! Local filesystem artifact backend.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::StorageBackend;
use crate::error::{RegistryError, Result};

/// Stores each artifact as a JSON file under `root`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    /// File names at the top of `root` owned by something else, usually
    /// the metadata backend. Artifacts may not start with any of them.
    reserved: Vec<String>,
}

impl LocalStorage {
    /// Create a backend rooted at `root` without touching the filesystem.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            reserved: Vec::new(),
        }
    }

    /// Create a backend and make sure its root directory exists.
    pub async fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let storage = Self::new(root);
        tokio::fs::create_dir_all(&storage.root)
            .await
            .map_err(|e| io_error(&storage.root, e))?;
        Ok(storage)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Keep artifacts away from `file_name` and its siblings
    /// (`file_name.tmp`, `file_name-journal`, ...) at the top of the root.
    pub fn reserve(mut self, file_name: impl Into<String>) -> Self {
        self.reserved.push(file_name.into());
        self
    }

    fn check_reserved(&self, relative_path: &str) -> Result<()> {
        let first = Path::new(relative_path)
            .components()
            .find_map(|c| match c {
                Component::Normal(name) => name.to_str(),
                _ => None,
            })
            .unwrap_or_default();
        match self.reserved.iter().find(|r| first.starts_with(r.as_str())) {
            Some(reserved) => Err(RegistryError::InvalidInput(format!(
                "artifact path {relative_path:?} collides with reserved file '{reserved}'"
            ))),
            None => Ok(()),
        }
    }

    /// Remove directories left empty below the root, innermost first.
    async fn prune_empty_parents(&self, path: &Path) {
        let mut dir = path.parent();
        while let Some(current) = dir {
            if current == self.root || !current.starts_with(&self.root) {
                break;
            }
            if tokio::fs::remove_dir(current).await.is_err() {
                // Not empty, or already gone.
                break;
            }
            debug!(path = %current.display(), "empty artifact directory removed");
            dir = current.parent();
        }
    }

    /// Resolve `relative_path` under the root, refusing anything that could
    /// escape it.
    fn resolve(&self, relative_path: &str) -> Result<PathBuf> {
        let relative = Path::new(relative_path);
        if relative_path.is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(RegistryError::InvalidInput(format!(
                "artifact path must stay inside the storage root: {relative_path:?}"
            )));
        }
        Ok(self.root.join(relative))
    }
}

fn io_error(path: &Path, e: std::io::Error) -> RegistryError {
    if e.kind() == ErrorKind::NotFound {
        RegistryError::NotFound(format!("artifact '{}' not found", path.display()))
    } else {
        RegistryError::Storage(format!("{}: {e}", path.display()))
    }
}

impl StorageBackend for LocalStorage {
    fn extension(&self) -> &'static str {
        "json"
    }

    async fn save<T>(&self, object: &T, relative_path: &str) -> Result<()>
    where
        T: Serialize + Sync,
    {
        let path = self.resolve(relative_path)?;
        self.check_reserved(relative_path)?;
        let bytes = serde_json::to_vec_pretty(object).map_err(|e| {
            RegistryError::Storage(format!("failed to serialize artifact {relative_path}: {e}"))
        })?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, e))?;
        }
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| io_error(&path, e))?;

        debug!(path = %path.display(), bytes = bytes.len(), "artifact written");
        Ok(())
    }

    async fn load<T>(&self, relative_path: &str) -> Result<T>
    where
        T: DeserializeOwned + Send,
    {
        let path = self.resolve(relative_path)?;
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| io_error(&path, e))?;
        serde_json::from_slice(&bytes).map_err(|e| {
            RegistryError::Storage(format!("corrupt artifact {}: {e}", path.display()))
        })
    }

    async fn delete(&self, relative_path: &str) -> Result<()> {
        let path = self.resolve(relative_path)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!(path = %path.display(), "artifact removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "artifact already absent")
            }
            Err(e) => return Err(io_error(&path, e)),
        }
        self.prune_empty_parents(&path).await;
        Ok(())
    }

    async fn exists(&self, relative_path: &str) -> Result<bool> {
        let path = self.resolve(relative_path)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| io_error(&path, e))
    }

    async fn size(&self, relative_path: &str) -> Result<u64> {
        let path = self.resolve(relative_path)?;
        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|e| io_error(&path, e))?;
        Ok(meta.len())
    }
}
