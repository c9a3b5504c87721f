//! Artifact storage abstraction.
//!
//! [`StorageBackend`] defines how a serialized model object is written to,
//! read from and removed from a path relative to the backend's root. The
//! default implementation is [`LocalStorage`]. To store artifacts somewhere
//! else (object storage, ...), implement [`StorageBackend`] for the new type
//! and hand it to [`crate::ModelRegistry::new`].
//!
//! All trait methods use `impl Future` in their signatures so no extra
//! `async-trait` crate is required.

mod local;

pub use local::LocalStorage;

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Artifact I/O over a rooted namespace of relative paths.
pub trait StorageBackend: Send + Sync + 'static {
    /// File extension of the artifacts this backend writes, without the dot.
    fn extension(&self) -> &'static str;

    /// Serialize `object` to `relative_path`, creating parent directories.
    fn save<T>(&self, object: &T, relative_path: &str) -> impl Future<Output = Result<()>> + Send
    where
        T: Serialize + Sync;

    /// Deserialize the artifact at `relative_path`.
    ///
    /// Fails with `NotFound` when nothing is stored there and `Storage` when
    /// the content cannot be decoded.
    fn load<T>(&self, relative_path: &str) -> impl Future<Output = Result<T>> + Send
    where
        T: DeserializeOwned + Send;

    /// Remove the artifact and any directory below the root it leaves
    /// empty. Removing an absent artifact succeeds.
    fn delete(&self, relative_path: &str) -> impl Future<Output = Result<()>> + Send;

    fn exists(&self, relative_path: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Size of the stored artifact in bytes.
    fn size(&self, relative_path: &str) -> impl Future<Output = Result<u64>> + Send;
}

/// Deterministic artifact location for a model version.
pub fn artifact_path(name: &str, version: &str, extension: &str) -> String {
    format!("{name}/v{version}/model.{extension}")
}
