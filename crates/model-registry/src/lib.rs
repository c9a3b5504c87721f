//! Versioned registry for serialized model objects.
//!
//! A [`ModelRegistry`] combines a [`StorageBackend`] holding artifact bytes
//! with a [`MetadataBackend`] holding model, version and tag records.
//! Versions are labelled `"1"`, `"2"`, ... per model name.
//!
//! ```rust,ignore
//! let registry = model_registry::create_registry(&RegistryConfig::local("./models")).await?;
//! let version = registry.save_model(&weights, "linear_model", "baseline", [("type", "regression")]).await?;
//! let latest: Weights = registry.load_model("linear_model", None).await?;
//! ```

pub mod config;
pub mod error;
pub mod metadata;
pub mod record;
pub mod storage;

mod factory;
mod registry;

pub use config::{BackendKind, RegistryConfig};
pub use error::{RegistryError, Result};
pub use factory::create_registry;
pub use metadata::{DocumentStore, MetadataBackend, MetadataStore, SqliteMetadataStore};
pub use record::{
    ModelListing, ModelStats, ModelVersionRecord, NewModelVersion, RegistryStats, StatsSummary,
    TagMatch,
};
pub use registry::ModelRegistry;
pub use storage::{LocalStorage, StorageBackend};
