//! Registry configuration, loaded from environment variables.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use strum::{Display, EnumString};

use crate::error::{RegistryError, Result};

const DEFAULT_ROOT: &str = "./models";
const DEFAULT_MAX_CONNECTIONS: u32 = 4;

/// Which backends [`crate::create_registry`] assembles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BackendKind {
    /// Local artifacts with a single JSON metadata document.
    #[default]
    Local,
    /// Local artifacts with SQLite metadata.
    Database,
    /// Object storage. Recognised, not implemented.
    S3,
}

/// Runtime configuration for a registry and the CLI around it.
///
/// Every field has a default, so an empty environment yields a document
/// registry under `./models`.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryConfig {
    pub backend: BackendKind,

    /// Directory artifacts are stored under (default: `./models`).
    pub artifact_root: PathBuf,

    /// Metadata document for the `local` backend
    /// (default: `{artifact_root}/registry.json`).
    pub metadata_path: PathBuf,

    /// SQLite file for the `database` backend
    /// (default: `{artifact_root}/registry.db`).
    pub database_path: PathBuf,

    /// Upper bound of the SQLite connection pool.
    pub max_connections: u32,

    /// `tracing` filter string, e.g. `"info"` or `"model_registry=debug"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,
}

impl RegistryConfig {
    /// Defaults for `backend` rooted at `root`; metadata lives inside the root.
    pub fn rooted(backend: BackendKind, root: impl Into<PathBuf>) -> Self {
        let artifact_root = root.into();
        Self {
            backend,
            metadata_path: artifact_root.join("registry.json"),
            database_path: artifact_root.join("registry.db"),
            artifact_root,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            log_level: "info".to_owned(),
            log_json: false,
        }
    }

    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self::rooted(BackendKind::Local, root)
    }

    pub fn database(root: impl Into<PathBuf>) -> Self {
        Self::rooted(BackendKind::Database, root)
    }

    /// Build [`RegistryConfig`] from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build [`RegistryConfig`] from an arbitrary variable lookup.
    ///
    /// Malformed numbers fall back to their default; an unknown backend name
    /// is an `InvalidInput` error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let backend = match lookup("MODEL_REGISTRY_BACKEND") {
            Some(raw) => BackendKind::from_str(raw.trim()).map_err(|_| {
                RegistryError::InvalidInput(format!(
                    "unknown registry backend '{raw}' (expected local, database or s3)"
                ))
            })?,
            None => BackendKind::default(),
        };

        let root = PathBuf::from(env_or(&lookup, "MODEL_REGISTRY_PATH", DEFAULT_ROOT));
        let mut config = Self::rooted(backend, root);
        if let Some(path) = lookup("MODEL_REGISTRY_METADATA_PATH") {
            config.metadata_path = path.into();
        }
        if let Some(path) = lookup("MODEL_REGISTRY_DB_PATH") {
            config.database_path = path.into();
        }
        config.max_connections =
            parse_env(&lookup, "MODEL_REGISTRY_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS).max(1);
        config.log_level = env_or(&lookup, "MODEL_REGISTRY_LOG", "info");
        config.log_json = lookup("MODEL_REGISTRY_LOG_JSON")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        Ok(config)
    }

    /// Re-root the artifact directory, moving metadata files along with it
    /// when they were still at their derived location.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        if self.metadata_path == self.artifact_root.join("registry.json") {
            self.metadata_path = root.join("registry.json");
        }
        if self.database_path == self.artifact_root.join("registry.db") {
            self.database_path = root.join("registry.db");
        }
        self.artifact_root = root;
        self
    }

    /// Metadata location for the configured backend, if it has one.
    pub fn metadata_location(&self) -> Option<&Path> {
        match self.backend {
            BackendKind::Local => Some(&self.metadata_path),
            BackendKind::Database => Some(&self.database_path),
            BackendKind::S3 => None,
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::local(DEFAULT_ROOT)
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    lookup(key).unwrap_or_else(|| default.to_owned())
}

fn parse_env<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
