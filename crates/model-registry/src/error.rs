//! Unified registry error type.
//!
//! Every backend translates its native failures into [`RegistryError`] so
//! callers can match on the four failure kinds without knowing which
//! storage or metadata backend is configured.

use thiserror::Error;

/// All errors that can occur while operating the model registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The requested model, version or artifact does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Artifact I/O failed, or the object could not be (de)serialized.
    #[error("storage error: {0}")]
    Storage(String),

    /// A metadata constraint was violated (duplicate name, dangling
    /// reference, version label already assigned).
    #[error("integrity error: {0}")]
    Integrity(String),

    /// The metadata backend is unreachable or failed transiently.
    #[error("operational error: {0}")]
    Operational(String),

    /// The caller supplied a value the registry refuses to act on.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

impl RegistryError {
    pub fn model_not_found(name: &str) -> Self {
        Self::NotFound(format!("Model '{name}' not found"))
    }

    pub fn version_not_found(name: &str, version: &str) -> Self {
        Self::NotFound(format!("Model '{name}' version '{version}' not found"))
    }

    /// HTTP status code a REST wrapper should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Integrity(_) | Self::InvalidInput(_) => 400,
            Self::Storage(_) | Self::Operational(_) => 500,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<sqlx::Error> for RegistryError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => Self::NotFound(e.to_string()),
            sqlx::Error::Database(db)
                if db.is_unique_violation()
                    || db.is_foreign_key_violation()
                    || db.is_check_violation() =>
            {
                Self::Integrity(db.message().to_owned())
            }
            _ => Self::Operational(e.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for RegistryError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        Self::Operational(format!("migration failed: {e}"))
    }
}
