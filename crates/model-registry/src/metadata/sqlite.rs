//! SQLite implementation of [`MetadataBackend`].
//!
//! Uses [`sqlx`] with the `sqlite` feature. Migrations are embedded at
//! compile time and run by [`SqliteMetadataStore::connect`].
//!
//! Every multi-statement write runs in a single transaction that is
//! committed explicitly; dropping the transaction on an error path rolls it
//! back, so a version is never visible without its tags.
//!
//! The runtime-checked `sqlx::query` form is used so that no `DATABASE_URL`
//! is needed at compile time.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::MetadataBackend;
use crate::error::{RegistryError, Result};
use crate::record::{
    bytes_to_mb, version_number, ModelListing, ModelStats, ModelVersionRecord, NewModelVersion,
    RegistryStats, StatsSummary, TagMatch,
};

/// `(version_id, name, version, description, storage_path, file_size_bytes, created_at)`
type VersionRow = (i64, String, String, Option<String>, String, i64, String);

const SELECT_VERSIONS: &str = "SELECT mv.id, m.name, mv.version, mv.description, mv.storage_path, \
     mv.file_size_bytes, mv.created_at \
     FROM mr_models m JOIN mr_model_versions mv ON m.id = mv.model_id";

/// Relational metadata store backed by a SQLite connection pool.
#[derive(Clone, Debug)]
pub struct SqliteMetadataStore {
    pool: SqlitePool,
}

impl SqliteMetadataStore {
    /// Open (or create) the database file at `path` and run pending
    /// migrations.
    pub async fn connect(path: impl Into<PathBuf>, max_connections: u32) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                RegistryError::Operational(format!("{}: {e}", parent.display()))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;
        // Path is resolved relative to CARGO_MANIFEST_DIR at compile time.
        sqlx::migrate!("./migrations").run(&pool).await?;

        info!(path = %path.display(), "metadata database ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_rfc3339_or_now(raw: String, field: &'static str) -> DateTime<Utc> {
    raw.parse().unwrap_or_else(|e: chrono::ParseError| {
        tracing::warn!(raw = %raw, error = %e, field, "failed to parse metadata timestamp; using now");
        Utc::now()
    })
}

fn parse_optional_rfc3339(raw: Option<String>, field: &'static str) -> Option<DateTime<Utc>> {
    raw.and_then(|v| {
        v.parse()
            .map_err(|e: chrono::ParseError| {
                tracing::warn!(raw = %v, error = %e, field, "failed to parse optional metadata timestamp; dropping value");
                e
            })
            .ok()
    })
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn to_record(row: VersionRow, tags: BTreeMap<String, String>) -> ModelVersionRecord {
    let (_, name, version, description, storage_path, file_size_bytes, created_at) = row;
    ModelVersionRecord {
        name,
        version,
        description: description.unwrap_or_default(),
        tags,
        created_at: parse_rfc3339_or_now(created_at, "created_at"),
        storage_path,
        file_size: to_u64(file_size_bytes),
    }
}

/// Attach tags to version rows, keeping row order.
fn assemble(rows: Vec<VersionRow>, tag_rows: Vec<(i64, String, Option<String>)>) -> Vec<ModelVersionRecord> {
    let mut tag_map: HashMap<i64, BTreeMap<String, String>> = HashMap::new();
    for (version_id, key, value) in tag_rows {
        tag_map
            .entry(version_id)
            .or_default()
            .insert(key, value.unwrap_or_default());
    }
    rows.into_iter()
        .map(|row| {
            let tags = tag_map.remove(&row.0).unwrap_or_default();
            to_record(row, tags)
        })
        .collect()
}

async fn model_id(conn: &mut SqliteConnection, model_name: &str) -> Result<i64> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM mr_models WHERE name = ?1")
        .bind(model_name)
        .fetch_optional(&mut *conn)
        .await?;
    row.map(|(id,)| id)
        .ok_or_else(|| RegistryError::model_not_found(model_name))
}

/// Versions of one model in numeric order; empty if the model has none.
async fn fetch_versions(conn: &mut SqliteConnection, model_name: &str) -> Result<Vec<ModelVersionRecord>> {
    let rows: Vec<VersionRow> = sqlx::query_as(&format!(
        "{SELECT_VERSIONS} WHERE m.name = ?1 ORDER BY CAST(mv.version AS INTEGER)"
    ))
    .bind(model_name)
    .fetch_all(&mut *conn)
    .await?;
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let tag_rows: Vec<(i64, String, Option<String>)> = sqlx::query_as(
        "SELECT t.model_version_id, t.tag_key, t.tag_value \
         FROM mr_model_tags t \
         JOIN mr_model_versions mv ON mv.id = t.model_version_id \
         JOIN mr_models m ON m.id = mv.model_id \
         WHERE m.name = ?1",
    )
    .bind(model_name)
    .fetch_all(&mut *conn)
    .await?;

    Ok(assemble(rows, tag_rows))
}

async fn fetch_version(
    conn: &mut SqliteConnection,
    model_name: &str,
    version: &str,
) -> Result<ModelVersionRecord> {
    let row: Option<VersionRow> =
        sqlx::query_as(&format!("{SELECT_VERSIONS} WHERE m.name = ?1 AND mv.version = ?2"))
            .bind(model_name)
            .bind(version)
            .fetch_optional(&mut *conn)
            .await?;
    let Some(row) = row else {
        model_id(conn, model_name).await?;
        return Err(RegistryError::version_not_found(model_name, version));
    };

    let tag_rows: Vec<(String, Option<String>)> = sqlx::query_as(
        "SELECT tag_key, tag_value FROM mr_model_tags WHERE model_version_id = ?1",
    )
    .bind(row.0)
    .fetch_all(&mut *conn)
    .await?;
    let tags = tag_rows
        .into_iter()
        .map(|(k, v)| (k, v.unwrap_or_default()))
        .collect();

    Ok(to_record(row, tags))
}

impl MetadataBackend for SqliteMetadataStore {
    async fn next_version_label(&self, model_name: &str) -> Result<String> {
        let row: Option<(i64, i64)> = sqlx::query_as(
            "SELECT m.last_version, COALESCE(MAX(CAST(mv.version AS INTEGER)), 0) \
             FROM mr_models m LEFT JOIN mr_model_versions mv ON mv.model_id = m.id \
             WHERE m.name = ?1 GROUP BY m.id",
        )
        .bind(model_name)
        .fetch_optional(&self.pool)
        .await?;

        let assigned = row.map(|(last, max)| last.max(max)).unwrap_or(0);
        Ok((to_u64(assigned) + 1).to_string())
    }

    async fn save_version(&self, version: NewModelVersion) -> Result<ModelVersionRecord> {
        let now = timestamp(Utc::now());
        let number = to_i64(version_number(&version.version));

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO mr_models (name, description, last_version, created_at, updated_at) \
             VALUES (?1, ?2, 0, ?3, ?3) \
             ON CONFLICT(name) DO UPDATE SET updated_at = excluded.updated_at",
        )
        .bind(&version.name)
        .bind(&version.description)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        let (model_id, last_version, max_existing): (i64, i64, i64) = sqlx::query_as(
            "SELECT m.id, m.last_version, \
             COALESCE((SELECT MAX(CAST(version AS INTEGER)) FROM mr_model_versions WHERE model_id = m.id), 0) \
             FROM mr_models m WHERE m.name = ?1",
        )
        .bind(&version.name)
        .fetch_one(&mut *tx)
        .await?;

        if number == 0 || number <= last_version.max(max_existing) {
            // Dropping `tx` rolls back the model upsert as well.
            return Err(RegistryError::Integrity(format!(
                "version '{}' of model '{}' was already assigned",
                version.version, version.name
            )));
        }

        let version_id = sqlx::query(
            "INSERT INTO mr_model_versions \
             (model_id, version, description, storage_path, file_size_bytes, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(model_id)
        .bind(&version.version)
        .bind(&version.description)
        .bind(&version.storage_path)
        .bind(to_i64(version.file_size))
        .bind(timestamp(version.created_at))
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        sqlx::query("UPDATE mr_models SET last_version = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(number)
            .bind(&now)
            .bind(model_id)
            .execute(&mut *tx)
            .await?;

        for (key, value) in &version.tags {
            sqlx::query(
                "INSERT INTO mr_model_tags (model_version_id, tag_key, tag_value) \
                 VALUES (?1, ?2, ?3) \
                 ON CONFLICT(model_version_id, tag_key) DO UPDATE SET tag_value = excluded.tag_value",
            )
            .bind(version_id)
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(model = %version.name, version = %version.version, version_id, "version row committed");
        Ok(version.into_record())
    }

    async fn list_models(&self) -> Result<ModelListing> {
        // One read transaction so versions and tags come from the same snapshot.
        let mut tx = self.pool.begin().await?;
        let rows: Vec<VersionRow> = sqlx::query_as(&format!(
            "{SELECT_VERSIONS} ORDER BY m.name, CAST(mv.version AS INTEGER)"
        ))
        .fetch_all(&mut *tx)
        .await?;

        let tag_rows: Vec<(i64, String, Option<String>)> = if rows.is_empty() {
            Vec::new()
        } else {
            sqlx::query_as("SELECT model_version_id, tag_key, tag_value FROM mr_model_tags")
                .fetch_all(&mut *tx)
                .await?
        };
        tx.commit().await?;

        let mut listing = ModelListing::new();
        for record in assemble(rows, tag_rows) {
            listing.entry(record.name.clone()).or_default().push(record);
        }
        Ok(listing)
    }

    async fn get_versions(&self, model_name: &str) -> Result<Vec<ModelVersionRecord>> {
        let mut tx = self.pool.begin().await?;
        let versions = fetch_versions(&mut *tx, model_name).await?;
        tx.commit().await?;
        if versions.is_empty() {
            return Err(RegistryError::model_not_found(model_name));
        }
        Ok(versions)
    }

    async fn get_version(&self, model_name: &str, version: &str) -> Result<ModelVersionRecord> {
        let mut tx = self.pool.begin().await?;
        let record = fetch_version(&mut *tx, model_name, version).await?;
        tx.commit().await?;
        Ok(record)
    }

    async fn get_latest_version_label(&self, model_name: &str) -> Result<String> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT mv.version FROM mr_models m JOIN mr_model_versions mv ON m.id = mv.model_id \
             WHERE m.name = ?1 ORDER BY CAST(mv.version AS INTEGER) DESC LIMIT 1",
        )
        .bind(model_name)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|(v,)| v)
            .ok_or_else(|| RegistryError::model_not_found(model_name))
    }

    async fn delete_version(&self, model_name: &str, version: &str) -> Result<ModelVersionRecord> {
        let mut tx = self.pool.begin().await?;
        let record = fetch_version(&mut *tx, model_name, version).await?;

        sqlx::query(
            "DELETE FROM mr_model_versions \
             WHERE model_id = (SELECT id FROM mr_models WHERE name = ?1) AND version = ?2",
        )
        .bind(model_name)
        .bind(version)
        .execute(&mut *tx)
        .await?;

        let orphaned = sqlx::query(
            "DELETE FROM mr_models WHERE name = ?1 \
             AND NOT EXISTS (SELECT 1 FROM mr_model_versions mv WHERE mv.model_id = mr_models.id)",
        )
        .bind(model_name)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;
        debug!(model = model_name, version, model_removed = orphaned > 0, "version row deleted");
        Ok(record)
    }

    async fn delete_model(&self, model_name: &str) -> Result<Vec<ModelVersionRecord>> {
        let mut tx = self.pool.begin().await?;
        model_id(&mut *tx, model_name).await?;
        let versions = fetch_versions(&mut *tx, model_name).await?;

        sqlx::query("DELETE FROM mr_models WHERE name = ?1")
            .bind(model_name)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(versions)
    }

    async fn statistics(&self) -> Result<RegistryStats> {
        let mut tx = self.pool.begin().await?;
        let (total_models, total_versions, total_size): (i64, i64, i64) = sqlx::query_as(
            "SELECT COUNT(DISTINCT m.id), COUNT(mv.id), COALESCE(SUM(mv.file_size_bytes), 0) \
             FROM mr_models m LEFT JOIN mr_model_versions mv ON m.id = mv.model_id",
        )
        .fetch_one(&mut *tx)
        .await?;

        let rows: Vec<(String, i64, i64, i64, Option<String>)> = sqlx::query_as(
            "SELECT m.name, COUNT(mv.id), COALESCE(SUM(mv.file_size_bytes), 0), \
             COALESCE(MAX(CAST(mv.version AS INTEGER)), 0), MAX(mv.created_at) \
             FROM mr_models m LEFT JOIN mr_model_versions mv ON m.id = mv.model_id \
             GROUP BY m.id, m.name ORDER BY m.name",
        )
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        let models = rows
            .into_iter()
            .map(|(name, count, size, latest, latest_created_at)| {
                let size = to_u64(size);
                let stats = ModelStats {
                    version_count: to_u64(count),
                    total_size_bytes: size,
                    total_size_mb: bytes_to_mb(size),
                    latest_version: latest.to_string(),
                    latest_created_at: parse_optional_rfc3339(latest_created_at, "latest_created_at"),
                };
                (name, stats)
            })
            .collect();

        let total_size_bytes = to_u64(total_size);
        Ok(RegistryStats {
            summary: StatsSummary {
                total_models: to_u64(total_models),
                total_versions: to_u64(total_versions),
                total_size_bytes,
                total_size_mb: bytes_to_mb(total_size_bytes),
            },
            models,
        })
    }

    async fn find_by_tag(&self, tag_key: &str, tag_value: Option<&str>) -> Result<Vec<TagMatch>> {
        let rows: Vec<(String, String, Option<String>, String, Option<String>, String)> =
            sqlx::query_as(
                "SELECT m.name, mv.version, mv.description, mt.tag_key, mt.tag_value, mv.created_at \
                 FROM mr_models m \
                 JOIN mr_model_versions mv ON m.id = mv.model_id \
                 JOIN mr_model_tags mt ON mv.id = mt.model_version_id \
                 WHERE mt.tag_key = ?1 AND (?2 IS NULL OR mt.tag_value = ?2) \
                 ORDER BY m.name, CAST(mv.version AS INTEGER)",
            )
            .bind(tag_key)
            .bind(tag_value)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(name, version, description, tag_key, tag_value, created_at)| TagMatch {
                name,
                version,
                description: description.unwrap_or_default(),
                tag_key,
                tag_value: tag_value.unwrap_or_default(),
                created_at: parse_rfc3339_or_now(created_at, "created_at"),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn new_version(name: &str, version: &str, tags: &[(&str, &str)]) -> NewModelVersion {
        NewModelVersion {
            name: name.into(),
            version: version.into(),
            description: format!("{name} v{version}"),
            storage_path: format!("{name}/v{version}/model.json"),
            file_size: 100,
            created_at: Utc::now(),
            tags: tags
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
        }
    }

    async fn store(dir: &TempDir) -> SqliteMetadataStore {
        SqliteMetadataStore::connect(dir.path().join("db/registry.db"), 2)
            .await
            .expect("connect")
    }

    #[tokio::test]
    async fn migrations_create_registry_tables() {
        let dir = TempDir::new().expect("tempdir");
        let store = store(&dir).await;
        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE 'mr_%' ORDER BY name",
        )
        .fetch_all(store.pool())
        .await
        .expect("tables");
        let names: Vec<_> = tables.into_iter().map(|(n,)| n).collect();
        assert_eq!(names, ["mr_model_tags", "mr_model_versions", "mr_models"]);
    }

    #[tokio::test]
    async fn versions_and_tags_round_trip() {
        let dir = TempDir::new().expect("tempdir");
        let store = store(&dir).await;
        store
            .save_version(new_version("m", "1", &[("type", "function"), ("complexity", "low")]))
            .await
            .expect("save");

        let record = store.get_version("m", "1").await.expect("get");
        assert_eq!(record.description, "m v1");
        assert_eq!(record.file_size, 100);
        assert_eq!(record.tags.len(), 2);
        assert_eq!(record.tags["complexity"], "low");
    }

    #[tokio::test]
    async fn repeated_tag_key_keeps_last_value() {
        let dir = TempDir::new().expect("tempdir");
        let store = store(&dir).await;
        store
            .save_version(new_version("m", "1", &[("stage", "dev"), ("stage", "prod")]))
            .await
            .expect("save");

        let record = store.get_version("m", "1").await.expect("get");
        assert_eq!(record.tags.len(), 1);
        assert_eq!(record.tags["stage"], "prod");
    }

    #[tokio::test]
    async fn rejected_save_rolls_back_model_row() {
        let dir = TempDir::new().expect("tempdir");
        let store = store(&dir).await;

        // "0" is never a valid label, so the check fails after the model upsert.
        let err = store
            .save_version(new_version("ghost", "0", &[("k", "v")]))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Integrity(_)), "unexpected error: {err}");

        let stats = store.statistics().await.expect("stats");
        assert_eq!(stats.summary.total_models, 0);
        assert!(store.list_models().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn tag_failure_rolls_back_version_and_earlier_tags() {
        let dir = TempDir::new().expect("tempdir");
        let store = store(&dir).await;
        store
            .save_version(new_version("m", "1", &[("stage", "dev")]))
            .await
            .expect("v1");
        sqlx::query(
            "CREATE TRIGGER reject_poison_tag BEFORE INSERT ON mr_model_tags \
             WHEN NEW.tag_key = 'poison' \
             BEGIN SELECT RAISE(ABORT, 'tag rejected'); END",
        )
        .execute(store.pool())
        .await
        .expect("trigger");

        // The version row and the first tag are written before the trigger fires.
        let err = store
            .save_version(new_version("m", "2", &[("stage", "prod"), ("poison", "x")]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("tag rejected"), "unexpected error: {err}");

        let labels: Vec<_> = store
            .get_versions("m")
            .await
            .expect("versions")
            .into_iter()
            .map(|v| v.version)
            .collect();
        assert_eq!(labels, ["1"]);
        let (tags,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM mr_model_tags")
            .fetch_one(store.pool())
            .await
            .expect("count");
        assert_eq!(tags, 1);
        assert!(store.find_by_tag("stage", Some("prod")).await.expect("search").is_empty());
        // The counter advance was rolled back too.
        assert_eq!(store.next_version_label("m").await.expect("next"), "2");
    }

    #[tokio::test]
    async fn latest_version_is_numeric() {
        let dir = TempDir::new().expect("tempdir");
        let store = store(&dir).await;
        for v in 1..=11 {
            store
                .save_version(new_version("m", &v.to_string(), &[]))
                .await
                .expect("save");
        }
        assert_eq!(store.get_latest_version_label("m").await.expect("latest"), "11");
        assert_eq!(store.next_version_label("m").await.expect("next"), "12");

        let labels: Vec<_> = store
            .get_versions("m")
            .await
            .expect("versions")
            .into_iter()
            .map(|v| v.version)
            .collect();
        assert_eq!(labels.last().map(String::as_str), Some("11"));
        assert_eq!(labels[1], "2");
    }

    #[tokio::test]
    async fn counter_survives_deleting_latest_version() {
        let dir = TempDir::new().expect("tempdir");
        let store = store(&dir).await;
        store.save_version(new_version("m", "1", &[])).await.expect("v1");
        store.save_version(new_version("m", "2", &[])).await.expect("v2");
        store.delete_version("m", "2").await.expect("delete");

        assert_eq!(store.next_version_label("m").await.expect("next"), "3");
        let err = store.save_version(new_version("m", "2", &[])).await.unwrap_err();
        assert!(matches!(err, RegistryError::Integrity(_)), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn delete_model_cascades_versions_and_tags() {
        let dir = TempDir::new().expect("tempdir");
        let store = store(&dir).await;
        store
            .save_version(new_version("m", "1", &[("a", "1")]))
            .await
            .expect("v1");
        store
            .save_version(new_version("m", "2", &[("b", "2")]))
            .await
            .expect("v2");

        let removed = store.delete_model("m").await.expect("delete");
        assert_eq!(removed.len(), 2);

        let (versions, tags): (i64, i64) = sqlx::query_as(
            "SELECT (SELECT COUNT(*) FROM mr_model_versions), (SELECT COUNT(*) FROM mr_model_tags)",
        )
        .fetch_one(store.pool())
        .await
        .expect("counts");
        assert_eq!((versions, tags), (0, 0));
        assert!(store.delete_model("m").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn missing_version_reports_model_or_version() {
        let dir = TempDir::new().expect("tempdir");
        let store = store(&dir).await;
        store.save_version(new_version("m", "1", &[])).await.expect("v1");

        let err = store.get_version("m", "7").await.unwrap_err();
        assert_eq!(err.to_string(), "Model 'm' version '7' not found");
        let err = store.get_version("other", "1").await.unwrap_err();
        assert_eq!(err.to_string(), "Model 'other' not found");
    }

    #[tokio::test]
    async fn statistics_and_tag_search() {
        let dir = TempDir::new().expect("tempdir");
        let store = store(&dir).await;
        store
            .save_version(new_version("a", "1", &[("author", "team_a")]))
            .await
            .expect("a1");
        store
            .save_version(new_version("a", "2", &[("author", "team_b")]))
            .await
            .expect("a2");
        store
            .save_version(new_version("b", "1", &[("author", "team_a")]))
            .await
            .expect("b1");

        let stats = store.statistics().await.expect("stats");
        assert_eq!(stats.summary.total_models, 2);
        assert_eq!(stats.summary.total_versions, 3);
        assert_eq!(stats.summary.total_size_bytes, 300);
        assert_eq!(stats.models["a"].latest_version, "2");
        assert!(stats.models["a"].latest_created_at.is_some());

        let hits = store.find_by_tag("author", Some("team_a")).await.expect("search");
        let found: Vec<_> = hits.iter().map(|h| (h.name.as_str(), h.version.as_str())).collect();
        assert_eq!(found, [("a", "1"), ("b", "1")]);
        assert_eq!(store.find_by_tag("author", None).await.expect("any").len(), 3);
    }
}
