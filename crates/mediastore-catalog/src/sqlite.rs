//! Durable catalog backed by SQLite.
//!
//! One table holds every published version:
//!
//! ```sql
//! dataset_versions(dataset_name, version, content_fingerprint, created_at)
//! ```
//!
//! `(dataset_name, version)` is the primary key, so the database itself
//! rejects a second insert for a key. Timestamps are stored as RFC 3339 text
//! with nanosecond precision in UTC, which sorts chronologically.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{ffi, params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use mediastore_types::{DatasetName, Fingerprint, VersionKey, VersionLabel, VersionRecord};

use crate::error::{CatalogError, CatalogResult};
use crate::traits::Catalog;

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS dataset_versions (
    dataset_name        TEXT NOT NULL,
    version             TEXT NOT NULL,
    content_fingerprint TEXT NOT NULL CHECK (length(content_fingerprint) > 0),
    created_at          TEXT NOT NULL,
    PRIMARY KEY (dataset_name, version)
);";

/// Where the catalog database lives and how long to wait on a locked file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteCatalogConfig {
    pub path: PathBuf,
    pub busy_timeout_ms: u64,
}

impl Default for SqliteCatalogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".mediastore/catalog.db"),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

/// A [`Catalog`] stored in a single SQLite database file.
///
/// The connection is opened once and shared behind a mutex. It is released
/// when the catalog is dropped, or explicitly with [`SqliteCatalog::close`].
#[derive(Debug)]
pub struct SqliteCatalog {
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
}

fn db_error(err: rusqlite::Error) -> CatalogError {
    CatalogError::Unavailable(err.to_string())
}

impl SqliteCatalog {
    /// Open (creating if needed) the database at `config.path`.
    pub fn open(config: &SqliteCatalogConfig) -> CatalogResult<Self> {
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                CatalogError::Unavailable(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        let conn = Connection::open(&config.path).map_err(db_error)?;
        apply_pragmas(&conn, config.busy_timeout_ms)?;
        initialize_schema(&conn)?;
        info!(path = %config.path.display(), "catalog opened");
        Ok(Self {
            path: Some(config.path.clone()),
            conn: Mutex::new(conn),
        })
    }

    /// A private catalog that lives only as long as this value.
    pub fn open_in_memory() -> CatalogResult<Self> {
        let conn = Connection::open_in_memory().map_err(db_error)?;
        apply_pragmas(&conn, DEFAULT_BUSY_TIMEOUT_MS)?;
        initialize_schema(&conn)?;
        Ok(Self {
            path: None,
            conn: Mutex::new(conn),
        })
    }

    /// Database file, or `None` for an in-memory catalog.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Close the connection, reporting any error SQLite returns on close.
    pub fn close(self) -> CatalogResult<()> {
        let conn = self.conn.into_inner().unwrap_or_else(|e| e.into_inner());
        conn.close().map_err(|(_, err)| db_error(err))?;
        debug!(path = ?self.path, "catalog closed");
        Ok(())
    }

    fn lock(&self) -> CatalogResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| CatalogError::Unavailable("catalog connection mutex poisoned".into()))
    }
}

fn apply_pragmas(conn: &Connection, busy_timeout_ms: u64) -> CatalogResult<()> {
    conn.execute_batch("PRAGMA journal_mode = wal;").map_err(db_error)?;
    conn.execute_batch("PRAGMA synchronous = full;").map_err(db_error)?;
    conn.busy_timeout(Duration::from_millis(busy_timeout_ms))
        .map_err(db_error)?;
    Ok(())
}

fn initialize_schema(conn: &Connection) -> CatalogResult<()> {
    conn.execute_batch(SCHEMA).map_err(db_error)
}

// Fixed-width RFC 3339 text sorts chronologically only for years 0000-9999;
// `VersionRegistry::publish` refuses anything outside that range.
fn format_timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Decode one stored row. Anything another writer could have put in the
/// table that we would never write ourselves is reported as corrupt.
fn decode_row(
    dataset: &str,
    version: &str,
    fingerprint: &str,
    created_at: &str,
) -> CatalogResult<VersionRecord> {
    let corrupt = |reason: String| CatalogError::Corrupt {
        key: format!("{dataset}/{version}"),
        reason,
    };
    let key = VersionKey::new(
        DatasetName::new(dataset).map_err(|e| corrupt(e.to_string()))?,
        VersionLabel::new(version).map_err(|e| corrupt(e.to_string()))?,
    );
    let fingerprint = Fingerprint::new(fingerprint).map_err(|e| corrupt(e.to_string()))?;
    let created_at = DateTime::parse_from_rfc3339(created_at)
        .map_err(|e| corrupt(format!("bad created_at {created_at:?}: {e}")))?
        .with_timezone(&Utc);
    Ok(VersionRecord::new(key, fingerprint, created_at))
}

impl Catalog for SqliteCatalog {
    fn insert(&self, record: &VersionRecord) -> CatalogResult<()> {
        let conn = self.lock()?;
        let result = conn.execute(
            "INSERT INTO dataset_versions (dataset_name, version, content_fingerprint, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.dataset.as_str(),
                record.version.as_str(),
                record.fingerprint.as_str(),
                format_timestamp(&record.created_at),
            ],
        );
        match result {
            Ok(_) => {
                debug!(dataset = %record.dataset, version = %record.version, "catalog row inserted");
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                Err(CatalogError::Duplicate { key: record.key() })
            }
            Err(err) => Err(db_error(err)),
        }
    }

    fn get(&self, key: &VersionKey) -> CatalogResult<Option<VersionRecord>> {
        let conn = self.lock()?;
        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT content_fingerprint, created_at FROM dataset_versions
                 WHERE dataset_name = ?1 AND version = ?2",
                params![key.dataset.as_str(), key.version.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(db_error)?;

        row.map(|(fingerprint, created_at)| {
            decode_row(key.dataset.as_str(), key.version.as_str(), &fingerprint, &created_at)
        })
        .transpose()
    }

    fn list(&self, dataset: &DatasetName) -> CatalogResult<Vec<VersionRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT version, content_fingerprint, created_at FROM dataset_versions
                 WHERE dataset_name = ?1 ORDER BY created_at, version",
            )
            .map_err(db_error)?;
        let rows = stmt
            .query_map(params![dataset.as_str()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
            })
            .map_err(db_error)?;

        let mut records = Vec::new();
        for row in rows {
            let (version, fingerprint, created_at) = row.map_err(db_error)?;
            records.push(decode_row(dataset.as_str(), &version, &fingerprint, &created_at)?);
        }
        Ok(records)
    }

    fn datasets(&self) -> CatalogResult<Vec<DatasetName>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT dataset_name FROM dataset_versions ORDER BY dataset_name")
            .map_err(db_error)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(db_error)?;

        let mut names = Vec::new();
        for row in rows {
            let name = row.map_err(db_error)?;
            let dataset = DatasetName::new(name.as_str()).map_err(|e| CatalogError::Corrupt {
                key: name.clone(),
                reason: e.to_string(),
            })?;
            names.push(dataset);
        }
        Ok(names)
    }

    fn ping(&self) -> CatalogResult<()> {
        let conn = self.lock()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(db_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(version: &str, fp: &str) -> VersionRecord {
        VersionRecord::new(
            VersionKey::parse("catsdogs", version).unwrap(),
            Fingerprint::new(fp).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
        )
    }

    fn config(dir: &Path) -> SqliteCatalogConfig {
        SqliteCatalogConfig {
            path: dir.join("nested").join("catalog.db"),
            ..SqliteCatalogConfig::default()
        }
    }

    #[test]
    fn open_creates_parent_and_schema() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = SqliteCatalog::open(&config(dir.path())).unwrap();
        assert!(dir.path().join("nested/catalog.db").exists());
        catalog.ping().unwrap();
        assert!(catalog.datasets().unwrap().is_empty());
    }

    #[test]
    fn concurrent_inserts_across_connections_admit_exactly_one() {
        let dir = tempfile::tempdir().unwrap();
        let handles: Vec<_> = (0..8)
            .map(|_| SqliteCatalog::open(&config(dir.path())).unwrap())
            .collect();

        let results: Vec<_> = std::thread::scope(|s| {
            let threads: Vec<_> = handles
                .iter()
                .enumerate()
                .map(|(i, catalog)| s.spawn(move || catalog.insert(&record("v1", &format!("fp-{i}")))))
                .collect();
            threads.into_iter().map(|t| t.join().unwrap()).collect()
        });

        let winners: Vec<_> = results.iter().enumerate().filter(|(_, r)| r.is_ok()).collect();
        let duplicates =
            results.iter().filter(|r| matches!(r, Err(CatalogError::Duplicate { .. }))).count();
        assert_eq!((winners.len(), duplicates), (1, 7));

        let stored = handles[0].get(&VersionKey::parse("catsdogs", "v1").unwrap()).unwrap().unwrap();
        assert_eq!(stored.fingerprint.as_str(), format!("fp-{}", winners[0].0));
    }

    #[test]
    fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let r = record("v1", "fp-abc123");
        {
            let catalog = SqliteCatalog::open(&config(dir.path())).unwrap();
            catalog.insert(&r).unwrap();
            catalog.close().unwrap();
        }
        let reopened = SqliteCatalog::open(&config(dir.path())).unwrap();
        assert_eq!(reopened.get(&r.key()).unwrap(), Some(r));
    }

    #[test]
    fn primary_key_rejects_duplicates() {
        let catalog = SqliteCatalog::open_in_memory().unwrap();
        let first = record("v1", "fp-first");
        catalog.insert(&first).unwrap();

        let err = catalog.insert(&record("v1", "fp-second")).unwrap_err();
        assert_eq!(err, CatalogError::Duplicate { key: first.key() });
        assert_eq!(catalog.get(&first.key()).unwrap(), Some(first));
    }

    #[test]
    fn timestamps_keep_sub_second_precision() {
        let catalog = SqliteCatalog::open_in_memory().unwrap();
        let t = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let r = VersionRecord::new(
            VersionKey::parse("catsdogs", "v1").unwrap(),
            Fingerprint::new("fp").unwrap(),
            t,
        );
        catalog.insert(&r).unwrap();
        assert_eq!(catalog.get(&r.key()).unwrap().unwrap().created_at, t);
    }

    #[test]
    fn list_orders_by_created_at() {
        let catalog = SqliteCatalog::open_in_memory().unwrap();
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        for (version, offset) in [("v10", 2), ("v2", 1), ("v1", 0)] {
            let r = VersionRecord::new(
                VersionKey::parse("catsdogs", version).unwrap(),
                Fingerprint::new(format!("fp-{version}")).unwrap(),
                base + chrono::Duration::seconds(offset),
            );
            catalog.insert(&r).unwrap();
        }
        let labels: Vec<_> = catalog
            .list(&DatasetName::new("catsdogs").unwrap())
            .unwrap()
            .into_iter()
            .map(|r| r.version.to_string())
            .collect();
        assert_eq!(labels, ["v1", "v2", "v10"]);
    }

    #[test]
    fn empty_fingerprint_is_refused_by_schema() {
        let catalog = SqliteCatalog::open_in_memory().unwrap();
        let conn = catalog.lock().unwrap();
        let result = conn.execute(
            "INSERT INTO dataset_versions VALUES ('catsdogs', 'v1', '', '2024-01-01T00:00:00Z')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn foreign_rows_are_reported_corrupt() {
        let catalog = SqliteCatalog::open_in_memory().unwrap();
        catalog
            .lock()
            .unwrap()
            .execute(
                "INSERT INTO dataset_versions VALUES ('catsdogs', 'v1', 'fp-1', 'yesterday')",
                [],
            )
            .unwrap();

        let key = VersionKey::parse("catsdogs", "v1").unwrap();
        assert!(matches!(catalog.get(&key), Err(CatalogError::Corrupt { .. })));
    }
}
