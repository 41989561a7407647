//! Database connection management with pragma configuration.
//!
//! This module handles opening the SQLite database, applying required pragmas
//! for durability and concurrency (WAL mode), and running migrations up to
//! the requested schema revision.

use super::migrations;
use super::revision::SchemaRevision;
use crate::Error;
use crate::metrics;
use prometheus::IntGauge;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tokio_rusqlite::Connection;

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Cache database handle.
///
/// Wraps a tokio-rusqlite Connection that runs database operations
/// on a background thread. Clones share the connection and the last
/// schema revision seen on it.
#[derive(Clone, Debug)]
pub struct CacheDb {
    pub(crate) conn: Connection,
    revision: Arc<AtomicI64>,
    entries: IntGauge,
}

impl CacheDb {
    /// Open a database at the specified path at the latest schema revision.
    ///
    /// Creates the file if it doesn't exist, applies pragmas,
    /// and runs any pending migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::open_at(path, SchemaRevision::LATEST, DEFAULT_BUSY_TIMEOUT).await
    }

    /// Open a database at the specified path, migrating no further than `revision`.
    pub async fn open_at(
        path: impl AsRef<Path>, revision: SchemaRevision, busy_timeout: Duration,
    ) -> Result<Self, Error> {
        let path = path.as_ref();
        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        let db = Self::init(conn, revision, busy_timeout).await?;
        tracing::info!(path = %path.display(), revision = revision.version(), "opened media cache");
        Ok(db)
    }

    /// Open an in-memory database for testing.
    ///
    /// Creates a temporary in-memory SQLite database with the same
    /// pragma configuration as file-based databases.
    pub async fn open_in_memory() -> Result<Self, Error> {
        Self::open_in_memory_at(SchemaRevision::LATEST).await
    }

    /// Open an in-memory database migrated to `revision`.
    pub async fn open_in_memory_at(revision: SchemaRevision) -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;

        Self::init(conn, revision, DEFAULT_BUSY_TIMEOUT).await
    }

    async fn init(conn: Connection, revision: SchemaRevision, busy_timeout: Duration) -> Result<Self, Error> {
        conn.call(move |conn| {
            conn.execute_batch(
                "PRAGMA journal_mode=WAL;
                 PRAGMA synchronous=NORMAL;
                 PRAGMA temp_store=MEMORY;",
            )?;
            conn.busy_timeout(busy_timeout)?;
            Ok(())
        })
        .await
        .map_err(Error::Database)?;

        let revision = migrations::run_to(&conn, revision).await?;

        let db = Self {
            conn,
            revision: Arc::new(AtomicI64::new(revision.version())),
            entries: metrics::CACHE_ENTRIES.clone(),
        };
        db.refresh_entries_gauge().await?;
        Ok(db)
    }

    /// Report row counts to `gauge` instead of the process-wide gauge.
    pub fn with_entries_gauge(mut self, gauge: IntGauge) -> Self {
        self.entries = gauge;
        self
    }

    pub(crate) fn entries_gauge(&self) -> &IntGauge {
        &self.entries
    }

    /// Set the entries gauge from a full row count.
    pub async fn refresh_entries_gauge(&self) -> Result<u64, Error> {
        let count = self.count_entries().await?;
        self.entries.set(count as i64);
        Ok(count)
    }

    /// Schema revision the table was at on the last operation through any
    /// clone of this handle.
    pub fn revision(&self) -> SchemaRevision {
        SchemaRevision::from_version(self.revision.load(Ordering::Acquire)).unwrap_or(SchemaRevision::LATEST)
    }

    pub(crate) fn observe_revision(&self, revision: SchemaRevision) {
        self.revision.store(revision.version(), Ordering::Release);
    }

    /// Migrate the open database forward to `revision`.
    ///
    /// Every clone of this handle sees the new revision.
    pub async fn upgrade_to(&self, revision: SchemaRevision) -> Result<(), Error> {
        let revision = migrations::run_to(&self.conn, revision).await?;
        self.observe_revision(revision);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_rusqlite::rusqlite;

    #[tokio::test]
    async fn test_open_in_memory() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let version = db
            .conn
            .call(|conn| conn.query_row("SELECT sqlite_version()", [], |row| row.get::<_, String>(0)))
            .await
            .unwrap();
        assert!(!version.is_empty());
        assert_eq!(db.revision(), SchemaRevision::LATEST);
    }

    #[tokio::test]
    async fn test_open_at_pinned_revision() {
        let db = CacheDb::open_in_memory_at(SchemaRevision::UniquePost).await.unwrap();
        assert_eq!(db.revision(), SchemaRevision::UniquePost);
    }

    #[tokio::test]
    async fn test_upgrade_in_sequence() {
        let db = CacheDb::open_in_memory_at(SchemaRevision::UniquePost).await.unwrap();
        db.upgrade_to(SchemaRevision::UniqueRepresentation).await.unwrap();
        assert_eq!(db.revision(), SchemaRevision::UniqueRepresentation);
        db.upgrade_to(SchemaRevision::Unconstrained).await.unwrap();
        assert_eq!(db.revision(), SchemaRevision::Unconstrained);
    }

    #[tokio::test]
    async fn test_reopen_file_upgrades_to_latest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.sqlite");

        let db = CacheDb::open_at(&path, SchemaRevision::UniqueRepresentation, Duration::from_millis(500))
            .await
            .unwrap();
        drop(db);

        let reopened = CacheDb::open(&path).await.unwrap();
        assert_eq!(reopened.revision(), SchemaRevision::Unconstrained);
    }

    #[tokio::test]
    async fn test_file_pragmas() {
        let dir = tempfile::tempdir().unwrap();
        let db = CacheDb::open(dir.path().join("cache.sqlite")).await.unwrap();

        let (journal_mode, foreign_keys) = db
            .conn
            .call(|conn| -> rusqlite::Result<(String, i64)> {
                let journal_mode = conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?;
                let foreign_keys = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
                Ok((journal_mode, foreign_keys))
            })
            .await
            .unwrap();
        assert_eq!(journal_mode, "wal");
        assert_eq!(foreign_keys, 0);
    }

    #[tokio::test]
    async fn test_clone_sees_upgrade() {
        let db = CacheDb::open_in_memory_at(SchemaRevision::UniqueRepresentation).await.unwrap();
        let other = db.clone();

        db.upgrade_to(SchemaRevision::Unconstrained).await.unwrap();

        assert_eq!(other.revision(), SchemaRevision::Unconstrained);
        assert!(other.entries_for_post(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_second_connection_follows_migration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.sqlite");
        let timeout = Duration::from_millis(500);

        let first = CacheDb::open_at(&path, SchemaRevision::UniqueRepresentation, timeout).await.unwrap();
        let second = CacheDb::open_at(&path, SchemaRevision::UniqueRepresentation, timeout).await.unwrap();

        first.upgrade_to(SchemaRevision::Unconstrained).await.unwrap();

        assert!(second.entries_for_post(1).await.unwrap().is_empty());
        assert_eq!(second.revision(), SchemaRevision::Unconstrained);
    }

    #[tokio::test]
    async fn test_refresh_entries_gauge_counts_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.sqlite");
        let timeout = Duration::from_millis(500);

        let db = CacheDb::open_at(&path, SchemaRevision::Unconstrained, timeout).await.unwrap();
        db.conn
            .call(|conn| {
                conn.execute_batch(
                    "INSERT INTO cache_entries VALUES (1, 1, 1, 1, NULL, NULL, '2024-01-01T00:00:00+00:00', 0);
                     INSERT INTO cache_entries VALUES (2, 1, 2, 2, NULL, NULL, '2024-01-01T00:00:00+00:00', 0);",
                )
            })
            .await
            .unwrap();
        drop(db);

        let gauge = IntGauge::new("test_cache_entries", "test").unwrap();
        let reopened = CacheDb::open_at(&path, SchemaRevision::Unconstrained, timeout)
            .await
            .unwrap()
            .with_entries_gauge(gauge.clone());
        assert_eq!(reopened.refresh_entries_gauge().await.unwrap(), 2);
        assert_eq!(gauge.get(), 2);
    }
}
