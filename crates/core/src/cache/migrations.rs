//! Database schema migrations.
//!
//! Uses a simple version table approach to track applied migrations.
//! Each migration is a SQL batch that moves `cache_entries` to the next
//! [`SchemaRevision`]. There are no down-migrations.

use super::Error;
use super::revision::SchemaRevision;
use tokio_rusqlite::{Connection, params, rusqlite};

/// A single forward step of the schema.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Migration {
    revision: SchemaRevision,
    description: &'static str,
    sql: &'static str,
    /// Column whose values the step throws away, if any.
    discards: Option<&'static str>,
}

/// Migration list, in application order.
const MIGRATIONS: &[Migration] = &[
    Migration {
        revision: SchemaRevision::UniquePost,
        description: "create cache_entries, unique(post_id)",
        sql: include_str!("../../migrations/001_cache_entries.sql"),
        discards: None,
    },
    Migration {
        revision: SchemaRevision::UniqueRepresentation,
        description: "add sent_as_file, unique(post_id, is_photo)",
        sql: include_str!("../../migrations/002_sent_as_file.sql"),
        discards: None,
    },
    Migration {
        revision: SchemaRevision::Unconstrained,
        description: "drop uniqueness indexes, rebuild without sent_as_file",
        sql: include_str!("../../migrations/003_drop_unique.sql"),
        discards: Some("sent_as_file"),
    },
];

/// Run every pending migration up to the latest revision.
pub async fn run(conn: &Connection) -> Result<SchemaRevision, Error> {
    run_to(conn, SchemaRevision::LATEST).await
}

/// Run pending migrations up to and including `target`.
///
/// Returns the revision the database is at afterwards, which is always
/// `target`.
///
/// # Errors
///
/// Returns [`Error::MigrationFailed`] if the database is already past
/// `target` or a migration SQL fails to execute.
pub async fn run_to(conn: &Connection, target: SchemaRevision) -> Result<SchemaRevision, Error> {
    conn.call(move |conn| -> Result<SchemaRevision, Error> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                applied_at TEXT NOT NULL
            )",
            [],
        )
        .map_err(Error::from)?;

        let current = applied_version(conn)?;
        if current > target.version() {
            return Err(Error::MigrationFailed(format!(
                "database is at revision {current}, cannot go back to {target}"
            )));
        }

        for migration in MIGRATIONS
            .iter()
            .filter(|m| m.revision.version() > current && m.revision <= target)
        {
            apply(conn, migration)?;
        }

        Ok(target)
    })
    .await
    .map_err(Error::from)
}

/// Revision the version table says `cache_entries` is at.
///
/// Read inside each `call` so that every handle on the database builds SQL
/// for the table as it is now, even after another handle migrated it.
///
/// # Errors
///
/// Returns [`Error::MigrationFailed`] if no known revision has been applied.
pub(crate) fn stored_revision(conn: &rusqlite::Connection) -> Result<SchemaRevision, Error> {
    let version = applied_version(conn)?;
    SchemaRevision::from_version(version)
        .ok_or_else(|| Error::MigrationFailed(format!("cache_entries is at unknown revision {version}")))
}

fn applied_version(conn: &rusqlite::Connection) -> Result<i64, Error> {
    conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))
        .map_err(Error::from)
}

fn apply(conn: &mut rusqlite::Connection, migration: &Migration) -> Result<(), Error> {
    let tx = conn.transaction()?;

    if let Some(column) = migration.discards {
        let dropped: i64 = tx.query_row(
            &format!("SELECT COUNT(*) FROM cache_entries WHERE {column} IS NOT NULL"),
            [],
            |row| row.get(0),
        )?;
        if dropped > 0 {
            tracing::warn!(
                revision = migration.revision.version(),
                column,
                dropped,
                "migration discards populated column values"
            );
        }
    }

    tx.execute_batch(migration.sql)
        .map_err(|e| Error::MigrationFailed(format!("{}: {e}", migration.revision)))?;
    tx.execute(
        "INSERT INTO _migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
        params![migration.revision.version(), migration.description, chrono::Utc::now().to_rfc3339()],
    )?;
    tx.commit()?;

    tracing::info!(revision = migration.revision.version(), description = migration.description, "applied migration");
    Ok(())
}
