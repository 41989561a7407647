//! Cache entry operations.
//!
//! Rows are written once and never updated in place. Which inserts collide
//! depends on the schema revision recorded in `_migrations`, which every
//! operation reads in the same call that touches the table.

use super::connection::CacheDb;
use super::migrations;
use super::revision::SchemaRevision;
use crate::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A previously uploaded media object for a source post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CacheEntry {
    pub post_id: i64,
    /// Sent as a native photo rather than a document.
    pub is_photo: bool,
    pub media_id: i64,
    /// Opaque token the destination platform requires alongside `media_id`.
    pub access_hash: i64,
    pub file_url: Option<String>,
    pub mime_type: Option<String>,
    pub cache_date: DateTime<Utc>,
    /// Entry only backs inline previews, not full-file delivery.
    pub is_thumbnail: bool,
    /// Only stored by schema revision 2.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_as_file: Option<bool>,
}

const SELECT_COLUMNS: &str =
    "post_id, is_photo, media_id, access_hash, file_url, mime_type, cache_date, is_thumbnail";

impl CacheEntry {
    fn from_row(row: &rusqlite::Row<'_>, with_sent_as_file: bool) -> rusqlite::Result<Self> {
        let cache_date: String = row.get(6)?;
        let cache_date = DateTime::parse_from_rfc3339(&cache_date)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e)))?
            .with_timezone(&Utc);

        Ok(CacheEntry {
            post_id: row.get(0)?,
            is_photo: row.get::<_, i32>(1)? == 1,
            media_id: row.get(2)?,
            access_hash: row.get(3)?,
            file_url: row.get(4)?,
            mime_type: row.get(5)?,
            cache_date,
            is_thumbnail: row.get::<_, i32>(7)? == 1,
            sent_as_file: if with_sent_as_file { row.get::<_, Option<i32>>(8)?.map(|v| v == 1) } else { None },
        })
    }
}

fn select_sql(revision: SchemaRevision, filter: &str) -> String {
    if revision.has_sent_as_file() {
        format!("SELECT {SELECT_COLUMNS}, sent_as_file FROM cache_entries WHERE {filter} ORDER BY rowid")
    } else {
        format!("SELECT {SELECT_COLUMNS} FROM cache_entries WHERE {filter} ORDER BY rowid")
    }
}

fn insert_row(conn: &rusqlite::Connection, revision: SchemaRevision, entry: &CacheEntry) -> Result<(), Error> {
    let cache_date = entry.cache_date.to_rfc3339();
    if revision.has_sent_as_file() {
        conn.execute(
            "INSERT INTO cache_entries (
                post_id, is_photo, media_id, access_hash, file_url, mime_type, cache_date, is_thumbnail, sent_as_file
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                entry.post_id,
                entry.is_photo as i32,
                entry.media_id,
                entry.access_hash,
                &entry.file_url,
                &entry.mime_type,
                cache_date,
                entry.is_thumbnail as i32,
                entry.sent_as_file.map(|v| v as i32),
            ],
        )?;
    } else {
        conn.execute(
            "INSERT INTO cache_entries (
                post_id, is_photo, media_id, access_hash, file_url, mime_type, cache_date, is_thumbnail
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                entry.post_id,
                entry.is_photo as i32,
                entry.media_id,
                entry.access_hash,
                &entry.file_url,
                &entry.mime_type,
                cache_date,
                entry.is_thumbnail as i32,
            ],
        )?;
    }
    Ok(())
}

fn check_storable(revision: SchemaRevision, entry: &CacheEntry) -> Result<(), Error> {
    if entry.sent_as_file.is_some() && !revision.has_sent_as_file() {
        return Err(Error::InvalidInput(format!("sent_as_file is not stored at {revision}")));
    }
    Ok(())
}

impl CacheDb {
    /// Insert a new cache entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConstraintViolation`] when the revision's uniqueness
    /// index already holds the entry's key. Revision 3 never does.
    pub async fn insert_entry(&self, entry: &CacheEntry) -> Result<(), Error> {
        let entry = entry.clone();
        let post_id = entry.post_id;
        let revision = self
            .conn
            .call(move |conn| -> Result<SchemaRevision, Error> {
                let revision = migrations::stored_revision(conn)?;
                check_storable(revision, &entry)?;
                insert_row(conn, revision, &entry)?;
                Ok(revision)
            })
            .await
            .map_err(Error::from)?;
        self.observe_revision(revision);
        self.entries_gauge().inc();
        tracing::debug!(post_id, revision = revision.version(), "cache entry inserted");
        Ok(())
    }

    /// Replace any rows sharing the entry's key, then insert it.
    ///
    /// The key is `post_id` at revision 1 and `(post_id, is_photo)` after.
    /// Both steps run in one transaction. Returns how many rows were replaced.
    pub async fn save_entry(&self, entry: &CacheEntry) -> Result<u64, Error> {
        let entry = entry.clone();
        let (revision, replaced) = self
            .conn
            .call(move |conn| -> Result<(SchemaRevision, u64), Error> {
                let tx = conn.transaction()?;
                let revision = migrations::stored_revision(&tx)?;
                check_storable(revision, &entry)?;
                let replaced = if revision.replaces_by_representation() {
                    tx.execute(
                        "DELETE FROM cache_entries WHERE post_id = ?1 AND is_photo = ?2",
                        params![entry.post_id, entry.is_photo as i32],
                    )?
                } else {
                    tx.execute("DELETE FROM cache_entries WHERE post_id = ?1", params![entry.post_id])?
                };
                insert_row(&tx, revision, &entry)?;
                tx.commit()?;
                Ok((revision, replaced as u64))
            })
            .await
            .map_err(Error::from)?;
        self.observe_revision(revision);
        self.entries_gauge().add(1 - replaced as i64);
        Ok(replaced)
    }

    /// Every row cached for a post, oldest first.
    pub async fn entries_for_post(&self, post_id: i64) -> Result<Vec<CacheEntry>, Error> {
        let (revision, entries) = self
            .conn
            .call(move |conn| -> Result<(SchemaRevision, Vec<CacheEntry>), Error> {
                let revision = migrations::stored_revision(conn)?;
                let mut stmt = conn.prepare(&select_sql(revision, "post_id = ?1"))?;
                let entries = stmt
                    .query_map(params![post_id], |row| CacheEntry::from_row(row, revision.has_sent_as_file()))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((revision, entries))
            })
            .await
            .map_err(Error::from)?;
        self.observe_revision(revision);
        Ok(entries)
    }

    /// Get the entry for one representation of a post.
    ///
    /// Returns None if nothing matches.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AmbiguousEntry`] when more than one row matches, which
    /// only revision 3 allows. Use [`CacheDb::entries_for_post`] to see them.
    pub async fn find_entry(&self, post_id: i64, is_photo: bool) -> Result<Option<CacheEntry>, Error> {
        let mut matches: Vec<CacheEntry> = self
            .entries_for_post(post_id)
            .await?
            .into_iter()
            .filter(|e| e.is_photo == is_photo)
            .collect();

        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.pop()),
            n => Err(Error::AmbiguousEntry { post_id, is_photo, matches: n }),
        }
    }

    /// Like [`CacheDb::find_entry`], but a miss is [`Error::NotFound`].
    pub async fn lookup(&self, post_id: i64, is_photo: bool) -> Result<CacheEntry, Error> {
        self.find_entry(post_id, is_photo)
            .await?
            .ok_or_else(|| Error::NotFound(format!("post {post_id} (is_photo={is_photo})")))
    }

    /// Total number of cached rows.
    pub async fn count_entries(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
