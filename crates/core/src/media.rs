//! Delivery-side view of the cache.
//!
//! The store itself never chooses between rows. This layer does, for the
//! bot's two use cases: full-file delivery, which must never get a
//! thumbnail, and inline results, which may.

use crate::Error;
use crate::cache::{CacheDb, CacheEntry};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Media that has just been uploaded to the destination platform.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct UploadedMedia {
    pub post_id: i64,
    pub is_photo: bool,
    pub media_id: i64,
    pub access_hash: i64,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub is_thumbnail: bool,
    #[serde(default)]
    pub sent_as_file: Option<bool>,
}

impl UploadedMedia {
    /// Cache entry for this upload, dated now.
    pub fn into_entry(self) -> CacheEntry {
        CacheEntry {
            post_id: self.post_id,
            is_photo: self.is_photo,
            media_id: self.media_id,
            access_hash: self.access_hash,
            file_url: self.file_url,
            mime_type: self.mime_type,
            cache_date: Utc::now(),
            is_thumbnail: self.is_thumbnail,
            sent_as_file: self.sent_as_file,
        }
    }
}

#[derive(Clone, Debug)]
pub struct MediaCache {
    db: CacheDb,
}

impl MediaCache {
    pub fn new(db: CacheDb) -> Self {
        Self { db }
    }

    pub fn store(&self) -> &CacheDb {
        &self.db
    }

    /// Record an upload, replacing whatever was cached for the same key.
    pub async fn save(&self, upload: UploadedMedia) -> Result<CacheEntry, Error> {
        let entry = upload.into_entry();
        let replaced = self.db.save_entry(&entry).await?;
        tracing::debug!(post_id = entry.post_id, is_photo = entry.is_photo, replaced, "saved media");
        Ok(entry)
    }

    /// Record an upload only if nothing holds its key yet.
    pub async fn insert(&self, upload: UploadedMedia) -> Result<CacheEntry, Error> {
        let entry = upload.into_entry();
        self.db.insert_entry(&entry).await?;
        Ok(entry)
    }

    /// Pick the entry to deliver for one representation of a post.
    ///
    /// Thumbnails are skipped unless `allow_inline` is set. A full entry
    /// beats a thumbnail; between equals the oldest row wins, the one a
    /// plain `SELECT` would have returned first.
    pub async fn load(&self, post_id: i64, is_photo: bool, allow_inline: bool) -> Result<Option<CacheEntry>, Error> {
        let candidates = self.db.entries_for_post(post_id).await?;
        let total = candidates.len();

        let chosen = candidates
            .into_iter()
            .enumerate()
            .filter(|(_, e)| e.is_photo == is_photo && (allow_inline || !e.is_thumbnail))
            .min_by_key(|(order, e)| (e.is_thumbnail, *order))
            .map(|(_, e)| e);

        if chosen.is_none() && total > 0 {
            tracing::debug!(post_id, is_photo, allow_inline, total, "no deliverable entry among cached rows");
        }
        Ok(chosen)
    }
}
