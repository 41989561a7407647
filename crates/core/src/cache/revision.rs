//! Schema revisions of the `cache_entries` table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three shapes `cache_entries` has had.
///
/// Each revision loosens the uniqueness guarantee of the one before it.
/// Revision 3 enforces nothing at the storage layer; callers that need a
/// single row per post must arrange that themselves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum SchemaRevision {
    /// At most one row per `post_id`.
    UniquePost = 1,
    /// At most one row per `(post_id, is_photo)`; adds `sent_as_file`.
    UniqueRepresentation = 2,
    /// No uniqueness index.
    #[default]
    Unconstrained = 3,
}

impl SchemaRevision {
    pub const LATEST: SchemaRevision = SchemaRevision::Unconstrained;

    pub const ALL: [SchemaRevision; 3] =
        [SchemaRevision::UniquePost, SchemaRevision::UniqueRepresentation, SchemaRevision::Unconstrained];

    /// Version number recorded in the `_migrations` table.
    pub fn version(self) -> i64 {
        self as i64
    }

    pub fn from_version(version: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.version() == version)
    }

    /// Whether rows at this revision carry the `sent_as_file` column.
    pub fn has_sent_as_file(self) -> bool {
        matches!(self, SchemaRevision::UniqueRepresentation)
    }

    /// Whether a resave replaces rows by `(post_id, is_photo)` rather than
    /// by `post_id` alone.
    ///
    /// Revision 3 has no index of its own, so a resave there replaces by
    /// representation like revision 2 does.
    pub fn replaces_by_representation(self) -> bool {
        !matches!(self, SchemaRevision::UniquePost)
    }
}

impl fmt::Display for SchemaRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "revision {}", self.version())
    }
}

impl From<SchemaRevision> for i64 {
    fn from(revision: SchemaRevision) -> Self {
        revision.version()
    }
}

impl TryFrom<i64> for SchemaRevision {
    type Error = String;

    fn try_from(version: i64) -> Result<Self, Self::Error> {
        Self::from_version(version).ok_or_else(|| format!("unknown schema revision {version}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_are_ordered() {
        assert!(SchemaRevision::UniquePost < SchemaRevision::UniqueRepresentation);
        assert!(SchemaRevision::UniqueRepresentation < SchemaRevision::Unconstrained);
        assert_eq!(SchemaRevision::LATEST.version(), 3);
    }

    #[test]
    fn test_from_version() {
        assert_eq!(SchemaRevision::from_version(2), Some(SchemaRevision::UniqueRepresentation));
        assert_eq!(SchemaRevision::from_version(0), None);
        assert_eq!(SchemaRevision::from_version(4), None);
    }

    #[test]
    fn test_sent_as_file_only_in_revision_two() {
        assert!(!SchemaRevision::UniquePost.has_sent_as_file());
        assert!(SchemaRevision::UniqueRepresentation.has_sent_as_file());
        assert!(!SchemaRevision::Unconstrained.has_sent_as_file());
    }

    #[test]
    fn test_serde_as_number() {
        assert_eq!(serde_json::to_string(&SchemaRevision::UniquePost).unwrap(), "1");
        let parsed: SchemaRevision = serde_json::from_str("3").unwrap();
        assert_eq!(parsed, SchemaRevision::Unconstrained);
        assert!(serde_json::from_str::<SchemaRevision>("9").is_err());
    }
}
