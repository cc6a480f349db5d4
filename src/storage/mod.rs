//! Storage layer for capsule
//!
//! The export/restore pipeline only talks to three narrow collaborators:
//!
//! - `RecordStore`: query and batch-upsert memory records (merge by id)
//! - `BlobStore`: turn a media path into a time-limited signed URL
//! - `AuthProvider`: who is signed in
//!
//! Local JSON-file implementations of all three live here, wired together by
//! `Storage`.

pub mod blobs;
pub mod file_io;
pub mod records;
pub mod session;

pub use blobs::LocalBlobStore;
pub use file_io::{read_json, write_atomic, write_json_atomic, write_new};
pub use records::JsonRecordStore;
pub use session::LocalSession;

use crate::config::paths::CapsulePaths;
use crate::error::CapsuleError;
use crate::models::{Record, RecordId, UserId};

/// Persistent store of memory records
pub trait RecordStore {
    /// Records matching `filter`, newest first
    fn query(&self, filter: &RecordFilter) -> Result<Vec<Record>, CapsuleError>;

    /// Insert or overwrite every record by id in one batch; returns the count
    fn upsert(&self, records: Vec<Record>) -> Result<usize, CapsuleError>;

    /// Remove a record; false if it did not exist
    fn delete(&self, id: &RecordId) -> Result<bool, CapsuleError>;
}

/// Object storage for media attachments
pub trait BlobStore {
    fn signed_url(&self, path: &str, ttl_secs: u64) -> Result<String, CapsuleError>;
}

/// Authentication / session provider
pub trait AuthProvider {
    fn current_user_id(&self) -> Option<UserId>;
    fn sign_in(&self, user_id: UserId) -> Result<(), CapsuleError>;
    fn sign_out(&self) -> Result<(), CapsuleError>;
}

/// Record query filter
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    /// Only records owned by this user
    pub user_id: Option<UserId>,
    /// Only these ids
    pub ids: Option<Vec<RecordId>>,
    /// Only time-capsule entries
    pub capsules_only: bool,
}

impl RecordFilter {
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    pub fn with_ids(mut self, ids: Vec<RecordId>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn capsules_only(mut self, capsules_only: bool) -> Self {
        self.capsules_only = capsules_only;
        self
    }

    pub fn matches(&self, record: &Record) -> bool {
        if let Some(user) = &self.user_id {
            if record.user_id.as_ref() != Some(user) {
                return false;
            }
        }
        if let Some(ids) = &self.ids {
            if !ids.contains(&record.id) {
                return false;
            }
        }
        !self.capsules_only || record.capsule.is_some()
    }
}

/// Main storage coordinator that provides access to the local collaborators
pub struct Storage {
    paths: CapsulePaths,
    pub records: JsonRecordStore,
    pub blobs: LocalBlobStore,
    pub session: LocalSession,
}

impl Storage {
    /// Open storage under `paths`, creating directories as needed
    pub fn open(paths: CapsulePaths) -> Result<Self, CapsuleError> {
        paths.ensure_directories()?;

        Ok(Self {
            records: JsonRecordStore::open(paths.records_file())?,
            blobs: LocalBlobStore::open(paths.media_dir(), &paths.blob_key_file())?,
            session: LocalSession::open(paths.session_file())?,
            paths,
        })
    }

    /// Get the paths configuration
    pub fn paths(&self) -> &CapsulePaths {
        &self.paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_storage_creation() {
        let temp_dir = TempDir::new().unwrap();
        let paths = CapsulePaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(paths).unwrap();

        assert!(temp_dir.path().join("data").exists());
        assert!(temp_dir.path().join("media").exists());
        assert!(storage.session.current_user_id().is_none());
    }

    #[test]
    fn test_filter_matches_owner() {
        let record = Record::new(UserId::from_string("alice"), "t", "c");
        assert!(RecordFilter::for_user(UserId::from_string("alice")).matches(&record));
        assert!(!RecordFilter::for_user(UserId::from_string("bob")).matches(&record));
        assert!(RecordFilter::default().matches(&record));
        assert!(!RecordFilter::default().capsules_only(true).matches(&record));
    }
}
