//! Record repository for JSON storage
//!
//! Manages loading and saving memory records to records.json. An `upsert` is
//! one atomic file write, so a batch lands completely or not at all.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::CapsuleError;
use crate::models::{Record, RecordId};

use super::file_io::{read_json, write_json_atomic};
use super::{RecordFilter, RecordStore};

/// Serializable record data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct RecordData {
    records: Vec<Record>,
}

/// File-backed record store
pub struct JsonRecordStore {
    path: PathBuf,
    data: RwLock<HashMap<RecordId, Record>>,
}

impl JsonRecordStore {
    /// Create a new record store backed by `path`
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Create a store and load its contents from disk
    pub fn open(path: PathBuf) -> Result<Self, CapsuleError> {
        let store = Self::new(path);
        store.load()?;
        Ok(store)
    }

    /// Load records from disk
    pub fn load(&self) -> Result<(), CapsuleError> {
        let file_data: RecordData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(|e| {
            CapsuleError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.clear();
        for record in file_data.records {
            data.insert(record.id.clone(), record);
        }

        Ok(())
    }

    /// Number of stored records
    pub fn count(&self) -> Result<usize, CapsuleError> {
        let data = self.data.read().map_err(|e| {
            CapsuleError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(data.len())
    }

    fn persist(&self, data: &HashMap<RecordId, Record>) -> Result<(), CapsuleError> {
        let file_data = RecordData {
            records: sorted(data.values().cloned().collect()),
        };
        write_json_atomic(&self.path, &file_data)
    }
}

impl RecordStore for JsonRecordStore {
    fn query(&self, filter: &RecordFilter) -> Result<Vec<Record>, CapsuleError> {
        let data = self.data.read().map_err(|e| {
            CapsuleError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let records = data
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();

        Ok(sorted(records))
    }

    fn upsert(&self, records: Vec<Record>) -> Result<usize, CapsuleError> {
        let mut data = self.data.write().map_err(|e| {
            CapsuleError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        // Stage the merge so a failed write leaves memory and disk in agreement
        let mut staged = data.clone();
        let count = records.len();
        for record in records {
            staged.insert(record.id.clone(), record);
        }

        self.persist(&staged)?;
        *data = staged;

        Ok(count)
    }

    fn delete(&self, id: &RecordId) -> Result<bool, CapsuleError> {
        let mut data = self.data.write().map_err(|e| {
            CapsuleError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        if !data.contains_key(id) {
            return Ok(false);
        }

        let mut staged = data.clone();
        staged.remove(id);
        self.persist(&staged)?;
        *data = staged;

        Ok(true)
    }
}

/// Newest first, ties broken by id for a stable order
fn sorted(mut records: Vec<Record>) -> Vec<Record> {
    records.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    records
}
