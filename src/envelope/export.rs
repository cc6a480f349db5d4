//! Export state machine
//!
//! ```text
//! Idle -> PasswordEntered -> Building -> DerivingKey -> Encrypting -> Framed -> Downloaded -> Idle
//! ```
//!
//! Any failure returns the flow to `Idle` without writing a file.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::archive;
use crate::crypto::{self, generate_nonce, generate_salt, SecureString};
use crate::error::{CapsuleError, CapsuleResult};
use crate::models::{Record, RecordId, RestoreKind};
use crate::storage::{write_new, AuthProvider, BlobStore, RecordFilter, RecordStore};

use super::frame::Envelope;
use super::{check_passphrase, envelope_key};

/// Export states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportState {
    Idle,
    PasswordEntered,
    Building,
    DerivingKey,
    Encrypting,
    Framed,
    Downloaded,
}

impl fmt::Display for ExportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExportState::Idle => "idle",
            ExportState::PasswordEntered => "password entered",
            ExportState::Building => "building archive",
            ExportState::DerivingKey => "deriving key",
            ExportState::Encrypting => "encrypting",
            ExportState::Framed => "framed",
            ExportState::Downloaded => "downloaded",
        };
        f.write_str(label)
    }
}

/// Current export state plus every state visited by the last run
#[derive(Debug, Clone)]
pub struct ExportFlow {
    state: ExportState,
    visited: Vec<ExportState>,
}

impl Default for ExportFlow {
    fn default() -> Self {
        Self {
            state: ExportState::Idle,
            visited: vec![ExportState::Idle],
        }
    }
}

impl ExportFlow {
    pub fn state(&self) -> ExportState {
        self.state
    }

    /// States visited by the most recent run, starting at `Idle`
    pub fn visited(&self) -> &[ExportState] {
        &self.visited
    }

    fn begin(&mut self) {
        *self = Self::default();
    }

    fn advance(&mut self, next: ExportState) {
        debug!(from = %self.state, to = %next, "export state");
        self.state = next;
        self.visited.push(next);
    }

    fn reset(&mut self) {
        if self.state != ExportState::Idle {
            debug!(from = %self.state, "export returned to idle");
        }
        self.state = ExportState::Idle;
        self.visited.push(ExportState::Idle);
    }
}

/// What to export and how to lock it
pub struct ExportRequest {
    pub records: Vec<Record>,
    pub container_name: String,
    pub kind: RestoreKind,
    pub passphrase: SecureString,
}

/// A framed envelope ready to be written
#[derive(Debug, Clone)]
pub struct ExportedEnvelope {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub record_count: usize,
    pub container_name: String,
    pub exported_at: DateTime<Utc>,
}

/// Drives exports; `&mut self` keeps one export in flight per exporter
pub struct Exporter {
    min_passphrase_len: usize,
    flow: ExportFlow,
}

impl Exporter {
    pub fn new(min_passphrase_len: usize) -> Self {
        Self {
            min_passphrase_len,
            flow: ExportFlow::default(),
        }
    }

    pub fn flow(&self) -> &ExportFlow {
        &self.flow
    }

    /// Build, encrypt and frame `request`; ends in `Framed`
    pub fn export(&mut self, request: &ExportRequest) -> CapsuleResult<ExportedEnvelope> {
        self.flow.begin();
        let result = self.run(request);
        if result.is_err() {
            self.flow.reset();
        }
        result
    }

    /// Export and write the envelope into `dir`; returns the file path
    ///
    /// An existing file is never replaced: a name already taken gets a
    /// `-1`, `-2`, ... suffix.
    pub fn export_to(&mut self, request: &ExportRequest, dir: &Path) -> CapsuleResult<PathBuf> {
        let exported = self.export(request)?;

        let path = match write_new(dir, &exported.file_name, &exported.bytes) {
            Ok(path) => path,
            Err(e) => {
                self.flow.reset();
                return Err(match e {
                    CapsuleError::Storage(msg) => CapsuleError::Io(msg),
                    other => other,
                });
            }
        };

        self.flow.advance(ExportState::Downloaded);
        info!(
            file = %path.display(),
            records = exported.record_count,
            bytes = exported.bytes.len(),
            "export written"
        );
        self.flow.reset();
        Ok(path)
    }

    fn run(&mut self, request: &ExportRequest) -> CapsuleResult<ExportedEnvelope> {
        check_passphrase(&request.passphrase, self.min_passphrase_len)?;
        self.flow.advance(ExportState::PasswordEntered);

        self.flow.advance(ExportState::Building);
        let exported_at = Utc::now();
        let blob = archive::build_at(
            &request.records,
            &request.container_name,
            request.kind,
            exported_at,
        )?;

        self.flow.advance(ExportState::DerivingKey);
        let salt = generate_salt();
        let key = envelope_key(&request.passphrase, &salt)?;

        self.flow.advance(ExportState::Encrypting);
        let nonce = generate_nonce();
        let ciphertext = crypto::encrypt(&key, &nonce, &blob)?;

        let bytes = Envelope {
            salt,
            nonce,
            ciphertext,
        }
        .to_bytes();
        self.flow.advance(ExportState::Framed);

        Ok(ExportedEnvelope {
            file_name: archive::suggested_file_name(&request.container_name, exported_at),
            bytes,
            record_count: request.records.len(),
            container_name: request.container_name.clone(),
            exported_at,
        })
    }
}

/// Collect the signed-in user's records for export
///
/// With a non-empty `ids` only those records are taken, and an id that does
/// not belong to the user is an error. Attachments stored in the blob store
/// are replaced by signed URLs valid for `ttl_secs`.
pub fn gather_records<S, B, A>(
    store: &S,
    blobs: &B,
    auth: &A,
    ids: &[RecordId],
    kind: RestoreKind,
    ttl_secs: u64,
) -> CapsuleResult<Vec<Record>>
where
    S: RecordStore + ?Sized,
    B: BlobStore + ?Sized,
    A: AuthProvider + ?Sized,
{
    let user_id = auth.current_user_id().ok_or_else(|| {
        CapsuleError::Validation("You must be signed in to export memories".to_string())
    })?;

    let mut filter =
        RecordFilter::for_user(user_id).capsules_only(kind == RestoreKind::TimeCapsules);
    if !ids.is_empty() {
        filter = filter.with_ids(ids.to_vec());
    }

    let records = store.query(&filter)?;

    if let Some(missing) = ids.iter().find(|id| !records.iter().any(|r| &r.id == *id)) {
        return Err(CapsuleError::record_not_found(missing.as_str()));
    }

    Ok(records
        .into_iter()
        .map(|record| sign_attachments(record, blobs, ttl_secs))
        .collect())
}

fn sign_attachments<B: BlobStore + ?Sized>(mut record: Record, blobs: &B, ttl_secs: u64) -> Record {
    let Some(metadata) = record.metadata.as_mut() else {
        return record;
    };

    for attachment in metadata.attachments.iter_mut() {
        if attachment.is_remote() {
            continue;
        }
        match blobs.signed_url(attachment.url(), ttl_secs) {
            Ok(url) => *attachment = attachment.with_url(url),
            Err(e) => warn!(
                record = %record.id,
                path = attachment.url(),
                "attachment left unsigned: {e}"
            ),
        }
    }
    record
}
