//! Import state machine
//!
//! ```text
//! Idle -> FileSelected -> PasswordEntered -> Parsing -> DerivingKey -> Decrypting
//!      -> ParsingArchive -> Validating -> Upserting -> Done -> Idle
//! ```
//!
//! The store is written at most once per restore, with every surviving
//! record in a single batch. Nothing is written unless decryption, archive
//! parsing and validation all succeed.

use std::fmt;

use tracing::{debug, info, warn};

use crate::archive::{self, Manifest};
use crate::crypto::{self, SecureString};
use crate::error::{CapsuleError, CapsuleResult};
use crate::models::{Record, RestoreKind};
use crate::storage::{AuthProvider, RecordStore};

use super::envelope_key;
use super::frame::Envelope;

/// Import states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportState {
    Idle,
    FileSelected,
    PasswordEntered,
    Parsing,
    DerivingKey,
    Decrypting,
    ParsingArchive,
    Validating,
    Upserting,
    Done,
}

impl fmt::Display for ImportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ImportState::Idle => "idle",
            ImportState::FileSelected => "file selected",
            ImportState::PasswordEntered => "password entered",
            ImportState::Parsing => "parsing envelope",
            ImportState::DerivingKey => "deriving key",
            ImportState::Decrypting => "decrypting",
            ImportState::ParsingArchive => "parsing archive",
            ImportState::Validating => "validating",
            ImportState::Upserting => "upserting",
            ImportState::Done => "done",
        };
        f.write_str(label)
    }
}

/// Current import state plus every state visited by the last run
#[derive(Debug, Clone)]
pub struct ImportFlow {
    state: ImportState,
    visited: Vec<ImportState>,
}

impl Default for ImportFlow {
    fn default() -> Self {
        Self {
            state: ImportState::Idle,
            visited: vec![ImportState::Idle],
        }
    }
}

impl ImportFlow {
    pub fn state(&self) -> ImportState {
        self.state
    }

    /// States visited by the most recent run, starting at `Idle`
    pub fn visited(&self) -> &[ImportState] {
        &self.visited
    }

    pub fn reached(&self, state: ImportState) -> bool {
        self.visited.contains(&state)
    }

    fn begin(&mut self) {
        *self = Self::default();
    }

    fn advance(&mut self, next: ImportState) {
        debug!(from = %self.state, to = %next, "import state");
        self.state = next;
        self.visited.push(next);
    }

    fn reset(&mut self) {
        if self.state != ImportState::Idle {
            debug!(from = %self.state, "import returned to idle");
        }
        self.state = ImportState::Idle;
        self.visited.push(ImportState::Idle);
    }
}

/// Outcome of a successful restore
#[derive(Debug, Clone)]
pub struct RestoreReport {
    pub manifest: Manifest,
    pub kind: RestoreKind,
    pub restored: usize,
    pub dropped: usize,
}

impl RestoreReport {
    /// e.g. "Restored 7 time capsules"
    pub fn summary(&self) -> String {
        format!("Restored {} {}", self.restored, self.kind.noun(self.restored))
    }
}

/// Drives restores into a record store on behalf of the signed-in user
pub struct Restorer<'a, S: RecordStore + ?Sized, A: AuthProvider + ?Sized> {
    store: &'a S,
    auth: &'a A,
    flow: ImportFlow,
}

impl<'a, S: RecordStore + ?Sized, A: AuthProvider + ?Sized> Restorer<'a, S, A> {
    pub fn new(store: &'a S, auth: &'a A) -> Self {
        Self {
            store,
            auth,
            flow: ImportFlow::default(),
        }
    }

    pub fn flow(&self) -> &ImportFlow {
        &self.flow
    }

    /// Decrypt `envelope`, validate its records for `kind`, and upsert the
    /// survivors as the current user's
    pub fn restore(
        &mut self,
        envelope: &[u8],
        passphrase: &SecureString,
        kind: RestoreKind,
    ) -> CapsuleResult<RestoreReport> {
        self.flow.begin();
        let result = self.run(envelope, passphrase, kind);
        match &result {
            Ok(_) => {
                self.flow.advance(ImportState::Done);
                self.flow.reset();
            }
            Err(e) => {
                debug!(state = %self.flow.state(), "restore failed: {e}");
                self.flow.reset();
            }
        }
        result
    }

    fn run(
        &mut self,
        envelope: &[u8],
        passphrase: &SecureString,
        kind: RestoreKind,
    ) -> CapsuleResult<RestoreReport> {
        self.flow.advance(ImportState::FileSelected);

        let user_id = self.auth.current_user_id().ok_or_else(|| {
            CapsuleError::Validation("You must be signed in to restore a backup".to_string())
        })?;

        if passphrase.is_empty() {
            return Err(CapsuleError::Validation(
                "Enter the password used for this backup".to_string(),
            ));
        }
        self.flow.advance(ImportState::PasswordEntered);

        self.flow.advance(ImportState::Parsing);
        let envelope = Envelope::from_bytes(envelope)?;

        self.flow.advance(ImportState::DerivingKey);
        let key = envelope_key(passphrase, &envelope.salt)
            .map_err(|_| CapsuleError::AuthenticationFailure)?;

        self.flow.advance(ImportState::Decrypting);
        let plaintext = crypto::decrypt(&key, &envelope.nonce, &envelope.ciphertext)?;

        self.flow.advance(ImportState::ParsingArchive);
        let archive = archive::parse(&plaintext)?;
        if archive.manifest.kind != kind {
            debug!(
                archived = %archive.manifest.kind,
                requested = %kind,
                "restoring archive into a different collection"
            );
        }

        self.flow.advance(ImportState::Validating);
        let total = archive.records.len();
        let mut valid: Vec<Record> = Vec::with_capacity(total);
        for mut record in archive.records {
            match record.check_restorable(kind) {
                Ok(()) => {
                    record.user_id = Some(user_id.clone());
                    valid.push(record);
                }
                Err(reason) => debug!(record = %record.id, %reason, "record dropped"),
            }
        }

        let dropped = total - valid.len();
        if valid.is_empty() {
            return Err(CapsuleError::NoValidRecords { dropped });
        }
        if dropped > 0 {
            warn!(dropped, total, "some records failed validation and were skipped");
        }

        self.flow.advance(ImportState::Upserting);
        let restored = self.store.upsert(valid).map_err(|e| match e {
            CapsuleError::Storage(msg) => CapsuleError::Storage(msg),
            other => CapsuleError::Storage(other.to_string()),
        })?;

        info!(
            container = %archive.manifest.name,
            restored,
            dropped,
            "restore complete"
        );

        Ok(RestoreReport {
            manifest: archive.manifest,
            kind,
            restored,
            dropped,
        })
    }
}
