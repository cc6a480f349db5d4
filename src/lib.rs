//! Capsule - password-locked export and restore for a memory journal
//!
//! This library packages a user's memories (or time-capsule entries) into an
//! archive, encrypts it under a key derived from a password, and restores
//! such envelopes back into the record store with per-record validation.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Memory records, attachments and ids
//! - `archive`: Archive builder (manifest + records + notes)
//! - `crypto`: PBKDF2 key derivation and AES-256-GCM
//! - `envelope`: Envelope framing and the export/import state machines
//! - `storage`: Record store, blob store and session collaborators
//! - `audit`: Audit logging of exports and restores
//! - `display`: Terminal formatting
//! - `cli`: Command handlers
//!
//! # Example
//!
//! ```rust,ignore
//! use capsule::envelope::{ExportRequest, Exporter};
//!
//! let mut exporter = Exporter::new(settings.passphrase_min_len());
//! let path = exporter.export_to(&request, &paths.exports_dir())?;
//! ```

pub mod archive;
pub mod audit;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod display;
pub mod envelope;
pub mod error;
pub mod models;
pub mod storage;

pub use error::{CapsuleError, CapsuleResult};
