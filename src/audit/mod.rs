//! Audit logging system for capsule
//!
//! Records every export and restore attempt in an append-only, line-delimited
//! JSON log (audit.log).
//!
//! # Example
//!
//! ```rust,ignore
//! use capsule::audit::{AuditEntry, AuditLogger};
//!
//! let logger = AuditLogger::new(paths.audit_log());
//! logger.log(&AuditEntry::export("Test Capsule", 3, "test-capsule.bin"))?;
//! ```

mod entry;
mod logger;

pub use entry::{AuditEntry, Operation, Outcome};
pub use logger::AuditLogger;
