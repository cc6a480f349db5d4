//! Audit entry data structures
//!
//! One entry per export or restore attempt, successful or not.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Types of operations that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// An encrypted envelope was produced
    Export,
    /// An envelope was decrypted and upserted
    Restore,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Export => write!(f, "EXPORT"),
            Operation::Restore => write!(f, "RESTORE"),
        }
    }
}

/// How the operation ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure { message: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// A single audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the operation occurred (UTC)
    pub timestamp: DateTime<Utc>,

    pub operation: Operation,

    /// Container name from the manifest, when one is known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,

    /// Records exported or restored
    pub records: usize,

    /// Records dropped by restore validation
    #[serde(default)]
    pub dropped: usize,

    /// Envelope file involved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    pub outcome: Outcome,
}

impl AuditEntry {
    /// Entry for a finished export
    pub fn export(container: impl Into<String>, records: usize, file: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            operation: Operation::Export,
            container: Some(container.into()),
            records,
            dropped: 0,
            file: Some(file.into()),
            outcome: Outcome::Success,
        }
    }

    /// Entry for a finished restore
    pub fn restore(container: impl Into<String>, restored: usize, dropped: usize) -> Self {
        Self {
            timestamp: Utc::now(),
            operation: Operation::Restore,
            container: Some(container.into()),
            records: restored,
            dropped,
            file: None,
            outcome: Outcome::Success,
        }
    }

    /// Entry for an operation that failed
    pub fn failure(operation: Operation, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            container: None,
            records: 0,
            dropped: 0,
            file: None,
            outcome: Outcome::Failure {
                message: message.into(),
            },
        }
    }

    /// Attach the envelope file name
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// One-line summary for terminal output
    pub fn format_human_readable(&self) -> String {
        let when = self.timestamp.format("%Y-%m-%d %H:%M:%S");
        let container = self
            .container
            .as_deref()
            .map(|c| format!(" \"{}\"", c))
            .unwrap_or_default();

        match &self.outcome {
            Outcome::Success if self.dropped > 0 => format!(
                "{} {}{}: {} record(s), {} dropped",
                when, self.operation, container, self.records, self.dropped
            ),
            Outcome::Success => format!(
                "{} {}{}: {} record(s)",
                when, self.operation, container, self.records
            ),
            Outcome::Failure { message } => {
                format!("{} {}{}: FAILED ({})", when, self.operation, container, message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_entry() {
        let entry = AuditEntry::export("Test Capsule", 3, "test-capsule.bin");
        assert_eq!(entry.operation, Operation::Export);
        assert!(entry.outcome.is_success());
        assert_eq!(entry.file.as_deref(), Some("test-capsule.bin"));
    }

    #[test]
    fn test_serialization() {
        let entry = AuditEntry::failure(Operation::Restore, "invalid backup file");
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"operation\":\"restore\""));
        assert!(json.contains("\"status\":\"failure\""));

        let back: AuditEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.outcome, entry.outcome);
    }

    #[test]
    fn test_human_readable() {
        let entry = AuditEntry::restore("Summer", 7, 2);
        let line = entry.format_human_readable();
        assert!(line.contains("RESTORE \"Summer\""));
        assert!(line.contains("7 record(s), 2 dropped"));

        let failed = AuditEntry::failure(Operation::Export, "failed to encrypt backup");
        assert!(failed.format_human_readable().contains("FAILED"));
    }
}
