//! Custom error types for capsule
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions. Every failure inside the export/restore
//! pipeline ends up as one of these variants, and `user_message` turns it into
//! the single line shown to the user.

use thiserror::Error;

/// The main error type for capsule operations
#[derive(Error, Debug)]
pub enum CapsuleError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Input rejected before any cryptographic work (short passphrase,
    /// nothing selected, not signed in)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Input is too short or otherwise cannot be an envelope
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// AEAD tag did not verify (wrong passphrase or corrupted file)
    #[error("Authentication failure: ciphertext did not verify")]
    AuthenticationFailure,

    /// Decrypted plaintext is not a well-formed archive
    #[error("Malformed archive: {0}")]
    MalformedArchive(String),

    /// Every record in the archive failed validation
    #[error("No valid records: all {dropped} record(s) failed validation")]
    NoValidRecords { dropped: usize },

    /// The key derivation primitive rejected its inputs
    #[error("Key derivation error: {0}")]
    KeyDerivation(String),

    /// Cipher setup or encryption failure
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Record store errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl CapsuleError {
    /// Create a "not found" error for records
    pub fn record_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Memory",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for media blobs
    pub fn blob_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Media file",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// The one line reported to the user for this failure
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::MalformedEnvelope(_) => "invalid backup file".to_string(),
            Self::AuthenticationFailure => {
                "failed to decrypt — check your password or file integrity".to_string()
            }
            Self::MalformedArchive(_) => "invalid backup contents".to_string(),
            Self::NoValidRecords { .. } => "no valid memories found in backup".to_string(),
            Self::Storage(msg) => format!("failed to restore backup: {}", msg),
            Self::KeyDerivation(_) | Self::Encryption(_) => {
                "failed to encrypt backup".to_string()
            }
            other => other.to_string(),
        }
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for CapsuleError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CapsuleError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for capsule operations
pub type CapsuleResult<T> = Result<T, CapsuleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CapsuleError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_not_found_error() {
        let err = CapsuleError::record_not_found("mem-1234");
        assert_eq!(err.to_string(), "Memory not found: mem-1234");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_user_messages_are_single_lines() {
        let errors = [
            CapsuleError::MalformedEnvelope("too short".into()),
            CapsuleError::AuthenticationFailure,
            CapsuleError::MalformedArchive("missing manifest".into()),
            CapsuleError::NoValidRecords { dropped: 4 },
            CapsuleError::Storage("disk full".into()),
        ];
        for err in &errors {
            assert!(!err.user_message().contains('\n'));
        }
        assert_eq!(errors[0].user_message(), "invalid backup file");
        assert_eq!(
            errors[3].user_message(),
            "no valid memories found in backup"
        );
        assert_eq!(errors[4].user_message(), "failed to restore backup: disk full");
    }

    #[test]
    fn test_authentication_message_mentions_password() {
        let msg = CapsuleError::AuthenticationFailure.user_message();
        assert!(msg.contains("check your password"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CapsuleError = io_err.into();
        assert!(matches!(err, CapsuleError::Io(_)));
    }
}
