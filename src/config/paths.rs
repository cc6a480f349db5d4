//! Path management for capsule
//!
//! ## Path Resolution Order
//!
//! 1. `CAPSULE_DATA_DIR` environment variable (if set)
//! 2. The platform config directory (`~/.config/capsule` on Linux,
//!    `~/Library/Application Support/capsule` on macOS, `%APPDATA%\capsule`
//!    on Windows)

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::CapsuleError;

/// Environment variable overriding the base directory
pub const DATA_DIR_ENV: &str = "CAPSULE_DATA_DIR";

/// Manages all paths used by capsule
#[derive(Debug, Clone)]
pub struct CapsulePaths {
    base_dir: PathBuf,
}

impl CapsulePaths {
    /// Create a new CapsulePaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> Result<Self, CapsuleError> {
        let base_dir = match std::env::var_os(DATA_DIR_ENV) {
            Some(custom) if !custom.is_empty() => PathBuf::from(custom),
            _ => ProjectDirs::from("", "", "capsule")
                .map(|dirs| dirs.config_dir().to_path_buf())
                .ok_or_else(|| {
                    CapsuleError::Config("Could not determine a home directory".into())
                })?,
        };

        Ok(Self { base_dir })
    }

    /// Create CapsulePaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Record store directory
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Default destination for exported envelopes
    pub fn exports_dir(&self) -> PathBuf {
        self.base_dir.join("exports")
    }

    /// Root of the local media blob store
    pub fn media_dir(&self) -> PathBuf {
        self.base_dir.join("media")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    pub fn session_file(&self) -> PathBuf {
        self.base_dir.join("session.json")
    }

    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    pub fn records_file(&self) -> PathBuf {
        self.data_dir().join("records.json")
    }

    /// Per-install key for media link signatures
    pub fn blob_key_file(&self) -> PathBuf {
        self.data_dir().join("blob.key")
    }

    /// Ensure all required directories exist
    pub fn ensure_directories(&self) -> Result<(), CapsuleError> {
        for dir in [
            self.base_dir.clone(),
            self.data_dir(),
            self.exports_dir(),
            self.media_dir(),
        ] {
            std::fs::create_dir_all(&dir).map_err(|e| {
                CapsuleError::Io(format!("Failed to create {}: {}", dir.display(), e))
            })?;
        }
        Ok(())
    }

    /// Check if capsule has been initialized (config file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}
