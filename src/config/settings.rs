//! User settings for capsule
//!
//! Manages export preferences, logging and the audit trail toggle. Key
//! derivation parameters live in `crypto::key_derivation` instead: envelopes
//! do not record them.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::paths::CapsulePaths;
use crate::error::CapsuleError;

/// Shortest passphrase any configuration may allow
pub const PASSPHRASE_FLOOR: usize = 8;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Export preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSettings {
    /// Lifetime of signed attachment URLs embedded in an archive
    #[serde(default = "default_signed_url_ttl")]
    pub signed_url_ttl_secs: u64,

    /// Container name used when none is given
    #[serde(default = "default_container_name")]
    pub default_container_name: String,

    /// Where envelopes are written (defaults to the exports directory)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            signed_url_ttl_secs: default_signed_url_ttl(),
            default_container_name: default_container_name(),
            output_dir: None,
        }
    }
}

/// User settings for capsule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    #[serde(default)]
    pub export: ExportSettings,

    /// Minimum passphrase length in characters; never below 8
    #[serde(default = "default_min_passphrase_len")]
    pub min_passphrase_len: usize,

    /// Default tracing filter when `CAPSULE_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Whether exports and restores are appended to audit.log
    #[serde(default = "default_true")]
    pub audit_enabled: bool,
}

fn default_schema_version() -> u32 {
    1
}

fn default_signed_url_ttl() -> u64 {
    3600
}

fn default_container_name() -> String {
    "Memories".to_string()
}

fn default_min_passphrase_len() -> usize {
    PASSPHRASE_FLOOR
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            export: ExportSettings::default(),
            min_passphrase_len: default_min_passphrase_len(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            audit_enabled: true,
        }
    }
}

impl Settings {
    /// Effective minimum passphrase length
    pub fn passphrase_min_len(&self) -> usize {
        self.min_passphrase_len.max(PASSPHRASE_FLOOR)
    }

    /// Directory exported envelopes go to
    pub fn output_dir(&self, paths: &CapsulePaths) -> PathBuf {
        self.export
            .output_dir
            .clone()
            .unwrap_or_else(|| paths.exports_dir())
    }

    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &CapsulePaths) -> Result<Self, CapsuleError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                CapsuleError::Io(format!("Failed to read settings file: {}", e))
            })?;

            serde_json::from_str(&contents).map_err(|e| {
                CapsuleError::Config(format!("Failed to parse settings file: {}", e))
            })
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &CapsulePaths) -> Result<(), CapsuleError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            CapsuleError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| CapsuleError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}
