//! Configuration module for capsule
//!
//! This module provides configuration management including:
//! - Platform-aware path resolution
//! - User settings persistence

pub mod paths;
pub mod settings;

pub use paths::CapsulePaths;
pub use settings::{LogFormat, Settings};
