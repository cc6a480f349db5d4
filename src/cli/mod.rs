//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the export/restore pipeline.

pub mod audit;
pub mod export;
pub mod memory;
pub mod passphrase;
pub mod restore;
pub mod session;

pub use audit::handle_audit_command;
pub use export::{handle_export_command, ExportArgs};
pub use memory::{handle_memory_command, MemoryCommands};
pub use restore::{handle_inspect_command, handle_restore_command, RestoreArgs};
pub use session::{handle_login, handle_logout, handle_whoami};
