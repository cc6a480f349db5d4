//! Restore and inspect CLI commands

use std::path::{Path, PathBuf};

use clap::Args;

use crate::audit::{AuditEntry, AuditLogger, Operation};
use crate::display::{format_envelope_info, format_restore_report};
use crate::envelope::{inspect, RestoreReport, Restorer};
use crate::error::{CapsuleError, CapsuleResult};
use crate::models::RestoreKind;
use crate::storage::Storage;

use super::passphrase::existing_passphrase;

/// Arguments for `capsule restore`
#[derive(Args)]
pub struct RestoreArgs {
    /// Envelope file produced by `capsule export`
    pub file: PathBuf,

    /// Which collection to restore into: memories or capsules
    #[arg(short, long, default_value = "memories")]
    pub kind: RestoreKind,

    /// Password; prompted for when omitted
    #[arg(long, env = "CAPSULE_PASSPHRASE", hide_env_values = true)]
    pub passphrase: Option<String>,
}

/// Handle `capsule restore`
pub fn handle_restore_command(
    storage: &Storage,
    audit: Option<&AuditLogger>,
    args: RestoreArgs,
) -> CapsuleResult<()> {
    let result = run_restore(storage, &args);
    let file_name = args.file.display().to_string();

    if let Some(audit) = audit {
        let entry = match &result {
            Ok(report) => {
                AuditEntry::restore(&report.manifest.name, report.restored, report.dropped)
            }
            Err(e) => AuditEntry::failure(Operation::Restore, e.user_message()),
        };
        audit.log_or_warn(&entry.with_file(file_name));
    }

    print!("{}", format_restore_report(&result?));
    Ok(())
}

fn run_restore(storage: &Storage, args: &RestoreArgs) -> CapsuleResult<RestoreReport> {
    let bytes = read_envelope(&args.file)?;
    let passphrase = existing_passphrase(args.passphrase.clone())?;

    let mut restorer = Restorer::new(&storage.records, &storage.session);
    restorer.restore(&bytes, &passphrase, args.kind)
}

/// Handle `capsule inspect`
pub fn handle_inspect_command(file: &Path) -> CapsuleResult<()> {
    let bytes = read_envelope(file)?;
    let info = inspect(&bytes)?;

    println!("Envelope: {}", file.display());
    print!("{}", format_envelope_info(&info));
    Ok(())
}

fn read_envelope(path: &Path) -> CapsuleResult<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| CapsuleError::Io(format!("Failed to read {}: {}", path.display(), e)))
}
