//! Export CLI command
//!
//! Gathers the signed-in user's records, locks them under a password, and
//! writes the envelope into the exports directory.

use std::path::PathBuf;

use clap::Args;

use crate::audit::{AuditEntry, AuditLogger, Operation};
use crate::config::Settings;
use crate::display::format_size;
use crate::envelope::{gather_records, ExportRequest, Exporter};
use crate::error::{CapsuleError, CapsuleResult};
use crate::models::{RecordId, RestoreKind};
use crate::storage::Storage;

use super::memory::{require_user, resolve_record};
use super::passphrase::new_passphrase;

/// Arguments for `capsule export`
#[derive(Args)]
pub struct ExportArgs {
    /// Container name recorded in the manifest
    #[arg(short, long)]
    pub name: Option<String>,

    /// Which collection to export: memories or capsules
    #[arg(short, long, default_value = "memories")]
    pub kind: RestoreKind,

    /// Export only these memories (repeatable; default is all)
    #[arg(long = "id")]
    pub ids: Vec<String>,

    /// Directory to write the envelope into
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Password; prompted for when omitted
    #[arg(long, env = "CAPSULE_PASSPHRASE", hide_env_values = true)]
    pub passphrase: Option<String>,
}

/// Handle `capsule export`
pub fn handle_export_command(
    storage: &Storage,
    settings: &Settings,
    audit: Option<&AuditLogger>,
    args: ExportArgs,
) -> CapsuleResult<()> {
    let result = run_export(storage, settings, args);

    if let Some(audit) = audit {
        let entry = match &result {
            Ok(done) => AuditEntry::export(&done.container, done.records, &done.file_name),
            Err(e) => AuditEntry::failure(Operation::Export, e.user_message()),
        };
        audit.log_or_warn(&entry);
    }

    let done = result?;
    println!(
        "Exported {} {} to {} ({})",
        done.records,
        done.kind.noun(done.records),
        done.path.display(),
        format_size(done.size)
    );
    println!("Keep your password safe: this backup cannot be opened without it.");
    Ok(())
}

#[derive(Debug)]
struct ExportDone {
    container: String,
    kind: RestoreKind,
    records: usize,
    file_name: String,
    path: PathBuf,
    size: u64,
}

fn run_export(storage: &Storage, settings: &Settings, args: ExportArgs) -> CapsuleResult<ExportDone> {
    let user_id = require_user(storage)?;

    let ids = args
        .ids
        .iter()
        .map(|input| resolve_record(storage, &user_id, input).map(|r| r.id))
        .collect::<CapsuleResult<Vec<RecordId>>>()?;

    let records = gather_records(
        &storage.records,
        &storage.blobs,
        &storage.session,
        &ids,
        args.kind,
        settings.export.signed_url_ttl_secs,
    )?;
    if records.is_empty() {
        return Err(CapsuleError::Validation(format!(
            "No {} selected to export",
            args.kind.noun(0)
        )));
    }

    let container = args
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| settings.export.default_container_name.clone());

    let min_len = settings.passphrase_min_len();
    let request = ExportRequest {
        records,
        container_name: container.clone(),
        kind: args.kind,
        passphrase: new_passphrase(args.passphrase, min_len)?,
    };

    let dir = args.output.unwrap_or_else(|| settings.output_dir(storage.paths()));
    std::fs::create_dir_all(&dir)?;

    let mut exporter = Exporter::new(min_len);
    let path = exporter.export_to(&request, &dir)?;
    let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
    let file_name = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    Ok(ExportDone {
        container,
        kind: args.kind,
        records: request.records.len(),
        file_name,
        path,
        size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CapsulePaths;
    use crate::models::{Record, UserId};
    use crate::storage::{AuthProvider, RecordStore};
    use tempfile::TempDir;

    fn setup() -> (Storage, Settings, TempDir) {
        let temp = TempDir::new().unwrap();
        let storage =
            Storage::open(CapsulePaths::with_base_dir(temp.path().to_path_buf())).unwrap();
        let user = UserId::from_string("alice");
        storage.session.sign_in(user.clone()).unwrap();
        storage
            .records
            .upsert(vec![
                Record::new(user.clone(), "A", "<p>a</p>"),
                Record::new(user, "B", "<p>b</p>"),
            ])
            .unwrap();
        (storage, Settings::default(), temp)
    }

    fn args(passphrase: &str) -> ExportArgs {
        ExportArgs {
            name: Some("Test Capsule".into()),
            kind: RestoreKind::Memories,
            ids: Vec::new(),
            output: None,
            passphrase: Some(passphrase.into()),
        }
    }

    #[test]
    fn test_export_writes_envelope_and_audit() {
        let (storage, settings, _temp) = setup();
        let audit = AuditLogger::new(storage.paths().audit_log());

        handle_export_command(&storage, &settings, Some(&audit), args("correct-horse-battery"))
            .unwrap();

        let files: Vec<_> = std::fs::read_dir(storage.paths().exports_dir())
            .unwrap()
            .collect();
        assert_eq!(files.len(), 1);

        let entries = audit.read_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].records, 2);
        assert!(entries[0].outcome.is_success());
    }

    #[test]
    fn test_short_password_audited_as_failure() {
        let (storage, settings, _temp) = setup();
        let audit = AuditLogger::new(storage.paths().audit_log());

        let result = handle_export_command(&storage, &settings, Some(&audit), args("short"));
        assert!(result.unwrap_err().is_validation());

        let entries = audit.read_all().unwrap();
        assert!(!entries[0].outcome.is_success());
        assert_eq!(
            std::fs::read_dir(storage.paths().exports_dir()).unwrap().count(),
            0
        );
    }

    #[test]
    fn test_nothing_selected() {
        let (storage, settings, _temp) = setup();
        storage.session.sign_in(UserId::from_string("carol")).unwrap();

        let err = run_export(&storage, &settings, args("correct-horse-battery")).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.user_message(), "No memories selected to export");
    }

    #[test]
    fn test_default_container_name() {
        let (storage, settings, _temp) = setup();
        let mut a = args("correct-horse-battery");
        a.name = None;
        let done = run_export(&storage, &settings, a).unwrap();
        assert_eq!(done.container, "Memories");
        assert!(done.file_name.starts_with("memories-"));
    }
}
