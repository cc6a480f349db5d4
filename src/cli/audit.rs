//! Audit CLI command

use crate::audit::AuditLogger;
use crate::error::CapsuleResult;

/// Print the most recent `limit` audit entries, oldest first
pub fn handle_audit_command(logger: &AuditLogger, limit: usize) -> CapsuleResult<()> {
    let entries = logger.read_recent(limit)?;

    if entries.is_empty() {
        println!("No exports or restores recorded yet.");
        return Ok(());
    }

    for entry in &entries {
        let file = entry
            .file
            .as_deref()
            .map(|f| format!(" [{}]", f))
            .unwrap_or_default();
        println!("{}{}", entry.format_human_readable(), file);
    }
    Ok(())
}
