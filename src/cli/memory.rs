//! Memory CLI commands
//!
//! Minimal record management so there is something to export.

use clap::Subcommand;

use crate::display::{format_record_details, format_record_list};
use crate::error::{CapsuleError, CapsuleResult};
use crate::models::{Attachment, CapsuleDetails, Record, RecordId, UserId};
use crate::storage::{AuthProvider, RecordFilter, RecordStore, Storage};

/// Memory subcommands
#[derive(Subcommand)]
pub enum MemoryCommands {
    /// Write a new memory
    Add {
        /// Title
        title: String,

        /// Body text (HTML allowed)
        #[arg(short, long)]
        content: String,

        /// Tag (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// Attachment as kind:path[:name], e.g. image:photos/beach.jpg (repeatable)
        #[arg(short, long = "attach")]
        attachments: Vec<String>,

        /// Make this a time-capsule entry with the given capsule name
        #[arg(long, requires = "description")]
        capsule: Option<String>,

        /// Capsule description
        #[arg(long, requires = "capsule")]
        description: Option<String>,

        /// When the capsule may be opened (ISO-8601)
        #[arg(long, requires = "capsule")]
        unlock_at: Option<String>,
    },

    /// List your memories
    #[command(alias = "ls")]
    List {
        /// Only time-capsule entries
        #[arg(long)]
        capsules: bool,
    },

    /// Show one memory in full
    Show {
        /// Memory ID (a unique prefix is enough)
        id: String,
    },

    /// Delete a memory
    #[command(alias = "rm")]
    Remove {
        /// Memory ID (a unique prefix is enough)
        id: String,
    },
}

/// Handle a memory command
pub fn handle_memory_command(storage: &Storage, cmd: MemoryCommands) -> CapsuleResult<()> {
    let user_id = require_user(storage)?;

    match cmd {
        MemoryCommands::Add {
            title,
            content,
            tags,
            attachments,
            capsule,
            description,
            unlock_at,
        } => {
            let mut record = Record::new(user_id, title, content);
            for tag in tags {
                record = record.with_tag(tag);
            }
            for spec in attachments {
                let attachment = Attachment::parse_spec(&spec).map_err(CapsuleError::Validation)?;
                record = record.with_attachment(attachment);
            }
            if let (Some(name), Some(description)) = (capsule, description) {
                record = record.with_capsule(CapsuleDetails {
                    name,
                    description,
                    unlock_at,
                });
            }

            let id = record.id.clone();
            storage.records.upsert(vec![record])?;
            println!("Saved memory {}", id.short());
        }

        MemoryCommands::List { capsules } => {
            let filter = RecordFilter::for_user(user_id).capsules_only(capsules);
            let records = storage.records.query(&filter)?;
            print!("{}", format_record_list(&records));
            if records.is_empty() {
                println!();
            }
        }

        MemoryCommands::Show { id } => {
            let record = resolve_record(storage, &user_id, &id)?;
            print!("{}", format_record_details(&record));
        }

        MemoryCommands::Remove { id } => {
            let record = resolve_record(storage, &user_id, &id)?;
            storage.records.delete(&record.id)?;
            println!("Deleted memory: {}", record.title);
        }
    }

    Ok(())
}

/// The signed-in user, or a validation error telling them to log in
pub(crate) fn require_user(storage: &Storage) -> CapsuleResult<UserId> {
    storage.session.current_user_id().ok_or_else(|| {
        CapsuleError::Validation("Not signed in. Run 'capsule login <user-id>' first".to_string())
    })
}

/// Find one of the user's records by full id, short id, or unique prefix
///
/// The input is matched as given first; the `mem-` display prefix is only
/// stripped when that finds nothing, since store ids may carry it too.
pub(crate) fn resolve_record(
    storage: &Storage,
    user_id: &UserId,
    input: &str,
) -> CapsuleResult<Record> {
    let input = input.trim();
    let records = storage
        .records
        .query(&RecordFilter::for_user(user_id.clone()))?;

    let mut candidates = vec![RecordId::from(input)];
    candidates.extend(RecordId::from_short(input));

    for wanted in &candidates {
        if let Some(exact) = records.iter().find(|r| &r.id == wanted) {
            return Ok(exact.clone());
        }
    }

    for wanted in candidates.iter().filter(|w| !w.is_empty()) {
        let mut matches = records
            .iter()
            .filter(|r| r.id.as_str().starts_with(wanted.as_str()));

        match (matches.next(), matches.next()) {
            (Some(record), None) => return Ok(record.clone()),
            (Some(_), Some(_)) => {
                return Err(CapsuleError::Validation(format!(
                    "'{}' matches more than one memory; use a longer id",
                    input
                )))
            }
            (None, _) => continue,
        }
    }

    Err(CapsuleError::record_not_found(input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CapsulePaths;
    use tempfile::TempDir;

    fn storage_with_user() -> (Storage, TempDir, UserId) {
        let temp = TempDir::new().unwrap();
        let storage =
            Storage::open(CapsulePaths::with_base_dir(temp.path().to_path_buf())).unwrap();
        let user = UserId::from_string("alice");
        storage.session.sign_in(user.clone()).unwrap();
        (storage, temp, user)
    }

    #[test]
    fn test_add_and_resolve() {
        let (storage, _temp, user) = storage_with_user();
        handle_memory_command(
            &storage,
            MemoryCommands::Add {
                title: "Beach".into(),
                content: "<p>Sunny</p>".into(),
                tags: vec!["summer".into()],
                attachments: vec!["image:photos/beach.jpg".into()],
                capsule: None,
                description: None,
                unlock_at: None,
            },
        )
        .unwrap();

        let records = storage.records.query(&RecordFilter::for_user(user.clone())).unwrap();
        assert_eq!(records.len(), 1);
        let id = records[0].id.clone();

        let by_short = resolve_record(&storage, &user, &id.short()).unwrap();
        assert_eq!(by_short.id, id);
        let by_full = resolve_record(&storage, &user, id.as_str()).unwrap();
        assert_eq!(by_full.attachments().len(), 1);
    }

    #[test]
    fn test_resolve_store_id_with_display_prefix() {
        let (storage, _temp, user) = storage_with_user();
        let mut imported = Record::new(user.clone(), "Imported", "<p>from elsewhere</p>");
        imported.id = RecordId::from_string("mem-trip-2024");
        let mut other = Record::new(user.clone(), "Other", "<p>x</p>");
        other.id = RecordId::from_string("trip-2024-b");
        storage.records.upsert(vec![imported, other]).unwrap();

        let by_full = resolve_record(&storage, &user, "mem-trip-2024").unwrap();
        assert_eq!(by_full.title, "Imported");
        let by_short = resolve_record(&storage, &user, "mem-trip-2024-").unwrap();
        assert_eq!(by_short.title, "Other");
    }

    #[test]
    fn test_resolve_unknown() {
        let (storage, _temp, user) = storage_with_user();
        let err = resolve_record(&storage, &user, "mem-nothing").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_requires_login() {
        let temp = TempDir::new().unwrap();
        let storage =
            Storage::open(CapsulePaths::with_base_dir(temp.path().to_path_buf())).unwrap();
        let result = handle_memory_command(&storage, MemoryCommands::List { capsules: false });
        assert!(result.unwrap_err().is_validation());
    }

    #[test]
    fn test_remove() {
        let (storage, _temp, user) = storage_with_user();
        let record = Record::new(user.clone(), "Gone", "<p>bye</p>");
        let id = record.id.clone();
        storage.records.upsert(vec![record]).unwrap();

        handle_memory_command(&storage, MemoryCommands::Remove { id: id.to_string() }).unwrap();
        assert!(storage
            .records
            .query(&RecordFilter::for_user(user))
            .unwrap()
            .is_empty());
    }
}
