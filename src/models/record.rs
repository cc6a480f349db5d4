//! Memory record model
//!
//! A record is one journal entry or time-capsule entry owned by a single user.
//! Archives hold copies of records, and restore accepts a record only if it
//! passes `Record::check_restorable`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::attachment::Attachment;
use super::ids::{RecordId, UserId};

/// Which collection a restore targets; selects the validity rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreKind {
    /// Plain memories
    #[default]
    Memories,
    /// Time-capsule entries (need a capsule name and description)
    TimeCapsules,
}

impl RestoreKind {
    /// Plural noun used in user-facing counts
    pub fn noun(&self, count: usize) -> &'static str {
        match (self, count) {
            (RestoreKind::Memories, 1) => "memory",
            (RestoreKind::Memories, _) => "memories",
            (RestoreKind::TimeCapsules, 1) => "time capsule",
            (RestoreKind::TimeCapsules, _) => "time capsules",
        }
    }
}

impl fmt::Display for RestoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestoreKind::Memories => write!(f, "memories"),
            RestoreKind::TimeCapsules => write!(f, "capsules"),
        }
    }
}

impl FromStr for RestoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memories" | "memory" => Ok(RestoreKind::Memories),
            "capsules" | "capsule" | "time-capsules" | "time_capsules" => {
                Ok(RestoreKind::TimeCapsules)
            }
            other => Err(format!("Unknown kind: {}", other)),
        }
    }
}

/// Free-form metadata attached to a record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    #[serde(default)]
    pub tags: BTreeSet<String>,

    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// Container fields carried by time-capsule entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapsuleDetails {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// When the capsule is meant to be opened (ISO-8601)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlock_at: Option<String>,
}

/// A memory / journal / time-capsule record
///
/// String fields default to empty on deserialization so that an incomplete
/// record inside an archive can be rejected individually instead of failing
/// the whole archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub id: RecordId,

    /// Owning user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,

    #[serde(default)]
    pub title: String,

    /// Rich-text (HTML-like) body
    #[serde(default)]
    pub content: String,

    /// Creation timestamp as produced by the store (ISO-8601)
    #[serde(default)]
    pub created_at: String,

    /// Must be present for restore, but may be empty
    #[serde(default)]
    pub metadata: Option<RecordMetadata>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capsule: Option<CapsuleDetails>,
}

/// Why a record was refused during restore
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordRejection {
    MissingId,
    MissingContent,
    MissingCreatedAt,
    MissingMetadata,
    MissingCapsuleName,
    MissingCapsuleDescription,
}

impl fmt::Display for RecordRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordRejection::MissingId => write!(f, "missing id"),
            RecordRejection::MissingContent => write!(f, "missing content"),
            RecordRejection::MissingCreatedAt => write!(f, "missing creation timestamp"),
            RecordRejection::MissingMetadata => write!(f, "missing metadata"),
            RecordRejection::MissingCapsuleName => write!(f, "missing capsule name"),
            RecordRejection::MissingCapsuleDescription => {
                write!(f, "missing capsule description")
            }
        }
    }
}

impl Record {
    /// Create a new memory owned by `user_id`, stamped now
    pub fn new(
        user_id: UserId,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: RecordId::new(),
            user_id: Some(user_id),
            title: title.into(),
            content: content.into(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            metadata: Some(RecordMetadata::default()),
            capsule: None,
        }
    }

    /// Add a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.metadata
            .get_or_insert_with(RecordMetadata::default)
            .tags
            .insert(tag.into());
        self
    }

    /// Add an attachment
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.metadata
            .get_or_insert_with(RecordMetadata::default)
            .attachments
            .push(attachment);
        self
    }

    /// Mark this record as a time-capsule entry
    pub fn with_capsule(mut self, details: CapsuleDetails) -> Self {
        self.capsule = Some(details);
        self
    }

    /// Parsed creation time, if the stored string is valid RFC 3339
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Attachments, or an empty slice when metadata is absent
    pub fn attachments(&self) -> &[Attachment] {
        self.metadata
            .as_ref()
            .map(|m| m.attachments.as_slice())
            .unwrap_or(&[])
    }

    /// Check whether this record may be upserted by a restore of `kind`
    pub fn check_restorable(&self, kind: RestoreKind) -> Result<(), RecordRejection> {
        if self.id.is_empty() {
            return Err(RecordRejection::MissingId);
        }
        if self.content.trim().is_empty() {
            return Err(RecordRejection::MissingContent);
        }
        if self.created_at.trim().is_empty() {
            return Err(RecordRejection::MissingCreatedAt);
        }
        if self.metadata.is_none() {
            return Err(RecordRejection::MissingMetadata);
        }

        if kind == RestoreKind::TimeCapsules {
            let capsule = self.capsule.as_ref();
            if capsule.map_or(true, |c| c.name.trim().is_empty()) {
                return Err(RecordRejection::MissingCapsuleName);
            }
            if capsule.map_or(true, |c| c.description.trim().is_empty()) {
                return Err(RecordRejection::MissingCapsuleDescription);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::attachment::MediaKind;

    fn sample() -> Record {
        Record::new(UserId::from_string("user-1"), "Beach", "<p>Sunny</p>")
            .with_tag("summer")
            .with_attachment(Attachment::new(MediaKind::Image, "photos/a.jpg", "a.jpg"))
    }

    #[test]
    fn test_new_record_is_restorable() {
        let record = sample();
        assert!(record.check_restorable(RestoreKind::Memories).is_ok());
        assert!(record.created_at_utc().is_some());
    }

    #[test]
    fn test_missing_fields_rejected() {
        let mut record = sample();
        record.created_at.clear();
        assert_eq!(
            record.check_restorable(RestoreKind::Memories),
            Err(RecordRejection::MissingCreatedAt)
        );

        let mut record = sample();
        record.content = "   ".into();
        assert_eq!(
            record.check_restorable(RestoreKind::Memories),
            Err(RecordRejection::MissingContent)
        );

        let mut record = sample();
        record.metadata = None;
        assert_eq!(
            record.check_restorable(RestoreKind::Memories),
            Err(RecordRejection::MissingMetadata)
        );
    }

    #[test]
    fn test_empty_metadata_is_fine() {
        let mut record = sample();
        record.metadata = Some(RecordMetadata::default());
        assert!(record.check_restorable(RestoreKind::Memories).is_ok());
    }

    #[test]
    fn test_time_capsule_needs_name_and_description() {
        let record = sample();
        assert_eq!(
            record.check_restorable(RestoreKind::TimeCapsules),
            Err(RecordRejection::MissingCapsuleName)
        );

        let record = sample().with_capsule(CapsuleDetails {
            name: "Class of 2030".into(),
            description: String::new(),
            unlock_at: None,
        });
        assert_eq!(
            record.check_restorable(RestoreKind::TimeCapsules),
            Err(RecordRejection::MissingCapsuleDescription)
        );

        let record = sample().with_capsule(CapsuleDetails {
            name: "Class of 2030".into(),
            description: "Letters to our future selves".into(),
            unlock_at: Some("2030-06-01T00:00:00Z".into()),
        });
        assert!(record.check_restorable(RestoreKind::TimeCapsules).is_ok());
    }

    #[test]
    fn test_incomplete_json_still_parses() {
        let record: Record = serde_json::from_str(r#"{"id":"abc","title":"x"}"#).unwrap();
        assert_eq!(record.id.as_str(), "abc");
        assert!(record.content.is_empty());
        assert!(record.metadata.is_none());
    }

    #[test]
    fn test_restore_kind_parse() {
        assert_eq!("capsules".parse::<RestoreKind>(), Ok(RestoreKind::TimeCapsules));
        assert_eq!("Memories".parse::<RestoreKind>(), Ok(RestoreKind::Memories));
        assert!("notes".parse::<RestoreKind>().is_err());
        assert_eq!(RestoreKind::TimeCapsules.noun(7), "time capsules");
        assert_eq!(RestoreKind::Memories.noun(1), "memory");
    }
}
