//! Archive builder for capsule exports
//!
//! Serializes a list of records into one self-describing JSON blob and parses
//! it back. The blob is what gets encrypted; it never touches disk in the
//! clear.
//!
//! # Archive Format
//!
//! A single UTF-8 JSON document:
//! - `manifest`: format version, container name, kind, export time, record count
//! - `records`: the exported records, in order
//! - `notes`: a human-readable README describing the export
//!
//! Parsing enforces `manifest.total_records == records.len()`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CapsuleError, CapsuleResult};
use crate::models::{Record, RestoreKind};

/// Current archive format version
pub const ARCHIVE_FORMAT_VERSION: u32 = 1;

/// Extension used for exported envelopes
pub const ENVELOPE_EXTENSION: &str = "bin";

/// Archive header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Format version for compatibility checking
    pub format_version: u32,

    /// Container name chosen at export time
    pub name: String,

    /// Which collection the records came from
    #[serde(default)]
    pub kind: RestoreKind,

    /// Export timestamp (ISO-8601)
    pub exported_at: String,

    /// Number of records in the archive
    pub total_records: usize,

    /// Application version that wrote the archive
    #[serde(default)]
    pub app_version: String,
}

/// A parsed archive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Archive {
    pub manifest: Manifest,

    #[serde(default)]
    pub records: Vec<Record>,

    #[serde(default)]
    pub notes: String,
}

/// Wire shape used for parsing, so a missing manifest is reported as such
#[derive(Deserialize)]
struct RawArchive {
    manifest: Option<Manifest>,
    #[serde(default)]
    records: Vec<Record>,
    #[serde(default)]
    notes: String,
}

/// Serialize `records` into an archive blob, stamped with the current time
pub fn build(records: &[Record], container_name: &str, kind: RestoreKind) -> CapsuleResult<Vec<u8>> {
    build_at(records, container_name, kind, Utc::now())
}

/// Serialize `records` into an archive blob with an explicit export time
pub fn build_at(
    records: &[Record],
    container_name: &str,
    kind: RestoreKind,
    exported_at: DateTime<Utc>,
) -> CapsuleResult<Vec<u8>> {
    let manifest = Manifest {
        format_version: ARCHIVE_FORMAT_VERSION,
        name: container_name.to_string(),
        kind,
        exported_at: exported_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        total_records: records.len(),
        app_version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let archive = Archive {
        notes: render_notes(&manifest),
        manifest,
        records: records.to_vec(),
    };

    serde_json::to_vec(&archive)
        .map_err(|e| CapsuleError::Json(format!("Failed to serialize archive: {}", e)))
}

/// Parse an archive blob back into manifest, records and notes
///
/// An archive with zero records is valid.
pub fn parse(blob: &[u8]) -> CapsuleResult<Archive> {
    let raw: RawArchive = serde_json::from_slice(blob)
        .map_err(|e| CapsuleError::MalformedArchive(format!("not an archive document: {}", e)))?;

    let manifest = raw
        .manifest
        .ok_or_else(|| CapsuleError::MalformedArchive("manifest is missing".to_string()))?;

    if manifest.format_version != ARCHIVE_FORMAT_VERSION {
        return Err(CapsuleError::MalformedArchive(format!(
            "unsupported format version {}",
            manifest.format_version
        )));
    }

    if manifest.total_records != raw.records.len() {
        return Err(CapsuleError::MalformedArchive(format!(
            "manifest lists {} records but archive contains {}",
            manifest.total_records,
            raw.records.len()
        )));
    }

    Ok(Archive {
        manifest,
        records: raw.records,
        notes: raw.notes,
    })
}

/// File name offered for an export, e.g. `test-capsule-20260101-120000.bin`
pub fn suggested_file_name(container_name: &str, exported_at: DateTime<Utc>) -> String {
    let mut slug = String::new();
    for c in container_name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    let slug = if slug.is_empty() { "capsule" } else { slug };

    format!(
        "{}-{}.{}",
        slug,
        exported_at.format("%Y%m%d-%H%M%S"),
        ENVELOPE_EXTENSION
    )
}

fn render_notes(manifest: &Manifest) -> String {
    format!(
        "{name}\n\
         {underline}\n\
         \n\
         Exported {count} {noun} on {at}.\n\
         \n\
         This archive was encrypted with your passphrase. To restore it, run\n\
         `capsule restore <file> --kind {kind}` and enter the same passphrase.\n\
         Attachment links are time-limited and may have expired; the text of\n\
         every entry is stored in full.\n",
        name = manifest.name,
        underline = "=".repeat(manifest.name.chars().count().max(1)),
        count = manifest.total_records,
        noun = manifest.kind.noun(manifest.total_records),
        at = manifest.exported_at,
        kind = manifest.kind,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Attachment, CapsuleDetails, MediaKind, UserId};
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn record(title: &str) -> Record {
        Record::new(UserId::from_string("user-1"), title, format!("<p>{}</p>", title))
            .with_tag("trip")
            .with_attachment(Attachment::new(
                MediaKind::Image,
                "https://cdn.example.com/a.jpg",
                "a.jpg",
            ))
    }

    #[test]
    fn test_round_trip() {
        let records = vec![record("A"), record("B"), record("C")];
        let blob = build(&records, "Test Capsule", RestoreKind::Memories).unwrap();
        let archive = parse(&blob).unwrap();

        assert_eq!(archive.records, records);
        assert_eq!(archive.manifest.name, "Test Capsule");
        assert_eq!(archive.manifest.total_records, 3);
        assert!(archive.notes.contains("Exported 3 memories"));
    }

    #[test]
    fn test_empty_archive_is_valid() {
        let blob = build(&[], "Nothing yet", RestoreKind::TimeCapsules).unwrap();
        let archive = parse(&blob).unwrap();
        assert!(archive.records.is_empty());
        assert_eq!(archive.manifest.total_records, 0);
        assert_eq!(archive.manifest.kind, RestoreKind::TimeCapsules);
    }

    #[test]
    fn test_capsule_fields_survive() {
        let r = record("A").with_capsule(CapsuleDetails {
            name: "Graduation".into(),
            description: "Open in ten years".into(),
            unlock_at: Some("2036-05-01T00:00:00Z".into()),
        });
        let blob = build(&[r.clone()], "Graduation", RestoreKind::TimeCapsules).unwrap();
        assert_eq!(parse(&blob).unwrap().records, vec![r]);
    }

    #[test]
    fn test_missing_manifest() {
        let result = parse(br#"{"records":[]}"#);
        assert!(matches!(result, Err(CapsuleError::MalformedArchive(_))));
    }

    #[test]
    fn test_count_mismatch() {
        let blob = build(&[record("A")], "X", RestoreKind::Memories).unwrap();
        let mut value: serde_json::Value = serde_json::from_slice(&blob).unwrap();
        value["manifest"]["total_records"] = serde_json::json!(2);
        let tampered = serde_json::to_vec(&value).unwrap();

        assert!(matches!(
            parse(&tampered),
            Err(CapsuleError::MalformedArchive(_))
        ));
    }

    #[test]
    fn test_not_json() {
        assert!(matches!(
            parse(b"\x00\x01binary"),
            Err(CapsuleError::MalformedArchive(_))
        ));
    }

    #[test]
    fn test_unknown_version() {
        let blob = build(&[], "X", RestoreKind::Memories).unwrap();
        let mut value: serde_json::Value = serde_json::from_slice(&blob).unwrap();
        value["manifest"]["format_version"] = serde_json::json!(99);
        let tampered = serde_json::to_vec(&value).unwrap();
        assert!(matches!(
            parse(&tampered),
            Err(CapsuleError::MalformedArchive(_))
        ));
    }

    #[test]
    fn test_incomplete_records_still_parse() {
        let blob = br#"{"manifest":{"format_version":1,"name":"x","exported_at":"2026-01-01T00:00:00Z","total_records":1},"records":[{"title":"no id"}]}"#;
        let archive = parse(blob).unwrap();
        assert_eq!(archive.records.len(), 1);
        assert!(archive.records[0].id.is_empty());
    }

    #[test]
    fn test_suggested_file_name() {
        let at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        assert_eq!(
            suggested_file_name("Test Capsule", at),
            "test-capsule-20260314-092653.bin"
        );
        assert_eq!(suggested_file_name("  ", at), "capsule-20260314-092653.bin");
        assert_eq!(
            suggested_file_name("Summer '25!", at),
            "summer-25-20260314-092653.bin"
        );
    }

    proptest! {
        #[test]
        fn prop_round_trip(
            titles in proptest::collection::vec("[a-zA-Z0-9 ]{0,12}", 0..8),
            name in ".{0,24}",
        ) {
            let records: Vec<Record> = titles.iter().map(|t| record(t)).collect();
            let blob = build(&records, &name, RestoreKind::Memories).unwrap();
            let archive = parse(&blob).unwrap();
            prop_assert_eq!(archive.records, records);
            prop_assert_eq!(archive.manifest.name, name);
        }
    }
}
