//! Memory record display formatting
//!
//! Formats records for terminal output in table and detail views.

use crate::models::Record;

const TITLE_MAX: usize = 32;

/// Format a list of records as a table
pub fn format_record_list(records: &[Record]) -> String {
    if records.is_empty() {
        return "No memories found.".to_string();
    }

    let id_width = records
        .iter()
        .map(|r| r.id.short().len())
        .max()
        .unwrap_or(2)
        .max(2);

    let title_width = records
        .iter()
        .map(|r| truncate(&r.title, TITLE_MAX).chars().count())
        .max()
        .unwrap_or(5)
        .max(5);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<id_width$}  {:<title_width$}  {:<16}  {:>5}  {}\n",
        "ID",
        "Title",
        "Created",
        "Media",
        "Capsule",
        id_width = id_width,
        title_width = title_width,
    ));

    output.push_str(&format!(
        "{:-<id_width$}  {:-<title_width$}  {:-<16}  {:->5}  {:-<10}\n",
        "",
        "",
        "",
        "",
        "",
        id_width = id_width,
        title_width = title_width,
    ));

    for record in records {
        let created = record
            .created_at_utc()
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| record.created_at.clone());
        let capsule = record
            .capsule
            .as_ref()
            .map(|c| c.name.as_str())
            .unwrap_or("");

        output.push_str(&format!(
            "{:<id_width$}  {:<title_width$}  {:<16}  {:>5}  {}\n",
            record.id.short(),
            truncate(&record.title, TITLE_MAX),
            created,
            record.attachments().len(),
            capsule,
            id_width = id_width,
            title_width = title_width,
        ));
    }

    output.push_str(&format!("\n{} record(s)\n", records.len()));
    output
}

/// Format a single record's details
pub fn format_record_details(record: &Record) -> String {
    let mut output = String::new();

    output.push_str(&format!("Memory: {}\n", record.title));
    output.push_str(&format!("  ID:      {}\n", record.id));
    if let Some(user) = &record.user_id {
        output.push_str(&format!("  Owner:   {}\n", user));
    }
    output.push_str(&format!("  Created: {}\n", record.created_at));

    if let Some(metadata) = &record.metadata {
        if !metadata.tags.is_empty() {
            let tags: Vec<&str> = metadata.tags.iter().map(String::as_str).collect();
            output.push_str(&format!("  Tags:    {}\n", tags.join(", ")));
        }
    }

    if let Some(capsule) = &record.capsule {
        output.push('\n');
        output.push_str(&format!("  Capsule:     {}\n", capsule.name));
        output.push_str(&format!("  Description: {}\n", capsule.description));
        if let Some(unlock_at) = &capsule.unlock_at {
            output.push_str(&format!("  Unlocks:     {}\n", unlock_at));
        }
    }

    let attachments = record.attachments();
    if !attachments.is_empty() {
        output.push('\n');
        output.push_str("  Attachments:\n");
        for attachment in attachments {
            output.push_str(&format!(
                "    [{}] {} ({})\n",
                attachment.kind(),
                attachment.name(),
                attachment.url()
            ));
        }
    }

    output.push('\n');
    output.push_str(&format!("  {}\n", record.content));
    output
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Attachment, CapsuleDetails, MediaKind, UserId};

    fn sample(title: &str) -> Record {
        Record::new(UserId::from_string("alice"), title, "<p>Body</p>")
    }

    #[test]
    fn test_format_record_list() {
        let records = vec![
            sample("Beach day"),
            sample("Graduation").with_capsule(CapsuleDetails {
                name: "Class of 2030".into(),
                description: "Open later".into(),
                unlock_at: None,
            }),
        ];
        let output = format_record_list(&records);

        assert!(output.contains("Title"));
        assert!(output.contains("Beach day"));
        assert!(output.contains("Class of 2030"));
        assert!(output.contains("2 record(s)"));
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(format_record_list(&[]), "No memories found.");
    }

    #[test]
    fn test_long_titles_truncated() {
        let output = format_record_list(&[sample(&"x".repeat(80))]);
        assert!(output.contains(&format!("{}...", "x".repeat(TITLE_MAX - 3))));
        assert!(!output.contains(&"x".repeat(TITLE_MAX + 1)));
    }

    #[test]
    fn test_format_details() {
        let record = sample("Beach day")
            .with_tag("summer")
            .with_attachment(Attachment::new(MediaKind::Image, "photos/a.jpg", "a.jpg"));
        let output = format_record_details(&record);

        assert!(output.contains("Memory: Beach day"));
        assert!(output.contains("Tags:    summer"));
        assert!(output.contains("[image] a.jpg (photos/a.jpg)"));
    }
}
