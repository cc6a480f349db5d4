//! Media attachments on a memory
//!
//! Closed over the three media kinds the journal supports, so archive
//! contents and validation can match exhaustively.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of attached media
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
            MediaKind::Audio => write!(f, "audio"),
        }
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "image" | "photo" | "img" => Ok(MediaKind::Image),
            "video" | "vid" => Ok(MediaKind::Video),
            "audio" | "voice" => Ok(MediaKind::Audio),
            other => Err(format!("Unknown media kind: {}", other)),
        }
    }
}

/// A media attachment: a remote URL or a blob-store path plus a display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Attachment {
    Image { url: String, name: String },
    Video { url: String, name: String },
    Audio { url: String, name: String },
}

impl Attachment {
    /// Build an attachment of the given kind
    pub fn new(kind: MediaKind, url: impl Into<String>, name: impl Into<String>) -> Self {
        let (url, name) = (url.into(), name.into());
        match kind {
            MediaKind::Image => Attachment::Image { url, name },
            MediaKind::Video => Attachment::Video { url, name },
            MediaKind::Audio => Attachment::Audio { url, name },
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            Attachment::Image { .. } => MediaKind::Image,
            Attachment::Video { .. } => MediaKind::Video,
            Attachment::Audio { .. } => MediaKind::Audio,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Attachment::Image { url, .. }
            | Attachment::Video { url, .. }
            | Attachment::Audio { url, .. } => url,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Attachment::Image { name, .. }
            | Attachment::Video { name, .. }
            | Attachment::Audio { name, .. } => name,
        }
    }

    /// True when the location is already a fetchable remote URL
    pub fn is_remote(&self) -> bool {
        let url = self.url();
        url.starts_with("http://") || url.starts_with("https://")
    }

    /// Same attachment pointing at a different location
    pub fn with_url(&self, url: impl Into<String>) -> Self {
        Attachment::new(self.kind(), url, self.name())
    }

    /// Parse the CLI form `kind:path[:name]`
    ///
    /// When no name is given the last path segment is used.
    pub fn parse_spec(spec: &str) -> Result<Self, String> {
        let (kind, rest) = spec
            .split_once(':')
            .ok_or_else(|| format!("Expected kind:path[:name], got '{}'", spec))?;
        let kind: MediaKind = kind.parse()?;

        // URLs contain ':' themselves, so only split a name off the right end
        // when the remainder is not a bare URL
        let (url, name) = match rest.rsplit_once(':') {
            Some((url, name)) if !name.starts_with("//") && !url.is_empty() => {
                (url.to_string(), name.to_string())
            }
            _ => {
                let name = rest.rsplit('/').next().unwrap_or(rest).to_string();
                (rest.to_string(), name)
            }
        };

        if url.trim().is_empty() {
            return Err(format!("Attachment path is empty in '{}'", spec));
        }

        Ok(Attachment::new(kind, url, name))
    }
}
