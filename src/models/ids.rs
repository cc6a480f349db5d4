//! Strongly-typed ID wrappers
//!
//! Record ids come from the record store and are opaque strings, so the
//! wrappers hold a `String` rather than a parsed UUID. Ids minted locally are
//! UUID v4.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Macro to generate string-backed ID newtype wrappers
macro_rules! define_id {
    ($name:ident, $display_prefix:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new random ID
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Wrap an existing identifier
            pub fn from_string(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the raw identifier
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// True when the identifier is blank
            pub fn is_empty(&self) -> bool {
                self.0.trim().is_empty()
            }

            /// Short form for tables: prefix plus the first 8 characters
            pub fn short(&self) -> String {
                let head: String = self.0.chars().take(8).collect();
                format!("{}{}", $display_prefix, head)
            }

            /// The id behind a short display form, if `s` carries the prefix
            pub fn from_short(s: &str) -> Option<Self> {
                s.strip_prefix($display_prefix).map(|rest| Self(rest.to_string()))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

define_id!(RecordId, "mem-");
define_id!(UserId, "usr-");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_creation() {
        let id = RecordId::new();
        assert!(!id.is_empty());
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }

    #[test]
    fn test_short_form() {
        let id = RecordId::from_string("550e8400-e29b-41d4-a716-446655440000");
        assert_eq!(id.short(), "mem-550e8400");
    }

    #[test]
    fn test_from_keeps_raw_id() {
        let id = RecordId::from("mem-abc");
        assert_eq!(id.as_str(), "mem-abc");
    }

    #[test]
    fn test_from_short() {
        assert_eq!(RecordId::from_short("mem-abc").unwrap().as_str(), "abc");
        assert!(RecordId::from_short("abc").is_none());
    }

    #[test]
    fn test_blank_id_is_empty() {
        assert!(RecordId::from_string("  ").is_empty());
        assert!(RecordId::default().is_empty());
    }

    #[test]
    fn test_id_serialization_is_transparent() {
        let id = RecordId::from_string("rec-42");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"rec-42\"");
        let back: RecordId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
