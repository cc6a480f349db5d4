//! Core data models for capsule
//!
//! Memory records, their attachments, and the strongly-typed ids that key
//! them in the record store.

pub mod attachment;
pub mod ids;
pub mod record;

pub use attachment::{Attachment, MediaKind};
pub use ids::{RecordId, UserId};
pub use record::{CapsuleDetails, Record, RecordMetadata, RecordRejection, RestoreKind};
