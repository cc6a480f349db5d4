//! Display formatting for terminal output
//!
//! Hand-aligned tables and detail views for records, envelopes and restore
//! results.

pub mod envelope;
pub mod record;

pub use envelope::{format_envelope_info, format_restore_report, format_size};
pub use record::{format_record_details, format_record_list};
