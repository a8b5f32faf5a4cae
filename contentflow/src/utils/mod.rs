//! Utility functions for identifier generation and timestamp handling.

pub mod timestamps;

pub use timestamps::{format_iso8601, iso_timestamp, now_utc, Timestamp};

use uuid::Uuid;

/// Generates a new UUID v4.
#[must_use]
pub fn generate_uuid() -> Uuid {
    Uuid::new_v4()
}

/// Generates a new UUID v7 (time-ordered).
///
/// Used for execution ids so that records sort by start time.
#[must_use]
pub fn generate_uuid_v7() -> Uuid {
    Uuid::now_v7()
}
