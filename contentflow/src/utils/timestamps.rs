//! Timestamp helpers shared by envelopes, records and persisted artifacts.

use chrono::{DateTime, Duration, Utc};

/// Represents a timestamp that can be serialized/deserialized.
pub type Timestamp = DateTime<Utc>;

/// Returns the current UTC time as an ISO 8601 formatted string.
///
/// Format: `YYYY-MM-DDTHH:MM:SS.ffffff+00:00`
///
/// # Examples
///
/// ```
/// use contentflow::utils::iso_timestamp;
///
/// let ts = iso_timestamp();
/// assert!(ts.contains('T'));
/// assert!(ts.ends_with("+00:00"));
/// ```
#[must_use]
pub fn iso_timestamp() -> String {
    format_iso8601(&Utc::now())
}

/// Returns the current UTC timestamp.
#[must_use]
pub fn now_utc() -> Timestamp {
    Utc::now()
}

/// Formats a timestamp as ISO 8601 string.
#[must_use]
pub fn format_iso8601(dt: &Timestamp) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.6f+00:00").to_string()
}

/// Returns `from + hours`, saturating at the maximum representable time.
#[must_use]
pub fn add_hours(from: Timestamp, hours: u32) -> Timestamp {
    from.checked_add_signed(Duration::hours(i64::from(hours)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Milliseconds elapsed between two timestamps, clamped at zero.
#[must_use]
pub fn elapsed_ms(start: Timestamp, end: Timestamp) -> u64 {
    u64::try_from((end - start).num_milliseconds()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_iso8601() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(format_iso8601(&dt), "2024-03-01T12:30:00.000000+00:00");
    }

    #[test]
    fn test_add_hours() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let later = add_hours(dt, 24);
        assert_eq!(later, Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_elapsed_ms_clamps_negative() {
        let a = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 1).unwrap();
        assert_eq!(elapsed_ms(a, b), 1000);
        assert_eq!(elapsed_ms(b, a), 0);
    }
}
