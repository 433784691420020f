//! Timestamp helpers for artifact names and headers.

use chrono::{DateTime, SecondsFormat, Utc};

/// Represents a UTC timestamp.
pub type Timestamp = DateTime<Utc>;

/// Returns the current UTC timestamp.
#[must_use]
pub fn now_utc() -> Timestamp {
    Utc::now()
}

/// Formats a timestamp as ISO 8601 with millisecond precision, e.g.
/// `2024-03-05T14:07:09.123Z`.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use essayflow::utils::iso_timestamp;
///
/// let ts = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
/// assert_eq!(iso_timestamp(&ts), "2024-03-05T14:07:09.000Z");
/// ```
#[must_use]
pub fn iso_timestamp(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Formats a timestamp for use in file names: seconds precision with the
/// colons replaced, e.g. `2024-03-05T14-07-09`.
#[must_use]
pub fn file_timestamp(ts: &Timestamp) -> String {
    ts.format("%Y-%m-%dT%H-%M-%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_file_timestamp_is_path_safe() {
        let ts = Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 58).unwrap();
        let formatted = file_timestamp(&ts);

        assert_eq!(formatted, "2025-12-31T23-59-58");
        assert!(!formatted.contains(':'));
        assert!(!formatted.contains('.'));
    }

    #[test]
    fn test_iso_timestamp_millis() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap()
            + chrono::Duration::milliseconds(678);
        assert_eq!(iso_timestamp(&ts), "2025-01-02T03:04:05.678Z");
    }

    #[test]
    fn test_now_utc_round_trips_through_iso() {
        let now = now_utc();
        let parsed = DateTime::parse_from_rfc3339(&iso_timestamp(&now)).unwrap();
        assert_eq!(parsed.timestamp(), now.timestamp());
    }
}
