//! Date parsing for Socrata record columns.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Placeholder shown when a record has no date.
pub const MISSING_DATE: &str = "unknown";

/// Parses a Socrata datetime string (ISO 8601 with optional fractional seconds).
#[must_use]
pub fn parse_socrata_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_time(chrono::NaiveTime::MIN).and_utc());
    }
    None
}

/// Formats a record date for display as `YYYY-MM-DD`.
///
/// Values that do not parse are shown as delivered; missing values show
/// [`MISSING_DATE`].
#[must_use]
pub fn display_date(raw: Option<&str>) -> String {
    match raw {
        None => MISSING_DATE.to_string(),
        Some(s) => parse_socrata_date(s)
            .map_or_else(|| s.to_string(), |dt| dt.format("%Y-%m-%d").to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_socrata_date_with_fractional() {
        let dt = parse_socrata_date("2024-01-15T14:30:00.000").unwrap();
        assert_eq!(dt.to_string(), "2024-01-15 14:30:00 UTC");
    }

    #[test]
    fn parses_plain_date() {
        let dt = parse_socrata_date("2019-03-12").unwrap();
        assert_eq!(dt.to_string(), "2019-03-12 00:00:00 UTC");
    }

    #[test]
    fn rejects_invalid_date() {
        assert!(parse_socrata_date("not-a-date").is_none());
    }

    #[test]
    fn display_date_trims_time() {
        assert_eq!(display_date(Some("2019-03-12T00:00:00.000")), "2019-03-12");
    }

    #[test]
    fn display_date_keeps_unparseable_and_marks_missing() {
        assert_eq!(display_date(Some("March 2019")), "March 2019");
        assert_eq!(display_date(None), MISSING_DATE);
    }
}
