//! Stateless date and timestamp text conversion.
//!
//! # Invariants
//! - Dates use `dd-MM-yyyy`, timestamps use `dd-MM-yyyy HH:mm`.
//! - Functions are pure; no formatter state is shared between calls.

use super::validation::ValidationError;
use chrono::{NaiveDate, NaiveDateTime};

const DATE_FORMAT: &str = "%d-%m-%Y";
const TIMESTAMP_FORMAT: &str = "%d-%m-%Y %H:%M";

/// Parses a `dd-MM-yyyy` date.
pub fn parse_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        ValidationError::InvalidDate {
            value: value.to_string(),
            expected_format: "dd-MM-yyyy",
        }
    })
}

/// Formats a date as `dd-MM-yyyy`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parses a `dd-MM-yyyy HH:mm` timestamp.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, ValidationError> {
    NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT).map_err(|_| {
        ValidationError::InvalidDate {
            value: value.to_string(),
            expected_format: "dd-MM-yyyy HH:mm",
        }
    })
}

/// Formats a timestamp as `dd-MM-yyyy HH:mm`.
pub fn format_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::{format_date, format_timestamp, parse_date, parse_timestamp};

    #[test]
    fn date_text_survives_parse_and_format() {
        let date = parse_date("01-01-2000").unwrap();
        assert_eq!(format_date(date), "01-01-2000");
    }

    #[test]
    fn iso_dates_are_rejected() {
        let err = parse_date("2000-01-01").unwrap_err();
        assert!(err.to_string().contains("dd-MM-yyyy"));
    }

    #[test]
    fn impossible_calendar_dates_are_rejected() {
        assert!(parse_date("31-02-2001").is_err());
    }

    #[test]
    fn timestamp_keeps_minutes() {
        let timestamp = parse_timestamp("15-03-2024 09:30").unwrap();
        assert_eq!(format_timestamp(timestamp), "15-03-2024 09:30");
    }
}
