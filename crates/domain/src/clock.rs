// Rust guideline compliant 2026-10-18

//! Timestamp helpers for the `YYYY-MM-DD HH:MM:SS` format the stores use.

use time::macros::format_description;
use time::{Duration, PrimitiveDateTime};

/// Error returned for a timestamp not in `YYYY-MM-DD HH:MM:SS` form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid timestamp {value:?}: {reason}")]
pub struct TimestampError {
    pub value: String,
    pub reason: String,
}

/// Shift a UTC wall-clock timestamp to GMT+8, keeping the format.
///
/// # Errors
///
/// Returns [`TimestampError`] when `utc` does not parse or the shifted value
/// is out of range.
pub fn utc_to_gmt8(utc: &str) -> Result<String, TimestampError> {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let err = |reason: String| TimestampError { value: utc.to_owned(), reason };

    let parsed = PrimitiveDateTime::parse(utc.trim(), format).map_err(|e| err(e.to_string()))?;
    let shifted = parsed
        .checked_add(Duration::hours(8))
        .ok_or_else(|| err("out of range".to_owned()))?;
    shifted.format(format).map_err(|e| err(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::utc_to_gmt8;

    #[test]
    fn shifts_by_eight_hours() {
        assert_eq!(utc_to_gmt8("2026-01-02 03:04:05").unwrap(), "2026-01-02 11:04:05");
    }

    #[test]
    fn crosses_midnight() {
        assert_eq!(utc_to_gmt8("2025-12-31 20:30:00").unwrap(), "2026-01-01 04:30:00");
    }

    #[test]
    fn rejects_other_formats() {
        assert!(utc_to_gmt8("2026-01-02T03:04:05Z").is_err());
        assert!(utc_to_gmt8("").is_err());
    }
}
