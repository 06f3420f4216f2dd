use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{AppError, Result};

/// Strict UTC ISO-8601 timestamp: zero-padded date and time, optional
/// fractional seconds, mandatory `Z` suffix. The value ends up embedded in a
/// query expression, so anything looser is rejected outright.
static UTC_TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?Z$").expect("utc timestamp pattern")
});

/// Lowercase alphanumeric with `-` and `_` separators. Table and dataset names
/// are interpolated into SQL, so this is an injection boundary.
static SQL_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_-]*$").expect("sql identifier pattern"));

pub fn ensure_utc_timestamp(value: &str) -> Result<&str> {
    if UTC_TIMESTAMP.is_match(value) {
        Ok(value)
    } else {
        Err(AppError::validation(format!(
            "not a strict UTC ISO-8601 timestamp: {value:?}"
        )))
    }
}

pub fn ensure_sql_identifier(value: &str) -> Result<&str> {
    if SQL_IDENTIFIER.is_match(value) {
        Ok(value)
    } else {
        Err(AppError::validation(format!(
            "not a valid identifier: {value:?}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_fractional_utc_timestamps() {
        assert!(ensure_utc_timestamp("2025-01-01T00:00:00Z").is_ok());
        assert!(ensure_utc_timestamp("2025-01-01T00:00:00.123Z").is_ok());
    }

    #[test]
    fn rejects_loose_timestamps() {
        assert!(ensure_utc_timestamp("2025-1-1T00:00:00Z").is_err());
        assert!(ensure_utc_timestamp("2025-01-01T00:00:00+00:00").is_err());
        assert!(ensure_utc_timestamp("2025-01-01 00:00:00Z").is_err());
        assert!(ensure_utc_timestamp("2025-01-01").is_err());
        assert!(ensure_utc_timestamp("2025-01-01T00:00:00Z OR 1=1").is_err());
    }

    #[test]
    fn identifier_pattern_is_lowercase_only() {
        assert!(ensure_sql_identifier("issues_staging").is_ok());
        assert!(ensure_sql_identifier("ops-dataset1").is_ok());
        assert!(ensure_sql_identifier("Issues").is_err());
        assert!(ensure_sql_identifier("issues; drop table x").is_err());
        assert!(ensure_sql_identifier("").is_err());
    }
}
