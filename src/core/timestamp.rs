//! Timestamp formatting utilities
//!
//! Console output and rotating file names both render timestamps through a
//! [`TimestampFormat`], which is configured from a short name or from a raw
//! strftime pattern.

use super::error::{LoggerError, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use std::fmt::{self, Write as _};

/// Timestamp format options
///
/// # Examples
///
/// ```
/// use rust_log_facade::TimestampFormat;
///
/// assert_eq!(TimestampFormat::parse("rfc3339"), TimestampFormat::Rfc3339);
/// assert_eq!(
///     TimestampFormat::parse("%Y-%m-%d"),
///     TimestampFormat::Custom("%Y-%m-%d".to_string())
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TimestampFormat {
    /// RFC 3339 at second precision: `2025-01-08T10:30:45Z`
    #[default]
    Rfc3339,

    /// ISO 8601 with milliseconds: `2025-01-08T10:30:45.123Z`
    Iso8601,

    /// ISO 8601 with microseconds: `2025-01-08T10:30:45.123456Z`
    Iso8601Micros,

    /// Unix timestamp in seconds: `1736332245`
    Unix,

    /// Unix timestamp in milliseconds: `1736332245123`
    UnixMillis,

    /// Unix timestamp in microseconds: `1736332245123456`
    UnixMicros,

    /// Custom strftime format
    Custom(String),
}

impl TimestampFormat {
    /// Resolve a configuration value: a known short name (case-insensitive)
    /// or otherwise a strftime pattern.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "rfc3339" => TimestampFormat::Rfc3339,
            "iso8601" => TimestampFormat::Iso8601,
            "iso8601_micros" => TimestampFormat::Iso8601Micros,
            "unix" => TimestampFormat::Unix,
            "unix_millis" => TimestampFormat::UnixMillis,
            "unix_micros" => TimestampFormat::UnixMicros,
            _ => TimestampFormat::Custom(value.to_string()),
        }
    }

    /// Format a `DateTime<Utc>` according to this format
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        match self {
            TimestampFormat::Rfc3339 => datetime.to_rfc3339_opts(SecondsFormat::Secs, true),
            TimestampFormat::Iso8601 => datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            TimestampFormat::Iso8601Micros => datetime.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
            TimestampFormat::Unix => datetime.timestamp().to_string(),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::UnixMicros => datetime.timestamp_micros().to_string(),
            TimestampFormat::Custom(format_str) => {
                // An invalid pattern makes chrono's Display fail
                let mut rendered = String::new();
                match write!(rendered, "{}", datetime.format(format_str)) {
                    Ok(()) => rendered,
                    Err(_) => datetime.to_rfc3339_opts(SecondsFormat::Secs, true),
                }
            }
        }
    }

    /// Reject custom patterns containing unknown strftime specifiers
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidConfiguration`] naming the pattern.
    pub fn validate(&self) -> Result<()> {
        if let TimestampFormat::Custom(pattern) = self {
            if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
                return Err(LoggerError::config(
                    "timestamp",
                    format!("invalid strftime pattern '{}'", pattern),
                ));
            }
        }
        Ok(())
    }

    /// Parse a string produced by [`format`](Self::format) back into a UTC
    /// timestamp. Custom patterns without an offset are read as UTC.
    #[must_use]
    pub fn parse_timestamp(&self, value: &str) -> Option<DateTime<Utc>> {
        match self {
            TimestampFormat::Rfc3339 | TimestampFormat::Iso8601 | TimestampFormat::Iso8601Micros => {
                DateTime::parse_from_rfc3339(value)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc))
            }
            TimestampFormat::Unix => DateTime::from_timestamp(value.parse().ok()?, 0),
            TimestampFormat::UnixMillis => DateTime::from_timestamp_millis(value.parse().ok()?),
            TimestampFormat::UnixMicros => DateTime::from_timestamp_micros(value.parse().ok()?),
            TimestampFormat::Custom(format_str) => DateTime::parse_from_str(value, format_str)
                .map(|dt| dt.with_timezone(&Utc))
                .or_else(|_| {
                    NaiveDateTime::parse_from_str(value, format_str).map(|naive| naive.and_utc())
                })
                .ok()
                .or_else(|| {
                    // Date-only patterns such as daily file names
                    NaiveDate::parse_from_str(value, format_str)
                        .ok()?
                        .and_hms_opt(0, 0, 0)
                        .map(|naive| naive.and_utc())
                }),
        }
    }

    /// Check if this is a Unix-based numeric format
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TimestampFormat::Unix | TimestampFormat::UnixMillis | TimestampFormat::UnixMicros
        )
    }
}

impl fmt::Display for TimestampFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampFormat::Rfc3339 => f.write_str("rfc3339"),
            TimestampFormat::Iso8601 => f.write_str("iso8601"),
            TimestampFormat::Iso8601Micros => f.write_str("iso8601_micros"),
            TimestampFormat::Unix => f.write_str("unix"),
            TimestampFormat::UnixMillis => f.write_str("unix_millis"),
            TimestampFormat::UnixMicros => f.write_str("unix_micros"),
            TimestampFormat::Custom(format_str) => f.write_str(format_str),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_datetime() -> DateTime<Utc> {
        // 2025-01-08 10:30:45.123456 UTC
        Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
            .single()
            .expect("valid datetime")
            + chrono::Duration::microseconds(123456)
    }

    #[test]
    fn test_rfc3339_format() {
        let result = TimestampFormat::Rfc3339.format(&fixed_datetime());
        assert_eq!(result, "2025-01-08T10:30:45Z");
    }

    #[test]
    fn test_iso8601_formats() {
        assert_eq!(
            TimestampFormat::Iso8601.format(&fixed_datetime()),
            "2025-01-08T10:30:45.123Z"
        );
        assert_eq!(
            TimestampFormat::Iso8601Micros.format(&fixed_datetime()),
            "2025-01-08T10:30:45.123456Z"
        );
    }

    #[test]
    fn test_unix_formats() {
        let secs: i64 = TimestampFormat::Unix.format(&fixed_datetime()).parse().unwrap();
        let millis: i64 = TimestampFormat::UnixMillis.format(&fixed_datetime()).parse().unwrap();
        let micros: i64 = TimestampFormat::UnixMicros.format(&fixed_datetime()).parse().unwrap();
        assert_eq!(millis / 1000, secs);
        assert_eq!(micros / 1000, millis);
    }

    #[test]
    fn test_custom_format() {
        let format = TimestampFormat::Custom("%d/%b/%Y:%H:%M:%S +0000".to_string());
        assert_eq!(format.format(&fixed_datetime()), "08/Jan/2025:10:30:45 +0000");
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(TimestampFormat::parse("ISO8601"), TimestampFormat::Iso8601);
        assert_eq!(TimestampFormat::parse("unix_micros"), TimestampFormat::UnixMicros);
        assert_eq!(TimestampFormat::parse("%H:%M").to_string(), "%H:%M");
    }

    #[test]
    fn test_parse_timestamp_custom_without_offset() {
        let format = TimestampFormat::Custom("%Y-%m-%dT%H-%M-%S%.6f".to_string());
        let rendered = format.format(&fixed_datetime());
        assert_eq!(rendered, "2025-01-08T10-30-45.123456");
        assert_eq!(format.parse_timestamp(&rendered), Some(fixed_datetime()));
    }

    #[test]
    fn test_parse_timestamp_named_formats() {
        let secs = Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).unwrap();
        for format in [TimestampFormat::Rfc3339, TimestampFormat::Unix] {
            let rendered = format.format(&secs);
            assert_eq!(format.parse_timestamp(&rendered), Some(secs), "{}", format);
        }
        assert_eq!(TimestampFormat::Unix.parse_timestamp("not-a-number"), None);
    }

    #[test]
    fn test_parse_timestamp_date_only() {
        let format = TimestampFormat::parse("%Y-%m-%d");
        let midnight = Utc.with_ymd_and_hms(2025, 1, 8, 0, 0, 0).unwrap();
        assert_eq!(format.format(&fixed_datetime()), "2025-01-08");
        assert_eq!(format.parse_timestamp("2025-01-08"), Some(midnight));
        assert_eq!(format.parse_timestamp("2025-13-08"), None);
    }

    #[test]
    fn test_invalid_custom_pattern() {
        let format = TimestampFormat::parse("%Y-%Q");
        let err = format.validate().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { ref component, .. } if component == "timestamp"));

        // Formatting never panics; it falls back to RFC 3339
        assert_eq!(format.format(&fixed_datetime()), "2025-01-08T10:30:45Z");

        assert!(TimestampFormat::parse("%Y-%m-%dT%H-%M-%S%.6f").validate().is_ok());
        assert!(TimestampFormat::Unix.validate().is_ok());
    }

    #[test]
    fn test_is_numeric() {
        assert!(!TimestampFormat::Rfc3339.is_numeric());
        assert!(TimestampFormat::Unix.is_numeric());
        assert!(TimestampFormat::UnixMillis.is_numeric());
        assert!(!TimestampFormat::Custom("%Y".to_string()).is_numeric());
    }
}
