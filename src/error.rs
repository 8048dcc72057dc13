//! Error types for the renewable share pipeline
//!
//! Two levels, mirroring how failures surface:
//! - [`ParseError`]: a single field or header in a source file could not be understood
//! - [`ForecastError`]: a whole pipeline stage failed (I/O, malformed table, bad scenario)
//!
//! Every failure is fatal for the run. There is no partial-table recovery.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Top-level error type
///
/// Supports automatic conversion from [`ParseError`] for code paths that have no
/// table/line context to attach.
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Source file does not exist
    #[error("Input file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Source file exists but could not be read
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A row of a source table failed to parse
    ///
    /// `line` is the 1-based line in the source file (header is line 1).
    #[error("Malformed record in {table} table at line {line}: {source}")]
    MalformedRecord {
        table: &'static str,
        line: u64,
        #[source]
        source: ParseError,
    },

    /// Reference or target year missing from (or incomplete in) the loaded data
    #[error("Year mismatch for {expected}: {detail}")]
    YearMismatch { expected: i32, detail: String },

    /// Scenario parameter violates a range or sign invariant
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Production and consumption tables do not describe the same intervals
    #[error("Production and consumption intervals differ at position {position}: {detail}")]
    IntervalMismatch { position: usize, detail: String },

    /// Scenario configuration file is not valid JSON for [`crate::config::ScenarioConfig`]
    #[error("Invalid scenario configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// Parse failure without row context (e.g. a single date supplied by a caller)
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

impl ForecastError {
    /// Map an `std::io::Error` for `path`, separating "missing" from other I/O failures
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            ForecastError::FileNotFound { path }
        } else {
            ForecastError::Io { path, source }
        }
    }

    pub(crate) fn year_mismatch(expected: i32, detail: impl Into<String>) -> Self {
        ForecastError::YearMismatch {
            expected,
            detail: detail.into(),
        }
    }
}

/// Field-level parsing errors
///
/// Occurs while cleaning German-formatted CSV values into typed records.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// Value is not a number in German notation
    ///
    /// Example: "1.234,5x"
    #[error("Invalid decimal format: '{0}' (expected German format like 1.234,56)")]
    InvalidDecimal(String),

    /// Negative energy value (physically impossible for produced or consumed MWh)
    #[error("Negative energy value not allowed: '{0}'")]
    NegativeValue(String),

    /// Date not in DD.MM.YYYY
    ///
    /// Example: "32.10.2022"
    #[error("Invalid date: '{0}' (expected DD.MM.YYYY)")]
    InvalidDate(String),

    /// Time not in HH:MM
    #[error("Invalid time: '{0}' (expected HH:MM)")]
    InvalidTime(String),

    /// Required CSV column is missing
    ///
    /// Example: Missing "Datum" column
    #[error("Missing required column: '{0}'")]
    MissingColumn(String),

    /// Same (date, start) seen more often than a daylight-saving fall-back allows
    ///
    /// Both fields in source notation, e.g. "30.10.2022" and "02:00"
    #[error("Duplicate interval: {date} {start}")]
    DuplicateInterval { date: String, start: String },

    /// CSV format error (wrong delimiter, malformed row)
    #[error("CSV format error: {0}")]
    CsvFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_conversion() {
        let err = ParseError::InvalidDecimal("1.2a".to_string());
        let top: ForecastError = err.into();

        match top {
            ForecastError::Parse(ParseError::InvalidDecimal(val)) => {
                assert_eq!(val, "1.2a");
            }
            other => panic!("Expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_io_not_found_maps_to_file_not_found() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = ForecastError::from_io("missing.csv", io);

        assert!(matches!(err, ForecastError::FileNotFound { .. }));
        assert!(err.to_string().contains("missing.csv"));
    }

    #[test]
    fn test_io_other_maps_to_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err = ForecastError::from_io("locked.csv", io);

        assert!(matches!(err, ForecastError::Io { .. }));
    }

    #[test]
    fn test_malformed_record_display() {
        let err = ForecastError::MalformedRecord {
            table: "production",
            line: 7,
            source: ParseError::MissingColumn("Datum".to_string()),
        };
        let msg = err.to_string();

        assert!(msg.contains("production"));
        assert!(msg.contains("line 7"));
        assert!(msg.contains("Datum"));
    }
}
