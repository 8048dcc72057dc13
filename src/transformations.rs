//! Cleaning transformations for German-formatted energy CSV data
//!
//! # Transformations
//!
//! 1. **German decimal conversion**: `"1.234,56"` → `1234.56`
//! 2. **Placeholder mapping**: `"-"` → `0.0` (production columns only)
//! 3. **Date parsing**: `"15.06.2022"` → `2022-06-15`
//! 4. **Time parsing**: `"13:45"` → `13:45:00`
//! 5. **Interval end**: start + 15 minutes, rolling over midnight
//! 6. **Year shift**: `2022-06-15` → `2030-06-15`
//!
//! # Example
//!
//! ```rust
//! use energy_share_forecast::transformations::*;
//!
//! assert_eq!(parse_german_decimal("1.234,56").unwrap(), 1234.56);
//! assert_eq!(parse_production_value("-").unwrap(), 0.0);
//! ```

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};

use crate::error::ParseError;

/// Fixed length of one source interval
pub const INTERVAL_MINUTES: i64 = 15;

/// Marker the source files use for "no data" in production columns
pub const NO_DATA_PLACEHOLDER: &str = "-";

const DATE_FORMAT: &str = "%d.%m.%Y";
const TIME_FORMAT: &str = "%H:%M";

// ============================================================================
// Transformation 1: German Decimal Conversion
// ============================================================================

/// Parse German decimal format (dot thousands separator, comma decimal separator)
///
/// # Returns
///
/// * `Ok(f64)` - Parsed finite value
/// * `Err(ParseError::InvalidDecimal)` - Empty, non-numeric or non-finite input
///
/// # Examples
///
/// ```
/// # use energy_share_forecast::transformations::parse_german_decimal;
/// assert_eq!(parse_german_decimal("1.234,56").unwrap(), 1234.56);
/// assert_eq!(parse_german_decimal("12.345.678").unwrap(), 12345678.0);
/// assert_eq!(parse_german_decimal("0,25").unwrap(), 0.25);
/// assert!(parse_german_decimal("").is_err());
/// assert!(parse_german_decimal("abc").is_err());
/// ```
pub fn parse_german_decimal(value: &str) -> Result<f64, ParseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ParseError::InvalidDecimal(value.to_string()));
    }

    let normalized = trimmed.replace('.', "").replace(',', ".");
    let parsed = normalized
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidDecimal(value.to_string()))?;

    // "inf" and "NaN" are accepted by f64::from_str but never valid here
    if !parsed.is_finite() {
        return Err(ParseError::InvalidDecimal(value.to_string()));
    }

    Ok(parsed)
}

// ============================================================================
// Transformation 2: Placeholder Mapping
// ============================================================================

/// Parse a production value, mapping the "no data" placeholder to zero
///
/// Empty cells count as missing too. Negative values are rejected since a
/// generation source cannot produce negative energy.
///
/// # Examples
///
/// ```
/// # use energy_share_forecast::transformations::parse_production_value;
/// assert_eq!(parse_production_value("-").unwrap(), 0.0);
/// assert_eq!(parse_production_value("").unwrap(), 0.0);
/// assert_eq!(parse_production_value("4.512,25").unwrap(), 4512.25);
/// assert!(parse_production_value("-12,5").is_err());
/// ```
pub fn parse_production_value(value: &str) -> Result<f64, ParseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == NO_DATA_PLACEHOLDER {
        return Ok(0.0);
    }

    non_negative(value, parse_german_decimal(trimmed)?)
}

/// Parse a consumption value
///
/// Consumption has no placeholder: a missing grid load is a malformed record.
pub fn parse_consumption_value(value: &str) -> Result<f64, ParseError> {
    non_negative(value, parse_german_decimal(value)?)
}

fn non_negative(raw: &str, parsed: f64) -> Result<f64, ParseError> {
    if parsed < 0.0 {
        return Err(ParseError::NegativeValue(raw.to_string()));
    }
    Ok(parsed)
}

// ============================================================================
// Transformation 3/4: Date and Time Parsing
// ============================================================================

/// Parse a German date (DD.MM.YYYY)
///
/// ```
/// # use energy_share_forecast::transformations::parse_date;
/// # use chrono::NaiveDate;
/// assert_eq!(parse_date("15.06.2022").unwrap(), NaiveDate::from_ymd_opt(2022, 6, 15).unwrap());
/// assert!(parse_date("2022-06-15").is_err());
/// ```
pub fn parse_date(datum: &str) -> Result<NaiveDate, ParseError> {
    NaiveDate::parse_from_str(datum.trim(), DATE_FORMAT)
        .map_err(|_| ParseError::InvalidDate(datum.to_string()))
}

/// Parse a start-of-interval time (HH:MM)
pub fn parse_time(zeit: &str) -> Result<NaiveTime, ParseError> {
    NaiveTime::parse_from_str(zeit.trim(), TIME_FORMAT)
        .map_err(|_| ParseError::InvalidTime(zeit.to_string()))
}

/// Format a date back into the German source notation
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

// ============================================================================
// Transformation 5: Interval End
// ============================================================================

/// End of the interval starting at `date` `start`
///
/// The last interval of a day (23:45) ends at 00:00 of the next date.
///
/// ```
/// # use energy_share_forecast::transformations::interval_end;
/// # use chrono::{NaiveDate, NaiveTime};
/// let date = NaiveDate::from_ymd_opt(2022, 12, 31).unwrap();
/// let start = NaiveTime::from_hms_opt(23, 45, 0).unwrap();
/// let (end_date, end_time) = interval_end(date, start);
/// assert_eq!(end_date, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
/// assert_eq!(end_time, NaiveTime::from_hms_opt(0, 0, 0).unwrap());
/// ```
pub fn interval_end(date: NaiveDate, start: NaiveTime) -> (NaiveDate, NaiveTime) {
    let end = date.and_time(start) + Duration::minutes(INTERVAL_MINUTES);
    (end.date(), end.time())
}

// ============================================================================
// Transformation 6: Year Shift
// ============================================================================

/// Move `date` into `year`, keeping month and day
///
/// Returns `None` for 29 February when `year` is not a leap year. Weekday
/// alignment is not preserved.
///
/// ```
/// # use energy_share_forecast::transformations::shift_year;
/// # use chrono::NaiveDate;
/// let d = NaiveDate::from_ymd_opt(2022, 6, 15).unwrap();
/// assert_eq!(shift_year(d, 2030), NaiveDate::from_ymd_opt(2030, 6, 15));
///
/// let leap = NaiveDate::from_ymd_opt(2020, 2, 29).unwrap();
/// assert_eq!(shift_year(leap, 2030), None);
/// ```
pub fn shift_year(date: NaiveDate, year: i32) -> Option<NaiveDate> {
    date.with_year(year)
}

/// Number of calendar days in `year`
pub fn days_in_year(year: i32) -> u32 {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366
    } else {
        365
    }
}

// ============================================================================
// TESTS
// ============================================================================
