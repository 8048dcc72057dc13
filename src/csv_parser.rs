//! Loader for SMARD-style quarter-hourly production and consumption files
//!
//! # CSV Format
//!
//! - **Delimiter:** configurable, semicolon (`;`) in the published files
//! - **Encoding:** UTF-8, optional byte order mark
//! - **Decimal Separator:** comma, dot as thousands separator (`1.234,56`)
//! - **Date / Time:** `Datum` as DD.MM.YYYY, `Anfang` as HH:MM (interval start)
//! - **Header Row:** always present, columns matched by exact name
//!
//! Loading is all-or-nothing: the first bad row fails the whole table.
//!
//! # Examples
//!
//! ```rust
//! use energy_share_forecast::csv_parser::parse_consumption_csv;
//!
//! let csv = "Datum;Anfang;Ende;Gesamt (Netzlast) [MWh] Originalauflösungen
//! 01.01.2022;00:00;00:15;10.234,50
//! 01.01.2022;00:15;00:30;10.101,25";
//!
//! let table = parse_consumption_csv(csv, b';').unwrap();
//! assert_eq!(table.len(), 2);
//! assert_eq!(table.rows()[0].consumption, 10234.5);
//! ```

use std::collections::HashMap;
use std::path::Path;

use chrono::{NaiveDate, NaiveTime};
use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info};

use crate::csv_utils::HeaderIndex;
use crate::error::{ForecastError, ParseError, Result};
use crate::transformations::{
    format_date, parse_consumption_value, parse_date, parse_production_value, parse_time,
};
use crate::types::{
    ConsumptionRow, ConsumptionTable, EnergySource, IntervalKey, ProductionRow, ProductionTable,
};

/// Date column shared by both files
pub const DATE_COLUMN: &str = "Datum";
/// Interval start column shared by both files
pub const START_COLUMN: &str = "Anfang";
/// Grid load column of the consumption file
pub const CONSUMPTION_COLUMN: &str = "Gesamt (Netzlast) [MWh] Originalauflösungen";

/// Default delimiter of the published files
pub const DEFAULT_DELIMITER: u8 = b';';

const PRODUCTION_TABLE: &str = "production";
const CONSUMPTION_TABLE: &str = "consumption";

// ============================================================================
// Helper Functions
// ============================================================================

/// Assigns daylight-saving folds and rejects true duplicates
#[derive(Default)]
struct FoldTracker {
    seen: HashMap<(NaiveDate, NaiveTime), u8>,
}

impl FoldTracker {
    fn key(&mut self, date: NaiveDate, start: NaiveTime) -> std::result::Result<IntervalKey, ParseError> {
        let count = self.seen.entry((date, start)).or_insert(0);
        // Fall-back repeats one hour exactly once
        if *count > 1 {
            return Err(ParseError::DuplicateInterval {
                date: format_date(date),
                start: start.format("%H:%M").to_string(),
            });
        }
        let fold = *count;
        *count += 1;
        Ok(IntervalKey { date, start, fold })
    }
}

fn malformed(table: &'static str, line: u64, source: ParseError) -> ForecastError {
    ForecastError::MalformedRecord {
        table,
        line,
        source,
    }
}

/// Parse every row of `content` into `T`
///
/// `value_columns` are resolved after the date and start columns; `build`
/// receives the row key and the raw value strings in `value_columns` order.
fn parse_rows<T>(
    content: &str,
    delimiter: u8,
    table: &'static str,
    value_columns: &[&str],
    mut build: impl FnMut(IntervalKey, &[&str]) -> std::result::Result<T, ParseError>,
) -> Result<Vec<T>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(false)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    // Cloned so the reader can be borrowed mutably while iterating records
    let headers: StringRecord = reader
        .headers()
        .map_err(|e| malformed(table, 1, ParseError::CsvFormat(e.to_string())))?
        .clone();

    let mut required = vec![DATE_COLUMN, START_COLUMN];
    required.extend_from_slice(value_columns);
    let index = HeaderIndex::resolve(&headers, &required).map_err(|e| malformed(table, 1, e))?;

    let mut folds = FoldTracker::default();
    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result.map_err(|e| {
            let line = e.position().map(|p| p.line()).unwrap_or(0);
            malformed(table, line, ParseError::CsvFormat(e.to_string()))
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let row = parse_record(&record, &index, value_columns.len(), &mut folds, &mut build)
            .map_err(|e| malformed(table, line, e))?;
        rows.push(row);
    }

    debug!(table, rows = rows.len(), "parsed CSV rows");
    Ok(rows)
}

fn parse_record<T>(
    record: &StringRecord,
    index: &HeaderIndex,
    value_count: usize,
    folds: &mut FoldTracker,
    build: &mut impl FnMut(IntervalKey, &[&str]) -> std::result::Result<T, ParseError>,
) -> std::result::Result<T, ParseError> {
    let date = parse_date(index.field(record, 0))?;
    let start = parse_time(index.field(record, 1))?;
    let key = folds.key(date, start)?;

    let values: Vec<&str> = (0..value_count).map(|i| index.field(record, i + 2)).collect();
    build(key, &values)
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| ForecastError::from_io(path, e))
}

// ============================================================================
// Main Parsing Functions
// ============================================================================

/// Parse production CSV content into a [`ProductionTable`]
///
/// Placeholder (`-`) and empty cells become `0.0`.
///
/// # Returns
///
/// * `Ok(ProductionTable)` - rows in file order
/// * `Err(ForecastError::MalformedRecord)` - missing column, bad number, date or time
pub fn parse_production_csv(content: &str, delimiter: u8) -> Result<ProductionTable> {
    let columns = EnergySource::ALL.map(EnergySource::column_name);

    let rows = parse_rows(content, delimiter, PRODUCTION_TABLE, &columns, |key, values| {
        let mut row = ProductionRow::zeroed(key);
        for (source, raw) in EnergySource::ALL.iter().zip(values) {
            *row.get_mut(*source) = parse_production_value(raw)?;
        }
        Ok(row)
    })?;

    Ok(ProductionTable::new(rows))
}

/// Parse consumption CSV content into a [`ConsumptionTable`] in MWh
///
/// Unlike production, a missing grid load value is malformed.
pub fn parse_consumption_csv(content: &str, delimiter: u8) -> Result<ConsumptionTable> {
    let rows = parse_rows(
        content,
        delimiter,
        CONSUMPTION_TABLE,
        &[CONSUMPTION_COLUMN],
        |key, values| {
            Ok(ConsumptionRow {
                key,
                consumption: parse_consumption_value(values[0])?,
            })
        },
    )?;

    Ok(ConsumptionTable::in_mwh(rows))
}

/// Load the production file at `path`
pub fn load_production(path: impl AsRef<Path>, delimiter: u8) -> Result<ProductionTable> {
    let path = path.as_ref();
    let table = parse_production_csv(&read_file(path)?, delimiter)?;
    info!(path = %path.display(), rows = table.len(), "loaded production table");
    Ok(table)
}

/// Load the consumption file at `path`
pub fn load_consumption(path: impl AsRef<Path>, delimiter: u8) -> Result<ConsumptionTable> {
    let path = path.as_ref();
    let table = parse_consumption_csv(&read_file(path)?, delimiter)?;
    info!(path = %path.display(), rows = table.len(), "loaded consumption table");
    Ok(table)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const PRODUCTION_HEADER: &str = "Datum;Anfang;Ende;Biomasse [MWh] Originalauflösungen;Wasserkraft [MWh] Originalauflösungen;Wind Offshore [MWh] Originalauflösungen;Wind Onshore [MWh] Originalauflösungen;Photovoltaik [MWh] Originalauflösungen;Sonstige Erneuerbare [MWh] Originalauflösungen";
    const CONSUMPTION_HEADER: &str =
        "Datum;Anfang;Ende;Gesamt (Netzlast) [MWh] Originalauflösungen";

    fn production_csv(rows: &[&str]) -> String {
        let mut csv = PRODUCTION_HEADER.to_string();
        for row in rows {
            csv.push('\n');
            csv.push_str(row);
        }
        csv
    }

    fn expect_malformed(result: Result<impl std::fmt::Debug>) -> (u64, ParseError) {
        match result {
            Err(ForecastError::MalformedRecord { line, source, .. }) => (line, source),
            other => panic!("Expected MalformedRecord, got {other:?}"),
        }
    }

    // ========================================================================
    // parse_production_csv
    // ========================================================================

    #[test]
    fn test_parse_production_valid() {
        let csv = production_csv(&[
            "01.01.2022;00:00;00:15;1.134,25;412,5;1.950,00;8.012,75;0;44,5",
            "01.01.2022;00:15;00:30;1.130,00;410,0;1.900,00;7.990,00;0;44,0",
        ]);

        let table = parse_production_csv(&csv, b';').unwrap();

        assert_eq!(table.len(), 2);
        let first = &table.rows()[0];
        assert_eq!(first.biomass, 1134.25);
        assert_eq!(first.hydroelectric, 412.5);
        assert_eq!(first.wind_offshore, 1950.0);
        assert_eq!(first.wind_onshore, 8012.75);
        assert_eq!(first.photovoltaic, 0.0);
        assert_eq!(first.other_renewable, 44.5);
        assert_eq!(
            first.key.date,
            NaiveDate::from_ymd_opt(2022, 1, 1).unwrap()
        );
        assert_eq!(first.key.start, NaiveTime::from_hms_opt(0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_production_placeholder_is_zero() {
        let csv = production_csv(&["01.01.2022;00:00;00:15;-;-;-;100,0;-;-"]);

        let table = parse_production_csv(&csv, b';').unwrap();
        let row = &table.rows()[0];

        assert_eq!(row.wind_onshore, 100.0);
        assert_eq!(row.total(), 100.0);
    }

    #[test]
    fn test_total_equals_sum_of_sources_for_every_row() {
        let csv = production_csv(&[
            "01.01.2022;00:00;00:15;0,1;0,2;0,3;0,4;0,5;0,6",
            "01.01.2022;00:15;00:30;1.000,1;2.000,2;3,3;4,4;-;6,6",
        ]);

        let table = parse_production_csv(&csv, b';').unwrap();
        for row in table.rows() {
            let expected = row.biomass
                + row.hydroelectric
                + row.wind_offshore
                + row.wind_onshore
                + row.photovoltaic
                + row.other_renewable;
            assert_eq!(row.total(), expected);
        }
    }

    #[test]
    fn test_parse_production_missing_column() {
        let csv = "Datum;Anfang;Biomasse [MWh] Originalauflösungen\n01.01.2022;00:00;1,0";

        let (line, source) = expect_malformed(parse_production_csv(csv, b';'));
        assert_eq!(line, 1);
        assert!(matches!(source, ParseError::MissingColumn(_)));
    }

    #[test]
    fn test_parse_production_invalid_decimal_reports_line() {
        let csv = production_csv(&[
            "01.01.2022;00:00;00:15;1;1;1;1;1;1",
            "01.01.2022;00:15;00:30;1;abc;1;1;1;1",
        ]);

        let (line, source) = expect_malformed(parse_production_csv(&csv, b';'));
        assert_eq!(line, 3);
        assert_eq!(source, ParseError::InvalidDecimal("abc".to_string()));
    }

    #[test]
    fn test_parse_production_invalid_date() {
        let csv = production_csv(&["2022-01-01;00:00;00:15;1;1;1;1;1;1"]);

        let (_, source) = expect_malformed(parse_production_csv(&csv, b';'));
        assert!(matches!(source, ParseError::InvalidDate(_)));
    }

    #[test]
    fn test_parse_production_wrong_field_count() {
        let csv = production_csv(&["01.01.2022;00:00;00:15;1;1;1"]);

        let (_, source) = expect_malformed(parse_production_csv(&csv, b';'));
        assert!(matches!(source, ParseError::CsvFormat(_)));
    }

    #[test]
    fn test_parse_production_wrong_delimiter() {
        let csv = production_csv(&["01.01.2022;00:00;00:15;1;1;1;1;1;1"]);

        // Whole header collapses into one column
        assert!(parse_production_csv(&csv, b',').is_err());
    }

    #[test]
    fn test_parse_production_byte_order_mark() {
        let csv = format!(
            "\u{feff}{}",
            production_csv(&["01.01.2022;00:00;00:15;1;1;1;1;1;1"])
        );

        let table = parse_production_csv(&csv, b';').unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_parse_production_extra_columns_ignored() {
        let csv = format!(
            "{};Kernenergie [MWh] Originalauflösungen\n01.01.2022;00:00;00:15;1;1;1;1;1;1;5.000",
            PRODUCTION_HEADER
        );

        let table = parse_production_csv(&csv, b';').unwrap();
        assert_eq!(table.rows()[0].total(), 6.0);
    }

    // ========================================================================
    // interval keys
    // ========================================================================

    #[test]
    fn test_daylight_saving_fall_back_gets_fold() {
        let csv = production_csv(&[
            "30.10.2022;02:00;02:15;1;1;1;1;1;1",
            "30.10.2022;02:00;02:15;2;2;2;2;2;2",
        ]);

        let table = parse_production_csv(&csv, b';').unwrap();
        assert_eq!(table.rows()[0].key.fold, 0);
        assert_eq!(table.rows()[1].key.fold, 1);
        assert_ne!(table.rows()[0].key, table.rows()[1].key);
    }

    #[test]
    fn test_third_occurrence_is_duplicate() {
        let csv = production_csv(&[
            "30.10.2022;02:00;02:15;1;1;1;1;1;1",
            "30.10.2022;02:00;02:15;1;1;1;1;1;1",
            "30.10.2022;02:00;02:15;1;1;1;1;1;1",
        ]);

        let (line, source) = expect_malformed(parse_production_csv(&csv, b';'));
        assert_eq!(line, 4);
        assert_eq!(
            source,
            ParseError::DuplicateInterval {
                date: "30.10.2022".to_string(),
                start: "02:00".to_string(),
            }
        );
        assert_eq!(source.to_string(), "Duplicate interval: 30.10.2022 02:00");
    }

    // ========================================================================
    // parse_consumption_csv
    // ========================================================================

    #[test]
    fn test_parse_consumption_valid() {
        let csv = format!(
            "{}\n01.01.2022;00:00;00:15;10.234,50\n01.01.2022;00:15;00:30;9.876,00",
            CONSUMPTION_HEADER
        );

        let table = parse_consumption_csv(&csv, b';').unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].consumption, 10234.5);
        assert_eq!(table.rows()[1].consumption, 9876.0);
        assert_eq!(table.total_mwh(), 20110.5);
    }

    #[test]
    fn test_parse_consumption_placeholder_fails() {
        let csv = format!("{}\n01.01.2022;00:00;00:15;-", CONSUMPTION_HEADER);

        let (line, _) = expect_malformed(parse_consumption_csv(&csv, b';'));
        assert_eq!(line, 2);
    }

    #[test]
    fn test_parse_consumption_empty_input() {
        assert!(parse_consumption_csv("", b';').is_err());
    }

    // ========================================================================
    // load_*
    // ========================================================================

    #[test]
    fn test_load_missing_file() {
        let result = load_consumption("/definitely/not/here.csv", b';');
        assert!(matches!(result, Err(ForecastError::FileNotFound { .. })));
    }
}
