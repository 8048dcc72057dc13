//! Shared CSV utilities
//!
//! Column names are resolved to positions once per file ([`HeaderIndex::resolve`]),
//! so every row lookup afterwards is positional and cannot miss a column.

use csv::StringRecord;

use crate::error::ParseError;

/// Positions of required columns within a header row
///
/// Built from a list of column names; lookups use the same index into that list.
#[derive(Debug, Clone)]
pub struct HeaderIndex {
    positions: Vec<usize>,
}

impl HeaderIndex {
    /// Resolve `required` column names against `headers`
    ///
    /// Matching is byte-for-byte. Extra columns are ignored.
    ///
    /// # Returns
    ///
    /// * `Ok(HeaderIndex)` - positions in the order of `required`
    /// * `Err(ParseError::MissingColumn)` - first required column not present
    ///
    /// # Example
    ///
    /// ```rust
    /// use csv::StringRecord;
    /// use energy_share_forecast::csv_utils::HeaderIndex;
    ///
    /// let headers = StringRecord::from(vec!["Datum", "Anfang", "Ende"]);
    /// let record = StringRecord::from(vec!["01.01.2022", "00:00", "00:15"]);
    ///
    /// let index = HeaderIndex::resolve(&headers, &["Anfang", "Datum"]).unwrap();
    /// assert_eq!(index.field(&record, 0), "00:00");
    /// assert_eq!(index.field(&record, 1), "01.01.2022");
    /// ```
    pub fn resolve(headers: &StringRecord, required: &[&str]) -> Result<Self, ParseError> {
        let positions = required
            .iter()
            .map(|name| {
                headers
                    .iter()
                    .position(|h| h == *name)
                    .ok_or_else(|| ParseError::MissingColumn(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { positions })
    }

    /// Value of the `slot`-th required column in `record`
    ///
    /// Rows are read with a strict column count, so a resolved position is always
    /// present. A short row yields an empty string, which the value parsers reject
    /// or map to their placeholder.
    pub fn field<'a>(&self, record: &'a StringRecord, slot: usize) -> &'a str {
        self.positions
            .get(slot)
            .and_then(|&idx| record.get(idx))
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_success() {
        let headers = StringRecord::from(vec!["col1", "col2", "col3"]);
        let record = StringRecord::from(vec!["a", "b", "c"]);

        let index = HeaderIndex::resolve(&headers, &["col3", "col1"]).unwrap();
        assert_eq!(index.field(&record, 0), "c");
        assert_eq!(index.field(&record, 1), "a");
    }

    #[test]
    fn test_resolve_missing_column() {
        let headers = StringRecord::from(vec!["col1", "col2"]);

        assert_eq!(
            HeaderIndex::resolve(&headers, &["col1", "col3"]).unwrap_err(),
            ParseError::MissingColumn("col3".to_string())
        );
    }

    #[test]
    fn test_resolve_is_exact_match() {
        // Source headers carry a unit suffix; a prefix is not enough
        let headers = StringRecord::from(vec!["Biomasse [MWh] Originalauflösungen"]);

        assert!(HeaderIndex::resolve(&headers, &["Biomasse"]).is_err());
        assert!(HeaderIndex::resolve(&headers, &["Biomasse [MWh] Originalauflösungen"]).is_ok());
    }

    #[test]
    fn test_field_empty_value() {
        let headers = StringRecord::from(vec!["col1"]);
        let record = StringRecord::from(vec![""]);

        let index = HeaderIndex::resolve(&headers, &["col1"]).unwrap();
        assert_eq!(index.field(&record, 0), "");
    }
}
