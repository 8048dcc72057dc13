//! Typed records for quarter-hourly production and consumption data
//!
//! The loader validates every column once; downstream stages only see these
//! structs and never look columns up by name again.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::Serialize;

use crate::transformations::{interval_end, shift_year};

/// Renewable generation sources present in the production file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergySource {
    Biomass,
    Hydroelectric,
    WindOffshore,
    WindOnshore,
    Photovoltaic,
    OtherRenewable,
}

impl EnergySource {
    /// All sources, in source file column order
    pub const ALL: [EnergySource; 6] = [
        EnergySource::Biomass,
        EnergySource::Hydroelectric,
        EnergySource::WindOffshore,
        EnergySource::WindOnshore,
        EnergySource::Photovoltaic,
        EnergySource::OtherRenewable,
    ];

    /// Exact header of this source's column in the production file
    pub fn column_name(self) -> &'static str {
        match self {
            EnergySource::Biomass => "Biomasse [MWh] Originalauflösungen",
            EnergySource::Hydroelectric => "Wasserkraft [MWh] Originalauflösungen",
            EnergySource::WindOffshore => "Wind Offshore [MWh] Originalauflösungen",
            EnergySource::WindOnshore => "Wind Onshore [MWh] Originalauflösungen",
            EnergySource::Photovoltaic => "Photovoltaik [MWh] Originalauflösungen",
            EnergySource::OtherRenewable => "Sonstige Erneuerbare [MWh] Originalauflösungen",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EnergySource::Biomass => "Biomass",
            EnergySource::Hydroelectric => "Hydroelectric",
            EnergySource::WindOffshore => "Wind Offshore",
            EnergySource::WindOnshore => "Wind Onshore",
            EnergySource::Photovoltaic => "Photovoltaic",
            EnergySource::OtherRenewable => "Other Renewable",
        }
    }
}

/// Unique key of one quarter-hour interval
///
/// Source timestamps are local time. On the daylight-saving fall-back day one
/// hour of start times appears twice; `fold` is 0 for the first and 1 for the
/// repeated occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct IntervalKey {
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub fold: u8,
}

impl IntervalKey {
    pub fn new(date: NaiveDate, start: NaiveTime) -> Self {
        Self {
            date,
            start,
            fold: 0,
        }
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    /// End of the interval (start + 15 minutes, next date after 23:45)
    pub fn end(&self) -> (NaiveDate, NaiveTime) {
        interval_end(self.date, self.start)
    }

    /// Same interval moved into `year`; `None` for 29 February in a non-leap year
    pub fn with_year(&self, year: i32) -> Option<Self> {
        shift_year(self.date, year).map(|date| Self { date, ..*self })
    }
}

/// One quarter-hour of renewable production, in MWh per source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductionRow {
    pub key: IntervalKey,
    pub biomass: f64,
    pub hydroelectric: f64,
    pub wind_offshore: f64,
    pub wind_onshore: f64,
    pub photovoltaic: f64,
    pub other_renewable: f64,
}

impl ProductionRow {
    /// Row with every source set to zero
    pub fn zeroed(key: IntervalKey) -> Self {
        Self {
            key,
            biomass: 0.0,
            hydroelectric: 0.0,
            wind_offshore: 0.0,
            wind_onshore: 0.0,
            photovoltaic: 0.0,
            other_renewable: 0.0,
        }
    }

    pub fn get(&self, source: EnergySource) -> f64 {
        match source {
            EnergySource::Biomass => self.biomass,
            EnergySource::Hydroelectric => self.hydroelectric,
            EnergySource::WindOffshore => self.wind_offshore,
            EnergySource::WindOnshore => self.wind_onshore,
            EnergySource::Photovoltaic => self.photovoltaic,
            EnergySource::OtherRenewable => self.other_renewable,
        }
    }

    pub fn get_mut(&mut self, source: EnergySource) -> &mut f64 {
        match source {
            EnergySource::Biomass => &mut self.biomass,
            EnergySource::Hydroelectric => &mut self.hydroelectric,
            EnergySource::WindOffshore => &mut self.wind_offshore,
            EnergySource::WindOnshore => &mut self.wind_onshore,
            EnergySource::Photovoltaic => &mut self.photovoltaic,
            EnergySource::OtherRenewable => &mut self.other_renewable,
        }
    }

    /// Total renewable production of this interval (sum of all six sources)
    ///
    /// Always derived from the source values, so it cannot drift after scaling.
    ///
    /// # Examples
    ///
    /// ```
    /// # use chrono::{NaiveDate, NaiveTime};
    /// # use energy_share_forecast::{IntervalKey, ProductionRow};
    /// let key = IntervalKey::new(
    ///     NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
    ///     NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
    /// );
    /// let row = ProductionRow {
    ///     wind_onshore: 100.0,
    ///     photovoltaic: 50.0,
    ///     ..ProductionRow::zeroed(key)
    /// };
    /// assert_eq!(row.total(), 150.0);
    /// ```
    pub fn total(&self) -> f64 {
        EnergySource::ALL.iter().map(|&s| self.get(s)).sum()
    }
}

/// One quarter-hour of total grid load
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumptionRow {
    pub key: IntervalKey,
    /// Grid load in the table's [`EnergyUnit`]
    pub consumption: f64,
}

/// Unit of the values in a [`ConsumptionTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EnergyUnit {
    #[serde(rename = "MWh")]
    MegawattHours,
    #[serde(rename = "kWh")]
    KilowattHours,
}

/// Ordered quarter-hourly production records
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductionTable {
    rows: Vec<ProductionRow>,
}

impl ProductionTable {
    pub fn new(rows: Vec<ProductionRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[ProductionRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Calendar years present, ascending
    pub fn years(&self) -> BTreeSet<i32> {
        self.rows.iter().map(|r| r.key.year()).collect()
    }

    /// Copy of the rows dated in `year`
    pub fn for_year(&self, year: i32) -> ProductionTable {
        ProductionTable::new(
            self.rows
                .iter()
                .filter(|r| r.key.year() == year)
                .cloned()
                .collect(),
        )
    }

    /// Rows of a single date, in file order
    pub fn for_date(&self, date: NaiveDate) -> impl Iterator<Item = &ProductionRow> {
        self.rows.iter().filter(move |r| r.key.date == date)
    }

    /// Sum of [`ProductionRow::total`] over all rows
    pub fn total(&self) -> f64 {
        self.rows.iter().map(ProductionRow::total).sum()
    }
}

/// Ordered quarter-hourly consumption records
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumptionTable {
    unit: EnergyUnit,
    /// How many table units make one MWh (1 for MWh, 1000 for kWh)
    units_per_mwh: f64,
    rows: Vec<ConsumptionRow>,
}

impl ConsumptionTable {
    /// Table with values in MWh, as loaded from the source file
    pub fn in_mwh(rows: Vec<ConsumptionRow>) -> Self {
        Self {
            unit: EnergyUnit::MegawattHours,
            units_per_mwh: 1.0,
            rows,
        }
    }

    /// Table with values in kWh, `kwh_per_mwh` kWh making one MWh
    pub fn in_kwh(rows: Vec<ConsumptionRow>, kwh_per_mwh: f64) -> Self {
        Self {
            unit: EnergyUnit::KilowattHours,
            units_per_mwh: kwh_per_mwh,
            rows,
        }
    }

    pub fn unit(&self) -> EnergyUnit {
        self.unit
    }

    pub fn rows(&self) -> &[ConsumptionRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of `row` converted to MWh
    pub fn mwh(&self, row: &ConsumptionRow) -> f64 {
        row.consumption / self.units_per_mwh
    }

    pub fn years(&self) -> BTreeSet<i32> {
        self.rows.iter().map(|r| r.key.year()).collect()
    }

    /// Table in the same unit holding `rows`
    pub(crate) fn with_rows(&self, rows: Vec<ConsumptionRow>) -> ConsumptionTable {
        ConsumptionTable {
            unit: self.unit,
            units_per_mwh: self.units_per_mwh,
            rows,
        }
    }

    /// Copy of the rows dated in `year`, keeping the unit
    pub fn for_year(&self, year: i32) -> ConsumptionTable {
        self.with_rows(
            self.rows
                .iter()
                .filter(|r| r.key.year() == year)
                .cloned()
                .collect(),
        )
    }

    pub fn for_date(&self, date: NaiveDate) -> impl Iterator<Item = &ConsumptionRow> {
        self.rows.iter().filter(move |r| r.key.date == date)
    }

    /// Sum of all values in the table's own unit
    pub fn total(&self) -> f64 {
        self.rows.iter().map(|r| r.consumption).sum()
    }

    /// Sum of all values in MWh
    pub fn total_mwh(&self) -> f64 {
        self.total() / self.units_per_mwh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(y: i32, m: u32, d: u32, h: u32, min: u32) -> IntervalKey {
        IntervalKey::new(
            NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            NaiveTime::from_hms_opt(h, min, 0).unwrap(),
        )
    }

    #[test]
    fn test_production_total_sums_all_sources() {
        let row = ProductionRow {
            key: key(2022, 6, 15, 12, 0),
            biomass: 1.0,
            hydroelectric: 2.0,
            wind_offshore: 3.0,
            wind_onshore: 4.0,
            photovoltaic: 5.0,
            other_renewable: 6.0,
        };

        assert_eq!(row.total(), 21.0);
    }

    #[test]
    fn test_source_labels_are_distinct() {
        let labels: BTreeSet<_> = EnergySource::ALL.iter().map(|s| s.label()).collect();
        assert_eq!(labels.len(), 6);
        assert_eq!(EnergySource::WindOnshore.label(), "Wind Onshore");
    }

    #[test]
    fn test_get_mut_round_trip() {
        let mut row = ProductionRow::zeroed(key(2022, 1, 1, 0, 0));
        for (i, source) in EnergySource::ALL.iter().enumerate() {
            *row.get_mut(*source) = i as f64;
        }
        for (i, source) in EnergySource::ALL.iter().enumerate() {
            assert_eq!(row.get(*source), i as f64);
        }
    }

    #[test]
    fn test_interval_key_with_year() {
        let k = key(2022, 6, 15, 10, 30);
        let shifted = k.with_year(2030).unwrap();

        assert_eq!(shifted.date, NaiveDate::from_ymd_opt(2030, 6, 15).unwrap());
        assert_eq!(shifted.start, k.start);
        assert_eq!(shifted.fold, k.fold);
    }

    #[test]
    fn test_for_year_and_years() {
        let table = ProductionTable::new(vec![
            ProductionRow::zeroed(key(2021, 12, 31, 23, 45)),
            ProductionRow::zeroed(key(2022, 1, 1, 0, 0)),
            ProductionRow::zeroed(key(2022, 1, 1, 0, 15)),
        ]);

        assert_eq!(table.years().into_iter().collect::<Vec<_>>(), vec![2021, 2022]);
        assert_eq!(table.for_year(2022).len(), 2);
        assert!(table.for_year(2030).is_empty());
    }

    #[test]
    fn test_consumption_unit_conversion() {
        let rows = vec![ConsumptionRow {
            key: key(2030, 1, 1, 0, 0),
            consumption: 12_000.0,
        }];
        let table = ConsumptionTable::in_kwh(rows, 1000.0);

        assert_eq!(table.unit(), EnergyUnit::KilowattHours);
        assert_eq!(table.mwh(&table.rows()[0]), 12.0);
        assert_eq!(table.total_mwh(), 12.0);
        assert_eq!(table.for_year(2030).unit(), EnergyUnit::KilowattHours);
    }
}
