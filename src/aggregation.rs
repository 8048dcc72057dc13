//! Yearly totals of production (per source and overall) and consumption
//!
//! All values are MWh. Years present in only one of the two tables still get
//! an entry, with the other side left at zero.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::types::{ConsumptionTable, EnergySource, ProductionTable};

/// Totals of one calendar year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyAggregate {
    pub year: i32,
    /// Production intervals counted into this year
    pub intervals: usize,
    /// Sum of total renewable production, MWh
    pub production: f64,
    /// Sum of grid load, MWh
    pub consumption: f64,
    /// Production per source, MWh
    pub by_source: BTreeMap<EnergySource, f64>,
}

impl YearlyAggregate {
    fn empty(year: i32) -> Self {
        Self {
            year,
            intervals: 0,
            production: 0.0,
            consumption: 0.0,
            by_source: EnergySource::ALL.iter().map(|&s| (s, 0.0)).collect(),
        }
    }

    pub fn source(&self, source: EnergySource) -> f64 {
        self.by_source.get(&source).copied().unwrap_or(0.0)
    }

    /// Annual renewable production as a percentage of annual consumption
    ///
    /// `None` when the year has no consumption.
    pub fn renewable_share_percent(&self) -> Option<f64> {
        (self.consumption > 0.0).then(|| self.production / self.consumption * 100.0)
    }
}

/// Group both tables by calendar year and sum every column
///
/// # Examples
///
/// ```
/// # use chrono::{NaiveDate, NaiveTime};
/// # use energy_share_forecast::aggregation::aggregate_by_year;
/// # use energy_share_forecast::{ConsumptionRow, ConsumptionTable, IntervalKey, ProductionRow, ProductionTable};
/// let key = IntervalKey::new(
///     NaiveDate::from_ymd_opt(2022, 3, 1).unwrap(),
///     NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
/// );
/// let production = ProductionTable::new(vec![ProductionRow { photovoltaic: 40.0, ..ProductionRow::zeroed(key) }]);
/// let consumption = ConsumptionTable::in_mwh(vec![ConsumptionRow { key, consumption: 80.0 }]);
///
/// let years = aggregate_by_year(&production, &consumption);
/// assert_eq!(years[&2022].production, 40.0);
/// assert_eq!(years[&2022].renewable_share_percent(), Some(50.0));
/// ```
pub fn aggregate_by_year(
    production: &ProductionTable,
    consumption: &ConsumptionTable,
) -> BTreeMap<i32, YearlyAggregate> {
    let mut years: BTreeMap<i32, YearlyAggregate> = BTreeMap::new();

    for row in production.rows() {
        let year = row.key.year();
        let entry = years
            .entry(year)
            .or_insert_with(|| YearlyAggregate::empty(year));
        entry.intervals += 1;
        entry.production += row.total();
        for source in EnergySource::ALL {
            *entry.by_source.entry(source).or_insert(0.0) += row.get(source);
        }
    }

    for row in consumption.rows() {
        let year = row.key.year();
        years
            .entry(year)
            .or_insert_with(|| YearlyAggregate::empty(year))
            .consumption += consumption.mwh(row);
    }

    for aggregate in years.values() {
        debug!(
            year = aggregate.year,
            production_mwh = aggregate.production,
            consumption_mwh = aggregate.consumption,
            "yearly aggregate"
        );
    }

    years
}
