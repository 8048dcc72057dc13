//! End-to-end run: load → aggregate → shares → project
//!
//! [`PipelineOutput`] is everything a reporting front end needs: the four
//! tables, yearly aggregates, share histograms and threshold counts. Nothing
//! here renders or prompts.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::Serialize;
use tracing::info;

use crate::aggregation::{aggregate_by_year, YearlyAggregate};
use crate::config::ScenarioConfig;
use crate::csv_parser::{load_consumption, load_production};
use crate::error::Result;
use crate::forecast::{project, Forecast, ForecastSummary};
use crate::renewable_share::{
    renewable_shares, share_percent, threshold_counts, ShareHistogram, ThresholdCount,
};
use crate::types::{ConsumptionTable, IntervalKey, ProductionTable};

/// Load both input files concurrently
pub fn load_tables(
    production_path: &Path,
    consumption_path: &Path,
    delimiter: u8,
) -> Result<(ProductionTable, ConsumptionTable)> {
    let (production, consumption) = rayon::join(
        || load_production(production_path, delimiter),
        || load_consumption(consumption_path, delimiter),
    );
    Ok((production?, consumption?))
}

/// Historical share distribution of one pair of tables
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareDistribution {
    pub histogram: ShareHistogram,
    pub thresholds: Vec<ThresholdCount>,
}

impl ShareDistribution {
    fn compute(
        production: &ProductionTable,
        consumption: &ConsumptionTable,
        histogram_max: u32,
        threshold_max: u32,
    ) -> Result<Self> {
        let percentages: Vec<Option<f64>> = renewable_shares(production, consumption)?
            .map(|s| s.percent)
            .collect();

        Ok(Self {
            histogram: ShareHistogram::from_percentages(percentages.iter().copied(), histogram_max),
            thresholds: threshold_counts(percentages, threshold_max),
        })
    }
}

/// Everything produced by one run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub historical_production: ProductionTable,
    pub historical_consumption: ConsumptionTable,
    pub yearly: BTreeMap<i32, YearlyAggregate>,
    pub historical_shares: ShareDistribution,
    pub forecast: Forecast,
    pub forecast_yearly: BTreeMap<i32, YearlyAggregate>,
    pub forecast_shares: ShareDistribution,
}

/// Run every stage on already loaded tables
pub fn analyze(
    production: ProductionTable,
    consumption: ConsumptionTable,
    scenario: &ScenarioConfig,
) -> Result<PipelineOutput> {
    scenario.validate()?;

    let yearly = aggregate_by_year(&production, &consumption);
    let historical_shares = ShareDistribution::compute(
        &production,
        &consumption,
        scenario.historical_histogram_max,
        scenario.threshold_max,
    )?;

    let forecast = project(&production, &consumption, scenario)?;
    let forecast_yearly = aggregate_by_year(&forecast.production, &forecast.consumption);
    let forecast_shares = ShareDistribution::compute(
        &forecast.production,
        &forecast.consumption,
        scenario.forecast_histogram_max,
        scenario.threshold_max,
    )?;

    info!(
        years = yearly.len(),
        forecast_intervals = forecast.production.len(),
        "analysis complete"
    );

    Ok(PipelineOutput {
        historical_production: production,
        historical_consumption: consumption,
        yearly,
        historical_shares,
        forecast,
        forecast_yearly,
        forecast_shares,
    })
}

/// Load both files and run every stage
pub fn run(
    production_path: impl AsRef<Path>,
    consumption_path: impl AsRef<Path>,
    scenario: &ScenarioConfig,
) -> Result<PipelineOutput> {
    scenario.validate()?;
    let (production, consumption) = load_tables(
        production_path.as_ref(),
        consumption_path.as_ref(),
        scenario.delimiter_byte()?,
    )?;
    analyze(production, consumption, scenario)
}

// ============================================================================
// Day profile
// ============================================================================

/// Which tables a day profile was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileSource {
    Historical,
    Forecast,
}

/// Production and consumption of one interval, both in MWh
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileInterval {
    pub start: NaiveTime,
    pub fold: u8,
    pub production_mwh: f64,
    pub consumption_mwh: f64,
    pub share_percent: Option<f64>,
}

/// All intervals of one date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayProfile {
    pub date: NaiveDate,
    pub source: ProfileSource,
    pub intervals: Vec<ProfileInterval>,
}

fn day_profile_from(
    date: NaiveDate,
    source: ProfileSource,
    production: &ProductionTable,
    consumption: &ConsumptionTable,
) -> Option<DayProfile> {
    let load: HashMap<IntervalKey, f64> = consumption
        .for_date(date)
        .map(|row| (row.key, consumption.mwh(row)))
        .collect();

    let intervals: Vec<ProfileInterval> = production
        .for_date(date)
        .filter_map(|row| {
            let consumption_mwh = *load.get(&row.key)?;
            let production_mwh = row.total();
            Some(ProfileInterval {
                start: row.key.start,
                fold: row.key.fold,
                production_mwh,
                consumption_mwh,
                share_percent: share_percent(production_mwh, consumption_mwh),
            })
        })
        .collect();

    (!intervals.is_empty()).then_some(DayProfile {
        date,
        source,
        intervals,
    })
}

impl PipelineOutput {
    /// Intervals of `date`, from the projection when `date` lies in the target year
    ///
    /// `None` when the date is not covered by the corresponding tables.
    pub fn day_profile(&self, date: NaiveDate) -> Option<DayProfile> {
        if date.year() == self.forecast.summary.target_year {
            day_profile_from(
                date,
                ProfileSource::Forecast,
                &self.forecast.production,
                &self.forecast.consumption,
            )
        } else {
            day_profile_from(
                date,
                ProfileSource::Historical,
                &self.historical_production,
                &self.historical_consumption,
            )
        }
    }

    /// Serializable summary without the interval tables
    pub fn report(&self) -> Report<'_> {
        Report {
            yearly: self.yearly.values().collect(),
            historical_shares: &self.historical_shares,
            forecast: &self.forecast.summary,
            forecast_yearly: self.forecast_yearly.values().collect(),
            forecast_shares: &self.forecast_shares,
        }
    }
}

/// JSON-ready view of a [`PipelineOutput`]
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub yearly: Vec<&'a YearlyAggregate>,
    pub historical_shares: &'a ShareDistribution,
    pub forecast: &'a ForecastSummary,
    pub forecast_yearly: Vec<&'a YearlyAggregate>,
    pub forecast_shares: &'a ShareDistribution,
}
