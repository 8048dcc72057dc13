//! Projection of one historical year into the target year
//!
//! # Model
//!
//! 1. **Heat pumps**: new units × technology share × (heating hours × rated power / SPF)
//! 2. **E-mobility**: (target fleet − current fleet) × (kWh per 100 km / 100 × km per year)
//! 3. **Other factors**: railway + battery/server rooms + grid loss − efficiency − other
//! 4. **Consumption factor**: (C + O + HP + EM) / (C + O), C = reference-year consumption in kWh
//! 5. **Consumption**: every interval × factor, converted MWh → kWh
//! 6. **Production**: wind onshore, wind offshore and PV × their growth factor; biomass,
//!    hydroelectric and other renewables unchanged
//!
//! All intervals are re-dated into the target year. 29 February is dropped when
//! the target year has none.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{EMobilityParameters, GrowthFactors, HeatPumpParameters, OtherFactors, ScenarioConfig};
use crate::error::{ForecastError, Result};
use crate::transformations::days_in_year;
use crate::types::{
    ConsumptionRow, ConsumptionTable, EnergySource, IntervalKey, ProductionRow, ProductionTable,
};

// ============================================================================
// Demand sub-calculations
// ============================================================================

/// Annual electricity draw of a single heat pump, kWh
pub fn heat_pump_unit_demand_kwh(heating_hours: f64, rated_power_kw: f64, spf: f64) -> f64 {
    heating_hours * rated_power_kw / spf
}

/// Additional annual heat-pump demand in `target_year`, kWh
///
/// ```
/// # use energy_share_forecast::config::HeatPumpParameters;
/// # use energy_share_forecast::forecast::heat_pump_demand_kwh;
/// let demand = heat_pump_demand_kwh(&HeatPumpParameters::default(), 2030);
/// assert!((demand - 3.282e10).abs() / 3.282e10 < 1e-3);
/// ```
///
/// No units are counted when installations start after `target_year`.
pub fn heat_pump_demand_kwh(params: &HeatPumpParameters, target_year: i32) -> f64 {
    // Widened first: the i32 difference of two arbitrary years can overflow
    let years = (f64::from(target_year) - f64::from(params.installations_since_year)).max(0.0);
    let units = params.annual_installations * years;

    let air_water = units
        * params.air_water_share
        * heat_pump_unit_demand_kwh(params.heating_hours, params.rated_power_kw, params.air_water_spf);
    let ground_source = units
        * params.ground_source_share
        * heat_pump_unit_demand_kwh(
            params.heating_hours,
            params.rated_power_kw,
            params.ground_source_spf,
        );

    air_water + ground_source
}

/// Annual draw of one electric vehicle, kWh
pub fn vehicle_demand_kwh(params: &EMobilityParameters) -> f64 {
    params.kwh_per_100_km / 100.0 * params.km_per_year
}

/// Additional annual e-mobility demand from fleet growth, kWh
pub fn e_mobility_demand_kwh(params: &EMobilityParameters) -> f64 {
    (params.target_fleet - params.current_fleet) * vehicle_demand_kwh(params)
}

impl OtherFactors {
    /// Signed sum of the fixed adjustments, kWh
    pub fn net_kwh(&self) -> f64 {
        self.railway_kwh + self.battery_production_and_server_rooms_kwh + self.grid_loss_kwh
            - self.efficiency_gain_kwh
            - self.other_reduction_kwh
    }
}

/// Multiplier from reference-year consumption to target-year consumption
///
/// # Returns
///
/// * `Ok(factor)` - `(C + O + HP + EM) / (C + O)`
/// * `Err(ForecastError::InvalidParameter)` - adjusted baseline `C + O` is not positive
pub fn consumption_factor(
    reference_consumption_kwh: f64,
    other_factors_kwh: f64,
    heat_pump_kwh: f64,
    e_mobility_kwh: f64,
) -> Result<f64> {
    let baseline = reference_consumption_kwh + other_factors_kwh;
    if !baseline.is_finite() || baseline <= 0.0 {
        return Err(ForecastError::InvalidParameter(format!(
            "adjusted baseline consumption must be positive, got {baseline} kWh"
        )));
    }
    Ok((baseline + heat_pump_kwh + e_mobility_kwh) / baseline)
}

// ============================================================================
// Table transformations
// ============================================================================

/// Multiply wind onshore, wind offshore and PV by their growth factors
///
/// The other three sources are copied unchanged; totals follow from the new values.
pub fn scale_production(table: &ProductionTable, growth: &GrowthFactors) -> ProductionTable {
    let factors = [
        (EnergySource::WindOnshore, growth.wind_onshore),
        (EnergySource::WindOffshore, growth.wind_offshore),
        (EnergySource::Photovoltaic, growth.photovoltaic),
    ];

    ProductionTable::new(
        table
            .rows()
            .iter()
            .map(|row| {
                let mut scaled = row.clone();
                for (source, factor) in factors {
                    *scaled.get_mut(source) *= factor;
                }
                scaled
            })
            .collect(),
    )
}

/// Multiply every interval by `factor` and convert MWh → kWh
pub fn scale_consumption(table: &ConsumptionTable, factor: f64, kwh_per_mwh: f64) -> ConsumptionTable {
    ConsumptionTable::in_kwh(
        table
            .rows()
            .iter()
            .map(|row| ConsumptionRow {
                key: row.key,
                consumption: table.mwh(row) * factor * kwh_per_mwh,
            })
            .collect(),
        kwh_per_mwh,
    )
}

/// Re-key rows into `year`, dropping intervals that do not exist there
fn shift_rows<R: Clone>(
    rows: &[R],
    year: i32,
    key_of: impl Fn(&R) -> IntervalKey,
    rekey: impl Fn(&R, IntervalKey) -> R,
) -> (Vec<R>, usize) {
    let mut dropped = 0;
    let shifted = rows
        .iter()
        .filter_map(|row| match key_of(row).with_year(year) {
            Some(key) => Some(rekey(row, key)),
            None => {
                dropped += 1;
                None
            }
        })
        .collect();
    (shifted, dropped)
}

/// Copy of `table` dated in `year`; also returns the number of dropped leap-day rows
pub fn shift_production(table: &ProductionTable, year: i32) -> (ProductionTable, usize) {
    let (rows, dropped) = shift_rows(
        table.rows(),
        year,
        |r: &ProductionRow| r.key,
        |r, key| ProductionRow { key, ..r.clone() },
    );
    (ProductionTable::new(rows), dropped)
}

/// Copy of `table` dated in `year`, values and unit untouched
pub fn shift_consumption(table: &ConsumptionTable, year: i32) -> (ConsumptionTable, usize) {
    let (rows, dropped) = shift_rows(
        table.rows(),
        year,
        |r: &ConsumptionRow| r.key,
        |r, key| ConsumptionRow {
            key,
            consumption: r.consumption,
        },
    );
    (table.with_rows(rows), dropped)
}

/// Fail unless `dates` covers every day of `year`
fn ensure_full_year(table: &str, dates: &BTreeSet<NaiveDate>, year: i32) -> Result<()> {
    let expected = days_in_year(year) as usize;
    if dates.is_empty() {
        return Err(ForecastError::year_mismatch(
            year,
            format!("{table} table has no rows in this year"),
        ));
    }
    if dates.len() != expected {
        return Err(ForecastError::year_mismatch(
            year,
            format!(
                "{table} table covers {} of {expected} days",
                dates.len()
            ),
        ));
    }
    Ok(())
}

// ============================================================================
// Projection
// ============================================================================

/// Scalar results of a projection run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSummary {
    pub reference_year: i32,
    pub target_year: i32,
    pub heat_pump_demand_kwh: f64,
    pub e_mobility_demand_kwh: f64,
    pub other_factors_kwh: f64,
    /// Reference-year consumption plus other factors, kWh
    pub baseline_consumption_kwh: f64,
    pub consumption_factor: f64,
    /// Leap-day intervals without a counterpart in the target year
    pub dropped_intervals: usize,
}

/// Projected tables and the figures that produced them
#[derive(Debug, Clone)]
pub struct Forecast {
    /// Scaled production, MWh, dated in the target year
    pub production: ProductionTable,
    /// Scaled consumption, kWh, dated in the target year
    pub consumption: ConsumptionTable,
    pub summary: ForecastSummary,
}

/// Project the reference year of `production`/`consumption` into the target year
///
/// The input tables may span several years; only the reference year is used and
/// it must be complete in both.
///
/// # Returns
///
/// * `Ok(Forecast)` - projected tables plus summary
/// * `Err(ForecastError::InvalidParameter)` - scenario fails validation
/// * `Err(ForecastError::YearMismatch)` - reference year missing or incomplete
pub fn project(
    production: &ProductionTable,
    consumption: &ConsumptionTable,
    scenario: &ScenarioConfig,
) -> Result<Forecast> {
    scenario.validate()?;

    let reference_year = scenario.reference_year;
    let target_year = scenario.target_year;
    let params = &scenario.forecast;

    let reference_production = production.for_year(reference_year);
    let reference_consumption = consumption.for_year(reference_year);
    ensure_full_year(
        "production",
        &reference_production.rows().iter().map(|r| r.key.date).collect(),
        reference_year,
    )?;
    ensure_full_year(
        "consumption",
        &reference_consumption.rows().iter().map(|r| r.key.date).collect(),
        reference_year,
    )?;
    if reference_production.len() != reference_consumption.len() {
        return Err(ForecastError::year_mismatch(
            reference_year,
            format!(
                "production has {} intervals, consumption has {}",
                reference_production.len(),
                reference_consumption.len()
            ),
        ));
    }

    let heat_pump_kwh = heat_pump_demand_kwh(&params.heat_pumps, target_year);
    let e_mobility_kwh = e_mobility_demand_kwh(&params.e_mobility);
    let other_kwh = params.other_factors.net_kwh();
    let reference_kwh = reference_consumption.total_mwh() * scenario.kwh_per_mwh;
    let factor = consumption_factor(reference_kwh, other_kwh, heat_pump_kwh, e_mobility_kwh)?;

    info!(
        reference_year,
        target_year,
        heat_pump_kwh,
        e_mobility_kwh,
        other_kwh,
        consumption_factor = factor,
        "computed consumption projection"
    );

    let (shifted_consumption, dropped_consumption) =
        shift_consumption(&reference_consumption, target_year);
    let (shifted_production, dropped_production) =
        shift_production(&reference_production, target_year);

    let dropped_intervals = dropped_production.max(dropped_consumption);
    if dropped_intervals > 0 {
        warn!(
            dropped_intervals,
            target_year, "29 February has no counterpart in the target year, intervals dropped"
        );
    }

    let projected_consumption =
        scale_consumption(&shifted_consumption, factor, scenario.kwh_per_mwh);
    let projected_production = scale_production(&shifted_production, &params.growth);

    Ok(Forecast {
        production: projected_production,
        consumption: projected_consumption,
        summary: ForecastSummary {
            reference_year,
            target_year,
            heat_pump_demand_kwh: heat_pump_kwh,
            e_mobility_demand_kwh: e_mobility_kwh,
            other_factors_kwh: other_kwh,
            baseline_consumption_kwh: reference_kwh + other_kwh,
            consumption_factor: factor,
            dropped_intervals,
        },
    })
}
