//! Scenario configuration
//!
//! Every constant of the projection lives here rather than in the model code so
//! that alternative scenarios can be run from a JSON file. `Default` reproduces
//! the reference scenario (2022 → 2030).
//!
//! # Example
//!
//! ```rust
//! use energy_share_forecast::config::ScenarioConfig;
//!
//! let config = ScenarioConfig::from_json(r#"{ "target_year": 2035, "growth": { "photovoltaic": 4.2 } }"#).unwrap();
//! assert_eq!(config.target_year, 2035);
//! assert_eq!(config.reference_year, 2022);
//! assert_eq!(config.forecast.growth.photovoltaic, 4.2);
//! assert_eq!(config.forecast.growth.wind_onshore, 2.03563);
//! ```

use std::ops::RangeInclusive;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::csv_parser::DEFAULT_DELIMITER;
use crate::error::{ForecastError, Result};

/// Years the source date format (DD.MM.YYYY) can express
pub const SUPPORTED_YEARS: RangeInclusive<i32> = 1000..=9999;

/// Upper bound for histogram maxima and the threshold maximum, percent
pub const MAX_PERCENT_RANGE: u32 = 10_000;

/// Whole run configuration: years, units, histogram ranges and forecast parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Historical year the projection is scaled from
    pub reference_year: i32,
    /// Year the projection is dated in
    pub target_year: i32,
    /// Field delimiter of both input files
    pub delimiter: char,
    /// kWh per MWh, applied when the projected consumption is converted to kWh
    pub kwh_per_mwh: f64,
    /// Histogram upper bound (exclusive) for historical shares, percent
    pub historical_histogram_max: u32,
    /// Histogram upper bound (exclusive) for projected shares, percent
    pub forecast_histogram_max: u32,
    /// Highest threshold of the "share at least p" counts, percent
    pub threshold_max: u32,
    #[serde(flatten)]
    pub forecast: ForecastParameters,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            reference_year: 2022,
            target_year: 2030,
            delimiter: char::from(DEFAULT_DELIMITER),
            kwh_per_mwh: 1000.0,
            historical_histogram_max: 110,
            forecast_histogram_max: 330,
            threshold_max: 300,
            forecast: ForecastParameters::default(),
        }
    }
}

/// Inputs of the projection model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastParameters {
    pub growth: GrowthFactors,
    pub heat_pumps: HeatPumpParameters,
    pub e_mobility: EMobilityParameters,
    pub other_factors: OtherFactors,
}

/// Multipliers applied to the reference year's production
///
/// Biomass, hydroelectric and other renewables are deliberately not listed:
/// they stay at reference-year level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthFactors {
    pub wind_onshore: f64,
    pub wind_offshore: f64,
    pub photovoltaic: f64,
}

impl Default for GrowthFactors {
    fn default() -> Self {
        Self {
            wind_onshore: 2.03563,
            wind_offshore: 3.76979,
            photovoltaic: 3.5593,
        }
    }
}

/// Heat-pump fleet growth and per-unit draw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatPumpParameters {
    /// New units installed per year
    pub annual_installations: f64,
    /// First year counted; units = annual_installations × (target_year − this)
    pub installations_since_year: i32,
    /// Full-load heating hours per year
    pub heating_hours: f64,
    /// Rated thermal power per unit, kW
    pub rated_power_kw: f64,
    /// Fraction of new units that are air-to-water
    pub air_water_share: f64,
    /// Fraction of new units that are ground-source
    pub ground_source_share: f64,
    /// Seasonal performance factor of air-to-water units
    pub air_water_spf: f64,
    /// Seasonal performance factor of ground-source units
    pub ground_source_spf: f64,
}

impl Default for HeatPumpParameters {
    fn default() -> Self {
        Self {
            annual_installations: 500_000.0,
            installations_since_year: 2023,
            heating_hours: 2000.0,
            rated_power_kw: 15.0,
            air_water_share: 206.0 / 236.0,
            ground_source_share: 30.0 / 236.0,
            air_water_spf: 3.1,
            ground_source_spf: 4.1,
        }
    }
}

/// Battery-electric vehicle fleet growth and per-vehicle draw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EMobilityParameters {
    pub target_fleet: f64,
    pub current_fleet: f64,
    pub kwh_per_100_km: f64,
    pub km_per_year: f64,
}

impl Default for EMobilityParameters {
    fn default() -> Self {
        Self {
            target_fleet: 15_000_000.0,
            current_fleet: 1_307_901.0,
            kwh_per_100_km: 21.0,
            km_per_year: 15_000.0,
        }
    }
}

/// Fixed consumption adjustments, kWh
///
/// The first three add load, the last two remove it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OtherFactors {
    pub railway_kwh: f64,
    pub battery_production_and_server_rooms_kwh: f64,
    pub grid_loss_kwh: f64,
    pub efficiency_gain_kwh: f64,
    pub other_reduction_kwh: f64,
}

impl Default for OtherFactors {
    fn default() -> Self {
        Self {
            railway_kwh: 5000.0,
            battery_production_and_server_rooms_kwh: 13000.0,
            grid_loss_kwh: 1000.0,
            efficiency_gain_kwh: 51000.0,
            other_reduction_kwh: 6000.0,
        }
    }
}

impl ScenarioConfig {
    /// Parse a JSON document; omitted fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load and validate a JSON scenario file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|e| ForecastError::from_io(path, e))?;
        let config = Self::from_json(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Delimiter as the byte the CSV reader expects
    pub fn delimiter_byte(&self) -> Result<u8> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                ForecastError::InvalidParameter(format!(
                    "delimiter must be a single ASCII character, got {:?}",
                    self.delimiter
                ))
            })
    }

    /// Check every range and sign invariant before any computation starts
    pub fn validate(&self) -> Result<()> {
        supported_year("reference_year", self.reference_year)?;
        supported_year("target_year", self.target_year)?;
        if self.target_year <= self.reference_year {
            return Err(invalid(format!(
                "target_year ({}) must be after reference_year ({})",
                self.target_year, self.reference_year
            )));
        }
        positive("kwh_per_mwh", self.kwh_per_mwh)?;
        if self.historical_histogram_max == 0 || self.forecast_histogram_max == 0 {
            return Err(invalid("histogram maxima must be at least 1".to_string()));
        }
        for (name, value) in [
            ("historical_histogram_max", self.historical_histogram_max),
            ("forecast_histogram_max", self.forecast_histogram_max),
            ("threshold_max", self.threshold_max),
        ] {
            if value > MAX_PERCENT_RANGE {
                return Err(invalid(format!(
                    "{name} ({value}) exceeds {MAX_PERCENT_RANGE} %"
                )));
            }
        }
        self.delimiter_byte()?;
        self.forecast.validate(self.target_year)
    }
}

impl ForecastParameters {
    /// Validate against the year the projection targets
    pub fn validate(&self, target_year: i32) -> Result<()> {
        let g = &self.growth;
        non_negative("growth.wind_onshore", g.wind_onshore)?;
        non_negative("growth.wind_offshore", g.wind_offshore)?;
        non_negative("growth.photovoltaic", g.photovoltaic)?;

        let hp = &self.heat_pumps;
        non_negative("heat_pumps.annual_installations", hp.annual_installations)?;
        supported_year("heat_pumps.installations_since_year", hp.installations_since_year)?;
        if hp.installations_since_year > target_year {
            return Err(invalid(format!(
                "heat_pumps.installations_since_year ({}) is after target year {}",
                hp.installations_since_year, target_year
            )));
        }
        non_negative("heat_pumps.heating_hours", hp.heating_hours)?;
        if hp.heating_hours > 8784.0 {
            return Err(invalid(format!(
                "heat_pumps.heating_hours ({}) exceeds the hours of a year",
                hp.heating_hours
            )));
        }
        non_negative("heat_pumps.rated_power_kw", hp.rated_power_kw)?;
        fraction("heat_pumps.air_water_share", hp.air_water_share)?;
        fraction("heat_pumps.ground_source_share", hp.ground_source_share)?;
        if hp.air_water_share + hp.ground_source_share > 1.0 + 1e-9 {
            return Err(invalid(
                "heat pump technology shares add up to more than 1".to_string(),
            ));
        }
        positive("heat_pumps.air_water_spf", hp.air_water_spf)?;
        positive("heat_pumps.ground_source_spf", hp.ground_source_spf)?;

        let em = &self.e_mobility;
        non_negative("e_mobility.target_fleet", em.target_fleet)?;
        non_negative("e_mobility.current_fleet", em.current_fleet)?;
        non_negative("e_mobility.kwh_per_100_km", em.kwh_per_100_km)?;
        non_negative("e_mobility.km_per_year", em.km_per_year)?;
        if em.target_fleet < em.current_fleet {
            return Err(invalid(format!(
                "e_mobility.target_fleet ({}) is below current_fleet ({})",
                em.target_fleet, em.current_fleet
            )));
        }

        let of = &self.other_factors;
        for (name, value) in [
            ("other_factors.railway_kwh", of.railway_kwh),
            (
                "other_factors.battery_production_and_server_rooms_kwh",
                of.battery_production_and_server_rooms_kwh,
            ),
            ("other_factors.grid_loss_kwh", of.grid_loss_kwh),
            ("other_factors.efficiency_gain_kwh", of.efficiency_gain_kwh),
            ("other_factors.other_reduction_kwh", of.other_reduction_kwh),
        ] {
            non_negative(name, value)?;
        }

        Ok(())
    }
}

fn invalid(message: String) -> ForecastError {
    ForecastError::InvalidParameter(message)
}

fn supported_year(name: &str, year: i32) -> Result<()> {
    if !SUPPORTED_YEARS.contains(&year) {
        return Err(invalid(format!(
            "{name} ({year}) must be within {}..={}",
            SUPPORTED_YEARS.start(),
            SUPPORTED_YEARS.end()
        )));
    }
    Ok(())
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(format!("{name} must be a non-negative number, got {value}")));
    }
    Ok(())
}

fn positive(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(format!("{name} must be positive, got {value}")));
    }
    Ok(())
}

fn fraction(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid(format!("{name} must be within [0, 1], got {value}")));
    }
    Ok(())
}
