//! Renewable share analysis and 2030 projection for German electricity data
//!
//! Works on the quarter-hourly "realised generation" and "realised consumption"
//! exports published by SMARD (Bundesnetzagentur).
//!
//! # Features
//! - CSV loading with German locale support (dot thousands, comma decimals, DD.MM.YYYY dates)
//! - Yearly totals per renewable source and of grid load
//! - Per-interval renewable share, share histograms and "at least p %" counts
//! - Projection of a reference year into a target year from a configurable scenario
//!   (heat pumps, e-mobility, fixed adjustments, wind/PV growth)
//!
//! # Example
//!
//! ```no_run
//! use energy_share_forecast::{pipeline, ScenarioConfig};
//!
//! let scenario = ScenarioConfig::default();
//! let output = pipeline::run("production.csv", "consumption.csv", &scenario)?;
//! println!("consumption factor: {}", output.forecast.summary.consumption_factor);
//! # Ok::<(), energy_share_forecast::ForecastError>(())
//! ```

pub mod aggregation;
pub mod config;
pub mod csv_parser;
pub mod csv_utils;
mod error;
pub mod forecast;
pub mod pipeline;
pub mod renewable_share;
pub mod transformations;
mod types;

// Re-export public types for easier access
pub use aggregation::YearlyAggregate;
pub use config::{ForecastParameters, ScenarioConfig};
pub use error::{ForecastError, ParseError, Result};
pub use forecast::{Forecast, ForecastSummary};
pub use pipeline::{DayProfile, PipelineOutput};
pub use renewable_share::{IntervalShare, ShareHistogram, ThresholdCount};
pub use types::{
    ConsumptionRow, ConsumptionTable, EnergySource, EnergyUnit, IntervalKey, ProductionRow,
    ProductionTable,
};
