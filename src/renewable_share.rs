//! Per-interval renewable share of consumption and its distributions
//!
//! The share of an interval is total renewable production divided by grid load,
//! in percent. Both sides are compared in MWh regardless of the consumption
//! table's unit.
//!
//! An interval with zero consumption has no defined share. It is yielded with
//! `percent: None`, left out of histogram buckets and threshold counts, and
//! tallied in [`ShareHistogram::undefined`].

use serde::Serialize;

use crate::error::{ForecastError, Result};
use crate::types::{ConsumptionTable, IntervalKey, ProductionTable};

/// Renewable share of a single interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IntervalShare {
    pub key: IntervalKey,
    pub production_mwh: f64,
    pub consumption_mwh: f64,
    /// `None` when consumption is zero
    pub percent: Option<f64>,
}

/// Pair production and consumption interval by interval
///
/// Both tables must list the same intervals in the same order; this is checked
/// up front so that the returned iterator itself cannot fail.
///
/// # Returns
///
/// * `Ok(iterator)` - lazily computed shares, one per interval
/// * `Err(ForecastError::IntervalMismatch)` - lengths or keys differ
pub fn renewable_shares<'a>(
    production: &'a ProductionTable,
    consumption: &'a ConsumptionTable,
) -> Result<impl Iterator<Item = IntervalShare> + 'a> {
    if production.len() != consumption.len() {
        return Err(ForecastError::IntervalMismatch {
            position: production.len().min(consumption.len()),
            detail: format!(
                "{} production rows vs {} consumption rows",
                production.len(),
                consumption.len()
            ),
        });
    }

    if let Some((position, (p, c))) = production
        .rows()
        .iter()
        .zip(consumption.rows())
        .enumerate()
        .find(|(_, (p, c))| p.key != c.key)
    {
        return Err(ForecastError::IntervalMismatch {
            position,
            detail: format!("production {:?} vs consumption {:?}", p.key, c.key),
        });
    }

    Ok(production
        .rows()
        .iter()
        .zip(consumption.rows())
        .map(move |(p, c)| {
            let production_mwh = p.total();
            let consumption_mwh = consumption.mwh(c);
            IntervalShare {
                key: p.key,
                production_mwh,
                consumption_mwh,
                percent: share_percent(production_mwh, consumption_mwh),
            }
        }))
}

/// `production / consumption × 100`, `None` for zero consumption
pub fn share_percent(production: f64, consumption: f64) -> Option<f64> {
    (consumption > 0.0).then(|| production / consumption * 100.0)
}

// ============================================================================
// Histogram
// ============================================================================

/// Count of intervals per integer percentage bucket `[k, k + 1)` for `k` in `0..max_percent`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareHistogram {
    pub max_percent: u32,
    /// `counts[k]` = intervals with `k <= share < k + 1`
    pub counts: Vec<u64>,
    /// Intervals with share `>= max_percent`
    pub above_range: u64,
    /// Intervals without a defined share (zero consumption)
    pub undefined: u64,
}

impl ShareHistogram {
    /// Bucket `shares` into `[0, max_percent)`
    ///
    /// # Examples
    ///
    /// ```
    /// # use energy_share_forecast::renewable_share::ShareHistogram;
    /// let histogram = ShareHistogram::from_percentages([Some(0.5), Some(1.0), Some(1.9), None, Some(150.0)], 110);
    /// assert_eq!(histogram.counts[0], 1);
    /// assert_eq!(histogram.counts[1], 2);
    /// assert_eq!(histogram.above_range, 1);
    /// assert_eq!(histogram.undefined, 1);
    /// ```
    pub fn from_percentages(
        percentages: impl IntoIterator<Item = Option<f64>>,
        max_percent: u32,
    ) -> Self {
        let mut histogram = Self {
            max_percent,
            counts: vec![0; max_percent as usize],
            above_range: 0,
            undefined: 0,
        };

        for percent in percentages {
            match percent {
                None => histogram.undefined += 1,
                Some(p) if p >= f64::from(max_percent) => histogram.above_range += 1,
                Some(p) => histogram.counts[bucket(p)] += 1,
            }
        }

        histogram
    }

    pub fn from_shares(shares: impl IntoIterator<Item = IntervalShare>, max_percent: u32) -> Self {
        Self::from_percentages(shares.into_iter().map(|s| s.percent), max_percent)
    }

    /// Intervals that landed in a bucket
    pub fn in_range(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Every interval seen, including out-of-range and undefined ones
    pub fn total(&self) -> u64 {
        self.in_range() + self.above_range + self.undefined
    }

    /// `(lower bound in percent, count)` for each bucket
    pub fn buckets(&self) -> impl Iterator<Item = (u32, u64)> + '_ {
        (0..self.max_percent).zip(self.counts.iter().copied())
    }
}

/// Integer bucket of a non-negative percentage
fn bucket(percent: f64) -> usize {
    // Shares are non-negative; the cast saturates for anything huge
    percent.max(0.0).floor() as usize
}

// ============================================================================
// Threshold counts
// ============================================================================

/// Number of intervals whose share is at least `percent`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThresholdCount {
    pub percent: u32,
    pub intervals: u64,
}

/// For every `p` in `0..=max_threshold`, count intervals with share `>= p`
///
/// Non-increasing in `p` by construction. Undefined shares are not counted.
///
/// ```
/// # use energy_share_forecast::renewable_share::threshold_counts;
/// let counts = threshold_counts([Some(0.0), Some(50.5), Some(120.0), None], 300);
/// assert_eq!(counts[0].intervals, 3);
/// assert_eq!(counts[50].intervals, 2);
/// assert_eq!(counts[51].intervals, 1);
/// assert_eq!(counts[121].intervals, 0);
/// assert_eq!(counts.len(), 301);
/// ```
pub fn threshold_counts(
    percentages: impl IntoIterator<Item = Option<f64>>,
    max_threshold: u32,
) -> Vec<ThresholdCount> {
    let top = max_threshold as usize;
    // at_floor[k] = shares with floor == k, everything above top folded into top
    let mut at_floor = vec![0u64; top + 1];
    for percent in percentages.into_iter().flatten() {
        at_floor[bucket(percent).min(top)] += 1;
    }

    let mut running = 0;
    let mut counts: Vec<ThresholdCount> = (0..=max_threshold)
        .rev()
        .map(|p| {
            running += at_floor[p as usize];
            ThresholdCount {
                percent: p,
                intervals: running,
            }
        })
        .collect();
    counts.reverse();
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConsumptionRow, ProductionRow};
    use chrono::{Duration, NaiveDate, NaiveTime};
    use rstest::rstest;

    /// One day of 96 intervals with constant per-source production and consumption
    fn constant_day(per_source: f64, consumption: f64) -> (ProductionTable, ConsumptionTable) {
        let date = NaiveDate::from_ymd_opt(2022, 6, 15).unwrap();
        let keys: Vec<IntervalKey> = (0..96)
            .map(|i| {
                let start = NaiveTime::from_hms_opt(0, 0, 0).unwrap() + Duration::minutes(15 * i);
                IntervalKey::new(date, start)
            })
            .collect();

        let production = keys
            .iter()
            .map(|&key| ProductionRow {
                key,
                biomass: per_source,
                hydroelectric: per_source,
                wind_offshore: per_source,
                wind_onshore: per_source,
                photovoltaic: per_source,
                other_renewable: per_source,
            })
            .collect();
        let consumption = keys
            .iter()
            .map(|&key| ConsumptionRow { key, consumption })
            .collect();

        (
            ProductionTable::new(production),
            ConsumptionTable::in_mwh(consumption),
        )
    }

    #[test]
    fn test_half_consumption_gives_two_hundred_percent() {
        let (production, _) = constant_day(250.0, 0.0);
        let total = production.rows()[0].total();
        let (production, consumption) = constant_day(250.0, total / 2.0);

        let shares: Vec<_> = renewable_shares(&production, &consumption).unwrap().collect();

        assert_eq!(shares.len(), 96);
        for share in shares {
            assert_eq!(share.percent, Some(200.0));
        }
    }

    #[test]
    fn test_zero_consumption_is_undefined() {
        let (production, consumption) = constant_day(1.0, 0.0);

        let shares: Vec<_> = renewable_shares(&production, &consumption).unwrap().collect();
        assert!(shares.iter().all(|s| s.percent.is_none()));

        let histogram = ShareHistogram::from_shares(shares, 110);
        assert_eq!(histogram.undefined, 96);
        assert_eq!(histogram.in_range(), 0);
    }

    #[test]
    fn test_kwh_consumption_is_converted() {
        let (production, mwh) = constant_day(10.0, 120.0);
        let kwh = ConsumptionTable::in_kwh(
            mwh.rows()
                .iter()
                .map(|r| ConsumptionRow {
                    key: r.key,
                    consumption: r.consumption * 1000.0,
                })
                .collect(),
            1000.0,
        );

        let share = renewable_shares(&production, &kwh).unwrap().next().unwrap();
        assert_eq!(share.consumption_mwh, 120.0);
        assert_eq!(share.percent, Some(50.0));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let (production, consumption) = constant_day(1.0, 1.0);
        let shorter = ConsumptionTable::in_mwh(consumption.rows()[..95].to_vec());

        assert!(matches!(
            renewable_shares(&production, &shorter),
            Err(ForecastError::IntervalMismatch { position: 95, .. })
        ));
    }

    #[test]
    fn test_key_mismatch_rejected() {
        let (production, consumption) = constant_day(1.0, 1.0);
        let mut rows = consumption.rows().to_vec();
        rows[10].key.fold = 1;
        let shifted = ConsumptionTable::in_mwh(rows);

        assert!(matches!(
            renewable_shares(&production, &shifted),
            Err(ForecastError::IntervalMismatch { position: 10, .. })
        ));
    }

    #[rstest]
    #[case(110)]
    #[case(330)]
    fn test_histogram_sums_to_intervals(#[case] max_percent: u32) {
        let percentages: Vec<Option<f64>> =
            (0..1000).map(|i| Some(f64::from(i) * 0.37)).collect();
        let histogram = ShareHistogram::from_percentages(percentages.iter().copied(), max_percent);

        assert_eq!(histogram.counts.len(), max_percent as usize);
        assert!(histogram.in_range() <= 1000);
        assert_eq!(histogram.total(), 1000);

        let in_range = percentages
            .iter()
            .flatten()
            .filter(|&&p| p < f64::from(max_percent))
            .count() as u64;
        assert_eq!(histogram.in_range(), in_range);
    }

    #[test]
    fn test_histogram_bucket_edges() {
        let histogram = ShareHistogram::from_percentages(
            [Some(0.0), Some(0.999), Some(1.0), Some(109.99), Some(110.0)],
            110,
        );

        assert_eq!(histogram.counts[0], 2);
        assert_eq!(histogram.counts[1], 1);
        assert_eq!(histogram.counts[109], 1);
        assert_eq!(histogram.above_range, 1);

        let (lower, count) = histogram.buckets().nth(109).unwrap();
        assert_eq!((lower, count), (109, 1));
    }

    #[test]
    fn test_threshold_counts_monotone() {
        let percentages: Vec<Option<f64>> = (0..500)
            .map(|i| if i % 50 == 0 { None } else { Some(f64::from(i) * 0.9) })
            .collect();

        let counts = threshold_counts(percentages.iter().copied(), 300);

        assert_eq!(counts.len(), 301);
        for pair in counts.windows(2) {
            assert!(pair[0].intervals >= pair[1].intervals);
            assert_eq!(pair[0].percent + 1, pair[1].percent);
        }
        for c in &counts {
            let expected = percentages
                .iter()
                .flatten()
                .filter(|&&p| p >= f64::from(c.percent))
                .count() as u64;
            assert_eq!(c.intervals, expected, "threshold {}", c.percent);
        }
    }

    #[test]
    fn test_threshold_counts_beyond_max() {
        let counts = threshold_counts([Some(1000.0), Some(300.0), Some(299.5)], 300);

        assert_eq!(counts[300].intervals, 2);
        assert_eq!(counts[299].intervals, 3);
    }
}
