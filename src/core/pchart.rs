//! P-chart engine - proportion-defective control chart
//!
//! Every day in the window shares one center line, the pooled proportion
//! p̄ = Σdefects / Σsamples. Each day gets its own 3-sigma limits from the
//! normal approximation to the binomial, so days with small samples get
//! wider intervals:
//!
//! ```text
//! se  = sqrt(p̄(1 - p̄) / n)
//! UCL = min(1, p̄ + 3·se)
//! LCL = max(0, p̄ - 3·se)
//! ```
//!
//! Limits are kept as proportions at full precision. Percentages are rounded
//! to 2 decimals only when the output structs are built, after the
//! out-of-control decision has been made.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::stats::{percent, ratio};
use crate::entities::bucket::DailyBucket;

/// Width of the control band in standard errors
pub const SIGMA_MULTIPLIER: f64 = 3.0;

/// One day of p-chart input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySample {
    pub date: NaiveDate,
    /// Units inspected; negative values are treated as zero
    pub sample_size: i64,
    /// Defective units; negative values are treated as zero
    pub defect_count: i64,
}

impl DailySample {
    pub fn new(date: NaiveDate, sample_size: i64, defect_count: i64) -> Self {
        Self {
            date,
            sample_size,
            defect_count,
        }
    }

    /// Sample size clamped to zero
    fn n(&self) -> u64 {
        self.sample_size.max(0) as u64
    }

    /// Defect count clamped to zero; a day with no sample contributes nothing
    fn defects(&self) -> u64 {
        if self.n() == 0 {
            0
        } else {
            self.defect_count.max(0) as u64
        }
    }
}

/// Control limits for one sample size against a center line (proportions)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlLimits {
    /// Pooled defect proportion p̄
    pub center_line: f64,
    /// Upper control limit, in [0, 1]
    pub ucl: f64,
    /// Lower control limit, in [0, 1]
    pub lcl: f64,
    /// No interval exists for this sample; nothing is flagged against it
    #[serde(default)]
    pub degenerate: bool,
}

impl ControlLimits {
    /// Limits that cannot flag anything (UCL = 1, LCL = 0)
    pub fn degenerate(center_line: f64) -> Self {
        Self {
            center_line,
            ucl: 1.0,
            lcl: 0.0,
            degenerate: true,
        }
    }

    /// Whether `p_bar` and `n` admit no meaningful interval
    pub fn is_degenerate_sample(p_bar: f64, n: i64) -> bool {
        n <= 0 || !p_bar.is_finite() || p_bar <= 0.0 || p_bar >= 1.0
    }

    /// Limits for a sample of size `n` around `p_bar`
    ///
    /// Degenerates when `n <= 0`, `p_bar <= 0` or `p_bar >= 1`, where no
    /// meaningful interval exists.
    pub fn for_sample(p_bar: f64, n: i64) -> Self {
        if Self::is_degenerate_sample(p_bar, n) {
            return Self::degenerate(p_bar);
        }

        let standard_error = (p_bar * (1.0 - p_bar) / n as f64).sqrt();
        Self {
            center_line: p_bar,
            ucl: (p_bar + SIGMA_MULTIPLIER * standard_error).min(1.0),
            lcl: (p_bar - SIGMA_MULTIPLIER * standard_error).max(0.0),
            degenerate: false,
        }
    }

    /// Whether an observed proportion falls outside the limits
    ///
    /// Degenerate limits never flag a point. A real interval that clamps to
    /// [0, 1] still flags rates above 1.
    pub fn is_out_of_control(&self, proportion: f64) -> bool {
        if self.degenerate {
            return false;
        }
        proportion > self.ucl || proportion < self.lcl
    }
}

/// One plotted day (percentages rounded to 2 decimals)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PChartPoint {
    pub date: NaiveDate,
    pub sample_size: u64,
    pub defects: u64,
    pub defect_rate: f64,
    pub upper_control_limit: f64,
    pub lower_control_limit: f64,
    pub out_of_control: bool,
}

/// Totals over the whole window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PChartTotals {
    pub total_parts: u64,
    pub total_defects: u64,
    /// Pooled defect rate, percent
    pub defect_rate: f64,
}

/// A computed p-chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PChart {
    /// Pooled defect rate p̄, percent
    pub center_line: f64,
    pub weekly_totals: PChartTotals,
    pub daily_points: Vec<PChartPoint>,
}

impl PChart {
    /// Dates flagged out of control
    pub fn out_of_control_points(&self) -> Vec<NaiveDate> {
        self.daily_points
            .iter()
            .filter(|p| p.out_of_control)
            .map(|p| p.date)
            .collect()
    }

    /// True when no day is flagged
    pub fn in_control(&self) -> bool {
        self.daily_points.iter().all(|p| !p.out_of_control)
    }
}

/// Pooled proportion Σdefects / Σsamples (0 for an empty window)
pub fn pooled_proportion(samples: &[DailySample]) -> f64 {
    let parts: u64 = samples.iter().map(DailySample::n).sum();
    let defects: u64 = samples.iter().map(DailySample::defects).sum();
    ratio(defects, parts)
}

/// Compute a p-chart over a window of daily samples
///
/// Points are emitted in input order. Selecting which days form the window
/// is up to the caller.
pub fn compute_p_chart(samples: &[DailySample]) -> PChart {
    let total_parts: u64 = samples.iter().map(DailySample::n).sum();
    let total_defects: u64 = samples.iter().map(DailySample::defects).sum();
    let p_bar = ratio(total_defects, total_parts);

    let daily_points = samples
        .iter()
        .map(|sample| {
            let n = sample.n();
            let defects = sample.defects();
            let proportion = ratio(defects, n);
            let limits = ControlLimits::for_sample(p_bar, n as i64);

            PChartPoint {
                date: sample.date,
                sample_size: n,
                defects,
                defect_rate: percent(proportion),
                upper_control_limit: percent(limits.ucl),
                lower_control_limit: percent(limits.lcl),
                out_of_control: limits.is_out_of_control(proportion),
            }
        })
        .collect();

    PChart {
        center_line: percent(p_bar),
        weekly_totals: PChartTotals {
            total_parts,
            total_defects,
            defect_rate: percent(p_bar),
        },
        daily_points,
    }
}

/// Collapse daily buckets into one sample per date, in date order
///
/// Buckets sharing a date (different keys) are summed.
pub fn daily_samples(buckets: &[DailyBucket]) -> Vec<DailySample> {
    let mut by_date: BTreeMap<NaiveDate, (u64, u64)> = BTreeMap::new();
    for bucket in buckets {
        let entry = by_date.entry(bucket.date).or_default();
        entry.0 += bucket.sample_size;
        entry.1 += bucket.defects;
    }

    by_date
        .into_iter()
        .map(|(date, (n, defects))| DailySample::new(date, n as i64, defects as i64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_limits_ordering_and_range() {
        for &p_bar in &[0.001, 0.01, 0.1, 0.25, 0.5, 0.75, 0.9, 0.999] {
            for &n in &[1_i64, 2, 5, 10, 50, 100, 1000, 100_000] {
                let limits = ControlLimits::for_sample(p_bar, n);
                assert!(limits.lcl <= limits.center_line, "p={} n={}", p_bar, n);
                assert!(limits.center_line <= limits.ucl, "p={} n={}", p_bar, n);
                assert!((0.0..=1.0).contains(&limits.ucl));
                assert!((0.0..=1.0).contains(&limits.lcl));
            }
        }
    }

    #[test]
    fn test_degenerate_limits() {
        for limits in [
            ControlLimits::for_sample(0.3, 0),
            ControlLimits::for_sample(0.3, -4),
            ControlLimits::for_sample(0.0, 100),
            ControlLimits::for_sample(1.0, 100),
            ControlLimits::for_sample(1.2, 100),
        ] {
            assert_eq!(limits.ucl, 1.0);
            assert_eq!(limits.lcl, 0.0);
            assert!(!limits.is_out_of_control(0.99));
        }
    }

    #[test]
    fn test_known_example_p10_n50() {
        let limits = ControlLimits::for_sample(0.10, 50);
        let se = (0.1_f64 * 0.9 / 50.0).sqrt();
        assert!((se - 0.0424).abs() < 1e-4);
        assert!((limits.ucl - 0.2273).abs() < 1e-3);
        assert_eq!(limits.lcl, 0.0);

        assert!(limits.is_out_of_control(0.25));
        assert!(!limits.is_out_of_control(0.15));
    }

    #[test]
    fn test_pooled_center_line_not_mean_of_rates() {
        let samples = vec![
            DailySample::new(day(4), 100, 10),
            DailySample::new(day(5), 10, 5),
        ];
        assert_eq!(pooled_proportion(&samples), 15.0 / 110.0);

        let chart = compute_p_chart(&samples);
        assert_eq!(chart.center_line, 13.64);
        assert_eq!(chart.weekly_totals.total_parts, 110);
        assert_eq!(chart.weekly_totals.total_defects, 15);
        assert_eq!(chart.weekly_totals.defect_rate, 13.64);
    }

    #[test]
    fn test_variable_sample_size_widens_small_days() {
        let samples = vec![
            DailySample::new(day(4), 400, 40),
            DailySample::new(day(5), 20, 2),
        ];
        let chart = compute_p_chart(&samples);
        let big = &chart.daily_points[0];
        let small = &chart.daily_points[1];
        assert!(small.upper_control_limit > big.upper_control_limit);
        assert_eq!(chart.center_line, 10.0);
    }

    #[test]
    fn test_out_of_control_day_flagged() {
        // p̄ = 60 / 500 = 12%; day 3 at 40% on n=50 is far above its UCL
        let samples = vec![
            DailySample::new(day(4), 150, 10),
            DailySample::new(day(5), 150, 15),
            DailySample::new(day(6), 50, 20),
            DailySample::new(day(7), 150, 15),
        ];
        let chart = compute_p_chart(&samples);
        assert_eq!(chart.out_of_control_points(), vec![day(6)]);
        assert!(!chart.in_control());
        assert_eq!(chart.daily_points[2].defect_rate, 40.0);
    }

    #[test]
    fn test_clamped_interval_still_flags() {
        // p̄ = 5/11 on n=1 clamps to [0, 1] without being degenerate
        let samples = vec![
            DailySample::new(day(4), 10, 0),
            DailySample::new(day(5), 1, 5),
        ];
        let chart = compute_p_chart(&samples);
        let small = &chart.daily_points[1];
        assert_eq!(small.upper_control_limit, 100.0);
        assert_eq!(small.lower_control_limit, 0.0);
        assert_eq!(small.defect_rate, 500.0);
        assert!(small.out_of_control);
        assert!(!chart.daily_points[0].out_of_control);

        let limits = ControlLimits::for_sample(5.0 / 11.0, 1);
        assert!(!limits.degenerate);
        assert!(ControlLimits::for_sample(0.3, 0).degenerate);
    }

    #[test]
    fn test_below_lower_limit_flagged() {
        // p̄ = 0.5 on n=100 gives LCL = 35%
        let samples = vec![
            DailySample::new(day(4), 100, 90),
            DailySample::new(day(5), 100, 10),
        ];
        let chart = compute_p_chart(&samples);
        let low = &chart.daily_points[1];
        assert_eq!(chart.center_line, 50.0);
        assert_eq!(low.lower_control_limit, 35.0);
        assert_eq!(low.defect_rate, 10.0);
        assert!(low.out_of_control);
        assert!(chart.daily_points[0].out_of_control);
    }

    #[test]
    fn test_zero_sample_day_is_degenerate() {
        let samples = vec![
            DailySample::new(day(4), 100, 10),
            DailySample::new(day(5), 0, 0),
        ];
        let chart = compute_p_chart(&samples);
        let empty = &chart.daily_points[1];
        assert_eq!(empty.upper_control_limit, 100.0);
        assert_eq!(empty.lower_control_limit, 0.0);
        assert_eq!(empty.defect_rate, 0.0);
        assert!(!empty.out_of_control);
    }

    #[test]
    fn test_negative_counts_contribute_nothing() {
        let samples = vec![
            DailySample::new(day(4), 100, 10),
            DailySample::new(day(5), -20, 5),
            DailySample::new(day(6), 50, -3),
        ];
        let chart = compute_p_chart(&samples);
        assert_eq!(chart.weekly_totals.total_parts, 150);
        assert_eq!(chart.weekly_totals.total_defects, 10);
        assert_eq!(chart.daily_points[1].sample_size, 0);
        assert_eq!(chart.daily_points[1].defects, 0);
    }

    #[test]
    fn test_empty_window() {
        let chart = compute_p_chart(&[]);
        assert_eq!(chart.center_line, 0.0);
        assert_eq!(chart.weekly_totals.total_parts, 0);
        assert!(chart.daily_points.is_empty());
        assert!(chart.in_control());
    }

    #[test]
    fn test_all_defective_window_never_flags() {
        let samples = vec![DailySample::new(day(4), 10, 10), DailySample::new(day(5), 5, 5)];
        let chart = compute_p_chart(&samples);
        assert_eq!(chart.center_line, 100.0);
        assert!(chart.in_control());
    }

    #[test]
    fn test_boundary_uses_unrounded_values() {
        // Pick a day whose rate sits between the unrounded UCL and its
        // 2-decimal rounding; it must be judged on the unrounded UCL.
        let p_bar = 0.1;
        let n = 50;
        let limits = ControlLimits::for_sample(p_bar, n);
        let just_above = limits.ucl + 1e-9;
        assert!(limits.is_out_of_control(just_above));
        assert!(!limits.is_out_of_control(limits.ucl));
    }

    #[test]
    fn test_daily_samples_merges_keys_by_date() {
        let mut a = DailyBucket::new(day(4), "FI");
        a.sample_size = 10;
        a.defects = 1;
        let mut b = DailyBucket::new(day(4), "VI1");
        b.sample_size = 5;
        b.defects = 2;
        let mut c = DailyBucket::new(day(3), "FI");
        c.sample_size = 7;

        let samples = daily_samples(&[a, b, c]);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].date, day(3));
        assert_eq!(samples[1], DailySample::new(day(4), 15, 3));
    }

    #[test]
    fn test_json_shape() {
        let chart = compute_p_chart(&[DailySample::new(day(4), 100, 10)]);
        let json = serde_json::to_value(&chart).unwrap();
        assert_eq!(json["centerLine"], 10.0);
        assert_eq!(json["weeklyTotals"]["totalParts"], 100);
        assert_eq!(json["weeklyTotals"]["defectRate"], 10.0);
        let point = &json["dailyPoints"][0];
        assert_eq!(point["date"], "2024-03-04");
        assert_eq!(point["sampleSize"], 100);
        assert_eq!(point["defects"], 10);
        assert_eq!(point["outOfControl"], false);
        assert!(point.get("upperControlLimit").is_some());
        assert!(point.get("lowerControlLimit").is_some());
    }
}
