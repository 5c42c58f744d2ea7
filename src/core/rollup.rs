//! Daily bucketing and weekly rollup
//!
//! Daily buckets count test records and distinct units per (date, key).
//! Weekly buckets sum the daily counts and recompute the center line from
//! the summed raw counts; averaging daily rates would overweight low-volume
//! days.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;

use crate::core::pchart::{compute_p_chart, ControlLimits, DailySample, PChart};
use crate::core::stats::ratio;
use crate::core::week::WeekId;
use crate::entities::bucket::{DailyBucket, GroupBy, WeeklyBucket};
use crate::entities::observation::Observation;

#[derive(Default)]
struct DayAccumulator<'a> {
    total: u64,
    pass: u64,
    fail: u64,
    tested: HashSet<&'a str>,
    failed: HashSet<&'a str>,
}

/// Group test records into daily buckets, sorted by date then key
///
/// Records without a key under `group_by` (e.g. no part number) are skipped.
pub fn daily_buckets(observations: &[Observation], group_by: GroupBy) -> Vec<DailyBucket> {
    let mut days: BTreeMap<(NaiveDate, String), DayAccumulator<'_>> = BTreeMap::new();

    for obs in observations.iter().filter(|o| o.is_test()) {
        let Some(key) = group_by.key_for(obs) else {
            continue;
        };
        let acc = days.entry((obs.date(), key)).or_default();
        acc.total += 1;
        acc.tested.insert(obs.serial.as_str());
        if obs.is_pass() {
            acc.pass += 1;
        } else {
            acc.fail += 1;
            acc.failed.insert(obs.serial.as_str());
        }
    }

    days.into_iter()
        .map(|((date, key), acc)| DailyBucket {
            date,
            key,
            total: acc.total,
            pass: acc.pass,
            fail: acc.fail,
            sample_size: acc.tested.len() as u64,
            defects: acc.failed.len() as u64,
        })
        .collect()
}

/// Roll daily buckets up into weekly buckets, sorted by week then key
pub fn weekly_rollup(daily: &[DailyBucket]) -> Vec<WeeklyBucket> {
    let mut weeks: BTreeMap<(WeekId, String), WeeklyBucket> = BTreeMap::new();

    for bucket in daily {
        let week = bucket.week();
        let entry = weeks
            .entry((week, bucket.key.clone()))
            .or_insert_with(|| WeeklyBucket {
                week,
                key: bucket.key.clone(),
                total: 0,
                pass: 0,
                fail: 0,
                sample_size: 0,
                defects: 0,
                days: 0,
                limits: ControlLimits::degenerate(0.0),
            });
        entry.total += bucket.total;
        entry.pass += bucket.pass;
        entry.fail += bucket.fail;
        entry.sample_size += bucket.sample_size;
        entry.defects += bucket.defects;
        entry.days += 1;
    }

    weeks
        .into_values()
        .map(|mut week| {
            let center_line = ratio(week.defects, week.sample_size);
            week.limits = ControlLimits::for_sample(center_line, week.sample_size as i64);
            week
        })
        .collect()
}

/// P-chart at weekly grain, one point per week dated by its Monday
///
/// Buckets for different keys in the same week are summed first.
pub fn weekly_p_chart(weeks: &[WeeklyBucket]) -> PChart {
    let mut by_week: BTreeMap<WeekId, (u64, u64)> = BTreeMap::new();
    for bucket in weeks {
        let entry = by_week.entry(bucket.week).or_default();
        entry.0 += bucket.sample_size;
        entry.1 += bucket.defects;
    }

    let samples: Vec<DailySample> = by_week
        .into_iter()
        .map(|(week, (n, defects))| DailySample::new(week.start_date(), n as i64, defects as i64))
        .collect();

    compute_p_chart(&samples)
}
