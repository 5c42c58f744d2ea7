//! First-pass yield, throughput yield and station performance
//!
//! FPY counts units that passed every required station on the first try
//! with no failing record anywhere. A unit repaired and shipped still loses
//! its first-pass status.
//!
//! TPY is the product of per-station pass rates over a station subset
//! (the focused key stations or the complete line). Stations with no
//! records are skipped rather than counted as zero yield.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::core::standardize::standardize_station;
use crate::core::stats::ratio;
use crate::core::week::WeekId;
use crate::entities::observation::{EventKind, Observation};

/// Which configured station subset a TPY/FPY calculation uses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StationScope {
    /// Key stations only
    #[default]
    Focused,
    /// Every station on the line
    Complete,
}

impl std::fmt::Display for StationScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StationScope::Focused => write!(f, "focused"),
            StationScope::Complete => write!(f, "complete"),
        }
    }
}

/// First-pass yield counts and ratios
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirstPassYield {
    /// Units with a test record at a required station
    pub parts_started: u64,
    /// Units that passed every required station first time, never failing
    pub first_pass_success: u64,
    /// Units that passed every required station or were packed
    pub completed: u64,
    /// First-pass successes among completed units
    pub completed_first_pass: u64,
    /// first_pass_success / parts_started
    pub traditional: f64,
    /// completed_first_pass / completed
    pub completed_only: f64,
}

/// Pass rate at one station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationYield {
    pub station: String,
    pub passed: u64,
    pub total: u64,
    pub yield_rate: f64,
}

/// Throughput yield over a station subset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThroughputYield {
    /// Stations with records, in the configured order
    pub stations: Vec<StationYield>,
    /// Product of the station yields (0 when no station has records)
    pub overall: f64,
}

/// Pass/fail tally for one station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationPerformance {
    pub station: String,
    pub pass: u64,
    pub fail: u64,
    pub failure_rate: f64,
}

/// Yield figures for one day, week or model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YieldSummary {
    /// `YYYY-MM-DD`, `YYYY-Www` or model name
    pub key: String,
    pub first_pass: FirstPassYield,
    pub throughput: ThroughputYield,
}

/// Standardize a station list, dropping blanks and duplicates
fn canonical_stations(stations: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    stations
        .iter()
        .filter_map(|s| standardize_station(Some(s)))
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

/// Test records and pack events of a unit, in time order
type UnitEvents<'a> = Vec<&'a Observation>;

fn group_units<'a, I>(observations: I) -> BTreeMap<&'a str, UnitEvents<'a>>
where
    I: IntoIterator<Item = &'a Observation>,
{
    let mut units: BTreeMap<&str, UnitEvents<'_>> = BTreeMap::new();
    for obs in observations {
        units.entry(obs.serial.as_str()).or_default().push(obs);
    }
    for events in units.values_mut() {
        events.sort_by_key(|o| o.timestamp);
    }
    units
}

/// Stations each model was actually tested at
fn stations_by_model(observations: &[Observation]) -> HashMap<&str, HashSet<String>> {
    let mut map: HashMap<&str, HashSet<String>> = HashMap::new();
    for obs in observations.iter().filter(|o| o.is_test()) {
        if let Some(station) = standardize_station(Some(&obs.station)) {
            map.entry(obs.model.as_str()).or_default().insert(station);
        }
    }
    map
}

fn first_pass_of(
    units: &BTreeMap<&str, UnitEvents<'_>>,
    required: &[String],
    model_stations: &HashMap<&str, HashSet<String>>,
) -> FirstPassYield {
    let mut result = FirstPassYield::default();

    for events in units.values() {
        let Some(model) = events.first().map(|o| o.model.as_str()) else {
            continue;
        };

        // Required stations this model never visits are skipped
        let seen = model_stations.get(model);
        let unit_required: Vec<&String> = required
            .iter()
            .filter(|s| seen.is_some_and(|set| set.contains(*s)))
            .collect();
        if unit_required.is_empty() {
            continue;
        }

        let tests: Vec<(String, &Observation)> = events
            .iter()
            .filter(|o| o.is_test())
            .filter_map(|o| standardize_station(Some(&o.station)).map(|s| (s, *o)))
            .collect();

        let started = tests
            .iter()
            .any(|(station, _)| unit_required.contains(&station));
        if !started {
            continue;
        }
        result.parts_started += 1;

        let any_fail = tests.iter().any(|(_, o)| o.is_fail());
        let first_attempts_pass = unit_required.iter().all(|station| {
            tests
                .iter()
                .find(|(s, _)| s == *station)
                .is_some_and(|(_, o)| o.is_pass())
        });
        let passed_all = unit_required
            .iter()
            .all(|station| tests.iter().any(|(s, o)| s == *station && o.is_pass()));
        let packed = events.iter().any(|o| o.kind == EventKind::Pack);

        let first_pass = first_attempts_pass && !any_fail;
        let completed = passed_all || packed;

        if first_pass {
            result.first_pass_success += 1;
        }
        if completed {
            result.completed += 1;
            if first_pass {
                result.completed_first_pass += 1;
            }
        }
    }

    result.traditional = ratio(result.first_pass_success, result.parts_started);
    result.completed_only = ratio(result.completed_first_pass, result.completed);
    result
}

fn throughput_of<'a, I>(observations: I, stations: &[String]) -> ThroughputYield
where
    I: IntoIterator<Item = &'a Observation>,
{
    let mut tallies: HashMap<String, (u64, u64)> = HashMap::new();
    for obs in observations.into_iter().filter(|o| o.is_test()) {
        let Some(station) = standardize_station(Some(&obs.station)) else {
            continue;
        };
        let entry = tallies.entry(station).or_default();
        entry.1 += 1;
        if obs.is_pass() {
            entry.0 += 1;
        }
    }

    let station_yields: Vec<StationYield> = stations
        .iter()
        .filter_map(|station| {
            let &(passed, total) = tallies.get(station)?;
            (total > 0).then(|| StationYield {
                station: station.clone(),
                passed,
                total,
                yield_rate: ratio(passed, total),
            })
        })
        .collect();

    let overall: f64 = if station_yields.is_empty() {
        0.0
    } else {
        station_yields.iter().map(|s| s.yield_rate).product()
    };

    ThroughputYield {
        stations: station_yields,
        overall,
    }
}

/// First-pass yield over all units in `observations`
///
/// `required_stations` are standardized before matching.
pub fn first_pass_yield(
    observations: &[Observation],
    required_stations: &[String],
) -> FirstPassYield {
    let required = canonical_stations(required_stations);
    let model_stations = stations_by_model(observations);
    let units = group_units(observations);
    first_pass_of(&units, &required, &model_stations)
}

/// Throughput yield over `stations` (standardized before matching)
pub fn throughput_yield(observations: &[Observation], stations: &[String]) -> ThroughputYield {
    throughput_of(observations, &canonical_stations(stations))
}

/// Pass/fail counts per standardized station, ordered by station name
pub fn station_performance(observations: &[Observation]) -> Vec<StationPerformance> {
    let mut tallies: BTreeMap<String, (u64, u64)> = BTreeMap::new();
    for obs in observations.iter().filter(|o| o.is_test()) {
        let Some(station) = standardize_station(Some(&obs.station)) else {
            continue;
        };
        let entry = tallies.entry(station).or_default();
        if obs.is_pass() {
            entry.0 += 1;
        } else {
            entry.1 += 1;
        }
    }

    tallies
        .into_iter()
        .map(|(station, (pass, fail))| StationPerformance {
            station,
            pass,
            fail,
            failure_rate: ratio(fail, pass + fail),
        })
        .collect()
}

/// Yield per bucket key
///
/// A unit's FPY is counted in the bucket of its first test record; TPY uses
/// each test record's own bucket.
fn yield_by<K, F>(
    observations: &[Observation],
    stations: &[String],
    key_of: F,
) -> Vec<YieldSummary>
where
    K: Ord + Display,
    F: Fn(&Observation) -> K,
{
    let required = canonical_stations(stations);
    let model_stations = stations_by_model(observations);
    let units = group_units(observations);

    let mut unit_buckets: BTreeMap<K, BTreeMap<&str, UnitEvents<'_>>> = BTreeMap::new();
    for (serial, events) in &units {
        let Some(first_test) = events.iter().find(|o| o.is_test()) else {
            continue;
        };
        unit_buckets
            .entry(key_of(*first_test))
            .or_default()
            .insert(*serial, events.clone());
    }

    let mut test_buckets: BTreeMap<K, Vec<&Observation>> = BTreeMap::new();
    for obs in observations.iter().filter(|o| o.is_test()) {
        test_buckets.entry(key_of(obs)).or_default().push(obs);
    }

    let mut keys: Vec<&K> = unit_buckets.keys().chain(test_buckets.keys()).collect();
    keys.sort();
    keys.dedup();

    let empty_units = BTreeMap::new();
    keys.into_iter()
        .map(|key| {
            let bucket_units = unit_buckets.get(key).unwrap_or(&empty_units);
            let tests = test_buckets.get(key).map(Vec::as_slice).unwrap_or(&[]);
            YieldSummary {
                key: key.to_string(),
                first_pass: first_pass_of(bucket_units, &required, &model_stations),
                throughput: throughput_of(tests.iter().copied(), &required),
            }
        })
        .collect()
}

/// Yield per calendar day (`YYYY-MM-DD`)
pub fn yield_by_day(observations: &[Observation], stations: &[String]) -> Vec<YieldSummary> {
    yield_by(observations, stations, Observation::date)
}

/// Yield per week identifier (`YYYY-Www`)
pub fn yield_by_week(observations: &[Observation], stations: &[String]) -> Vec<YieldSummary> {
    yield_by(observations, stations, |o| WeekId::containing(o.date()))
}

/// Yield per product model
pub fn yield_by_model(observations: &[Observation], stations: &[String]) -> Vec<YieldSummary> {
    yield_by(observations, stations, |o| o.model.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::observation::TestStatus;
    use crate::entities::observation::TestStatus::{Fail, Pass};
    use chrono::NaiveDateTime;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn t(serial: &str, station: &str, ts: &str, status: TestStatus) -> Observation {
        Observation::test(serial, station, "M100", at(ts), status)
    }

    fn stations(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    /// SN1 clean, SN2 fails VI then repaired, SN3 only reached ICT
    fn line() -> Vec<Observation> {
        vec![
            t("SN1", "ICT", "2024-03-04 08:00", Pass),
            t("SN1", "VI", "2024-03-04 09:00", Pass),
            t("SN1", "FI", "2024-03-04 10:00", Pass),
            t("SN2", "ICT", "2024-03-04 08:10", Pass),
            t("SN2", "VI!", "2024-03-04 09:10", Fail),
            Observation::repair("SN2", "REPAIR", "M100", at("2024-03-04 09:30"), "bent pin"),
            t("SN2", "VI", "2024-03-04 09:50", Pass),
            t("SN2", "FI1", "2024-03-05 10:10", Pass),
            Observation::pack("SN2", "M100", at("2024-03-05 11:00")),
            t("SN3", "ICT", "2024-03-05 08:20", Pass),
        ]
    }

    #[test]
    fn test_first_pass_yield_traditional_and_completed() {
        let fpy = first_pass_yield(&line(), &stations(&["ICT", "VI1", "FI"]));
        assert_eq!(fpy.parts_started, 3);
        assert_eq!(fpy.first_pass_success, 1);
        assert_eq!(fpy.completed, 2);
        assert_eq!(fpy.completed_first_pass, 1);
        assert!((fpy.traditional - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(fpy.completed_only, 0.5);
    }

    #[test]
    fn test_repaired_unit_loses_first_pass() {
        let obs: Vec<Observation> = line().into_iter().filter(|o| o.serial == "SN2").collect();
        let fpy = first_pass_yield(&obs, &stations(&["ICT", "VI", "FI"]));
        assert_eq!(fpy.parts_started, 1);
        assert_eq!(fpy.first_pass_success, 0);
        assert_eq!(fpy.completed, 1);
    }

    #[test]
    fn test_fpy_no_parts_is_zero() {
        let fpy = first_pass_yield(&[], &stations(&["FI"]));
        assert_eq!(fpy.parts_started, 0);
        assert_eq!(fpy.traditional, 0.0);
        assert_eq!(fpy.completed_only, 0.0);
    }

    #[test]
    fn test_fpy_skips_stations_a_model_never_visits() {
        let obs = vec![
            Observation::test("A1", "ICT", "M200", at("2024-03-04 08:00"), Pass),
            Observation::test("A1", "FI", "M200", at("2024-03-04 09:00"), Pass),
        ];
        // M200 has no VI station; it should not block first-pass success
        let fpy = first_pass_yield(&obs, &stations(&["ICT", "VI", "FI"]));
        assert_eq!(fpy.first_pass_success, 1);
        assert_eq!(fpy.traditional, 1.0);
    }

    #[test]
    fn test_throughput_yield_product() {
        let tpy = throughput_yield(&line(), &stations(&["ICT", "VI", "FI"]));
        let names: Vec<&str> = tpy.stations.iter().map(|s| s.station.as_str()).collect();
        assert_eq!(names, vec!["ICT", "VI1", "FI"]);
        assert_eq!(tpy.stations[0].yield_rate, 1.0);
        assert_eq!(tpy.stations[1].passed, 2);
        assert_eq!(tpy.stations[1].total, 3);
        assert!((tpy.overall - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_throughput_skips_missing_stations() {
        let focused = throughput_yield(&line(), &stations(&["VI", "BURN-IN"]));
        assert_eq!(focused.stations.len(), 1);
        assert!((focused.overall - 2.0 / 3.0).abs() < 1e-12);

        let none = throughput_yield(&line(), &stations(&["BURN-IN"]));
        assert!(none.stations.is_empty());
        assert_eq!(none.overall, 0.0);
    }

    #[test]
    fn test_station_performance() {
        let perf = station_performance(&line());
        let vi = perf.iter().find(|p| p.station == "VI1").unwrap();
        assert_eq!(vi.pass, 2);
        assert_eq!(vi.fail, 1);
        assert!((vi.failure_rate - 1.0 / 3.0).abs() < 1e-12);

        let names: Vec<&str> = perf.iter().map(|p| p.station.as_str()).collect();
        assert_eq!(names, vec!["FI", "ICT", "VI1"]);
    }

    #[test]
    fn test_yield_by_day_buckets_units_by_first_test() {
        let daily = yield_by_day(&line(), &stations(&["ICT", "VI", "FI"]));
        let keys: Vec<&str> = daily.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, vec!["2024-03-04", "2024-03-05"]);

        // SN1 and SN2 start on the 4th, SN3 on the 5th
        assert_eq!(daily[0].first_pass.parts_started, 2);
        assert_eq!(daily[0].first_pass.first_pass_success, 1);
        assert_eq!(daily[1].first_pass.parts_started, 1);

        // TPY on the 5th only sees SN2's FI pass and SN3's ICT pass
        assert_eq!(daily[1].throughput.overall, 1.0);
    }

    #[test]
    fn test_yield_by_week_and_model() {
        let weekly = yield_by_week(&line(), &stations(&["ICT", "VI", "FI"]));
        assert_eq!(weekly.len(), 1);
        assert_eq!(weekly[0].key, "2024-W10");
        assert_eq!(weekly[0].first_pass.parts_started, 3);

        let by_model = yield_by_model(&line(), &stations(&["ICT", "VI", "FI"]));
        assert_eq!(by_model.len(), 1);
        assert_eq!(by_model[0].key, "M100");
    }

    #[test]
    fn test_scope_display() {
        assert_eq!(StationScope::Focused.to_string(), "focused");
        assert_eq!(StationScope::Complete.to_string(), "complete");
    }
}
