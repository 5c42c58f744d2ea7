//! Daily and weekly aggregation buckets
//!
//! Buckets are value objects rebuilt for every report window. Only weekly
//! buckets are ever persisted, and only through the rollup store.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::pchart::ControlLimits;
use crate::core::week::WeekId;
use crate::entities::observation::Observation;

/// Dimension a bucket is keyed on alongside its date
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    /// Standardized station name
    #[default]
    Station,
    /// Product model
    Model,
    /// Part number (records without one are skipped)
    PartNumber,
    /// Everything in one bucket per date
    All,
}

impl GroupBy {
    /// Key for an observation under this grouping
    pub fn key_for(&self, obs: &Observation) -> Option<String> {
        match self {
            GroupBy::Station => crate::core::standardize::standardize_station(Some(&obs.station)),
            GroupBy::Model => Some(obs.model.trim().to_string()),
            GroupBy::PartNumber => obs
                .part_number
                .as_deref()
                .map(str::trim)
                .filter(|pn| !pn.is_empty())
                .map(str::to_string),
            GroupBy::All => Some(ALL_KEY.to_string()),
        }
    }
}

impl std::fmt::Display for GroupBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupBy::Station => write!(f, "station"),
            GroupBy::Model => write!(f, "model"),
            GroupBy::PartNumber => write!(f, "part_number"),
            GroupBy::All => write!(f, "all"),
        }
    }
}

/// Key used when grouping everything together
pub const ALL_KEY: &str = "ALL";

/// Counts for one date and one group key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBucket {
    pub date: NaiveDate,

    /// Station, model or part number depending on the grouping
    pub key: String,

    /// Test records
    pub total: u64,

    /// Passing test records
    pub pass: u64,

    /// Failing test records
    pub fail: u64,

    /// Distinct units tested
    pub sample_size: u64,

    /// Distinct units with at least one failing record
    pub defects: u64,
}

impl DailyBucket {
    pub fn new(date: NaiveDate, key: impl Into<String>) -> Self {
        Self {
            date,
            key: key.into(),
            total: 0,
            pass: 0,
            fail: 0,
            sample_size: 0,
            defects: 0,
        }
    }

    /// Week the bucket's date belongs to
    pub fn week(&self) -> WeekId {
        WeekId::containing(self.date)
    }
}

/// Counts for one week and one group key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyBucket {
    pub week: WeekId,

    pub key: String,

    pub total: u64,

    pub pass: u64,

    pub fail: u64,

    /// Sum of the daily sample sizes
    pub sample_size: u64,

    /// Sum of the daily defective-unit counts
    pub defects: u64,

    /// Number of daily buckets folded into this week
    pub days: u32,

    /// Limits recomputed from the week's own summed counts
    pub limits: ControlLimits,
}

impl WeeklyBucket {
    /// Pooled defect proportion for the week
    pub fn center_line(&self) -> f64 {
        self.limits.center_line
    }

    /// Test-record failure rate for the week
    pub fn failure_rate(&self) -> f64 {
        crate::core::stats::ratio(self.fail, self.total)
    }
}
