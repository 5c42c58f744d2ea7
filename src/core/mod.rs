//! Core module - quality metrics engine and its data boundaries

pub mod config;
pub mod pareto;
pub mod pchart;
pub mod rollup;
pub mod source;
pub mod standardize;
pub mod stats;
pub mod store;
pub mod week;
pub mod yields;

pub use config::{Config, ConfigError, YieldConfig};
pub use pareto::{compute_pareto, compute_pareto_with_limit, ParetoEntry, PARETO_TOP_N};
pub use pchart::{compute_p_chart, ControlLimits, DailySample, PChart, PChartPoint, PChartTotals};
pub use rollup::{daily_buckets, weekly_p_chart, weekly_rollup};
pub use source::{CsvSource, MemorySource, ObservationQuery, ObservationSource, SourceError};
pub use standardize::{standardize_repair_code, standardize_station};
pub use store::{source_fingerprint, RollupStore, StoreError};
pub use week::{DateWindow, WeekId, WeekParseError};
pub use yields::{
    first_pass_yield, station_performance, throughput_yield, yield_by_day, yield_by_model,
    yield_by_week, FirstPassYield, StationPerformance, StationScope, StationYield,
    ThroughputYield, YieldSummary,
};
