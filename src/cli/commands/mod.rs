//! CLI command implementations

pub mod completions;
pub mod pareto;
pub mod pchart;
pub mod rollup;
pub mod standardize;
pub mod stations;
pub mod yields;
