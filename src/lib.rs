//! qdash: manufacturing quality metrics
//!
//! Reads per-unit test, repair and packing events and computes the
//! statistical process control views used on a line dashboard: Pareto
//! rankings, first-pass and throughput yield, p-charts with per-day
//! control limits, and weekly rollups.

pub mod cli;
pub mod core;
pub mod entities;
pub mod yaml;
