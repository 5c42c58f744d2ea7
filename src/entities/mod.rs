//! Entity type definitions

pub mod bucket;
pub mod observation;

pub use bucket::{DailyBucket, GroupBy, WeeklyBucket};
pub use observation::{EventKind, Observation, TestStatus};
