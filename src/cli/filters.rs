//! Value enums for command-line flags
//!
//! Each filter maps onto a core type so the engine stays free of clap.

use clap::ValueEnum;

use crate::core::yields::StationScope;
use crate::entities::bucket::GroupBy;

/// Station subset for `qdash yield --scope`
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ScopeFilter {
    /// Key stations only
    Focused,
    /// Every station on the line
    Complete,
}

impl From<ScopeFilter> for StationScope {
    fn from(filter: ScopeFilter) -> Self {
        match filter {
            ScopeFilter::Focused => StationScope::Focused,
            ScopeFilter::Complete => StationScope::Complete,
        }
    }
}

/// Bucket key for `qdash rollup --group-by`
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum GroupByFilter {
    /// Standardized station name
    #[default]
    Station,
    /// Product model
    Model,
    /// Part number
    PartNumber,
    /// One bucket per date
    All,
}

impl From<GroupByFilter> for GroupBy {
    fn from(filter: GroupByFilter) -> Self {
        match filter {
            GroupByFilter::Station => GroupBy::Station,
            GroupByFilter::Model => GroupBy::Model,
            GroupByFilter::PartNumber => GroupBy::PartNumber,
            GroupByFilter::All => GroupBy::All,
        }
    }
}
