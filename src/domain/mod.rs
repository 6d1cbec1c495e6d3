//! Domain types used throughout the crate.
//!
//! This module defines:
//!
//! - raw observations (`Reading`, `Series`) and dataset locations (`DataSource`)
//! - grouping keys and accumulators (`Granularity`, `BucketKey`, `AggregateStat`)
//! - the row/cell types of every derived view (`MonthlyMatrix`, `DailyGrid`,
//!   `TrendPoint`, `SeasonalRow`, `WeeklyJoinRow`)

pub mod types;

pub use types::*;
