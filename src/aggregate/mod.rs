//! Pure aggregation components.
//!
//! - `temporal`: calendar bucketing (monthly matrix, daily grid, ISO weeks)
//! - `moving`: trailing moving average
//! - `seasonal`: 12-month year-over-year comparison
//! - `health`: weekly PM2.5 × health-case join and correlation
//!
//! None of these hold state; calling one twice on the same input returns the
//! same output.

pub mod health;
pub mod moving;
pub mod seasonal;
pub mod stats;
pub mod temporal;

pub use health::{align_weekly, pearson};
pub use moving::moving_average;
pub use seasonal::seasonal_comparison;
pub use temporal::{aggregate, daily_grid, iso_week_means, monthly_matrix};
