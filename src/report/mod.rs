//! Reporting utilities: series summaries and formatted terminal output.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::aggregate::stats;
use crate::domain::{AqiLevel, Reading};

pub mod format;

pub use format::*;

/// Headline statistics for a selected series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub readings: usize,
    pub first_date: Option<String>,
    pub last_date: Option<String>,
    pub mean: Option<f64>,
    pub max: Option<f64>,
    /// Days per AQI category.
    pub levels: BTreeMap<AqiLevel, usize>,
}

/// Summarize the readings with a parseable date.
pub fn summarize(series: &[Reading]) -> SeriesSummary {
    let mut dated: Vec<(chrono::NaiveDate, &Reading)> = series
        .iter()
        .filter_map(|r| r.parsed_date().map(|d| (d, r)))
        .collect();
    dated.sort_by_key(|(d, _)| *d);

    let values: Vec<f64> = dated.iter().map(|(_, r)| r.value).collect();
    let mut levels = BTreeMap::new();
    for &v in &values {
        *levels.entry(AqiLevel::classify(v)).or_insert(0) += 1;
    }

    SeriesSummary {
        readings: values.len(),
        first_date: dated.first().map(|(_, r)| r.date.clone()),
        last_date: dated.last().map(|(_, r)| r.date.clone()),
        mean: stats::mean(&values),
        max: values.iter().copied().reduce(f64::max),
        levels,
    }
}
