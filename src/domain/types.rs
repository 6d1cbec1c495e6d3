//! Shared domain types.
//!
//! These types are intentionally plain and serializable so they can be:
//!
//! - deserialized straight out of the consolidated JSON datasets
//! - passed between the pure aggregation functions without copies of state
//! - exported to JSON/CSV as-is

use std::fmt;
use std::path::PathBuf;

use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Date format used by every dataset (`YYYY-MM-DD`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a dataset date string. Returns `None` for anything malformed.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

/// A single daily PM2.5 observation (µg/m³).
///
/// The date is kept as the raw string from the source; aggregation parses it
/// and skips readings whose date does not parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub date: String,
    pub value: f64,
}

impl Reading {
    pub fn new(date: impl Into<String>, value: f64) -> Self {
        Self {
            date: date.into(),
            value,
        }
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }
}

/// Readings for one station (or one averaged selection), normally ascending by date.
pub type Series = Vec<Reading>;

/// Calendar bucket size for [`crate::aggregate::temporal::aggregate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Granularity {
    Day,
    Month,
    IsoWeek,
    Year,
}

/// Grouping key derived from a date. Orders chronologically within one granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BucketKey {
    Day { date: NaiveDate },
    /// `month0` is 0-based (January = 0).
    Month { year: i32, month0: u32 },
    IsoWeek { year: i32, week: u32 },
    Year { year: i32 },
}

impl BucketKey {
    pub fn for_date(date: NaiveDate, granularity: Granularity) -> Self {
        match granularity {
            Granularity::Day => BucketKey::Day { date },
            Granularity::Month => BucketKey::Month {
                year: date.year(),
                month0: date.month0(),
            },
            Granularity::IsoWeek => {
                let iso = date.iso_week();
                BucketKey::IsoWeek {
                    year: iso.year(),
                    week: iso.week(),
                }
            }
            Granularity::Year => BucketKey::Year { year: date.year() },
        }
    }

    /// Calendar year of the bucket (ISO week-year for weeks).
    pub fn year(&self) -> i32 {
        match self {
            BucketKey::Day { date } => date.year(),
            BucketKey::Month { year, .. }
            | BucketKey::IsoWeek { year, .. }
            | BucketKey::Year { year } => *year,
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketKey::Day { date } => write!(f, "{}", date.format(DATE_FORMAT)),
            BucketKey::Month { year, month0 } => write!(f, "{year}-{:02}", month0 + 1),
            BucketKey::IsoWeek { year, week } => write!(f, "{year}-W{week:02}"),
            BucketKey::Year { year } => write!(f, "{year}"),
        }
    }
}

/// Running `{sum, count}` accumulator for one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AggregateStat {
    pub sum: f64,
    pub count: usize,
}

impl AggregateStat {
    pub fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    /// `sum / count`, or `None` when nothing was accumulated.
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

/// Summary statistics for one bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketSummary {
    pub key: BucketKey,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
}

/// First row of the day heatmap grid.
///
/// Week bucketing always uses ISO (Monday-based) weeks; this only controls how
/// the daily grid folds into 7 rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    /// Row index (0..7) of `date` in a grid whose first row is this weekday.
    pub fn row_of(self, date: NaiveDate) -> u32 {
        match self {
            WeekStart::Sunday => date.weekday().num_days_from_sunday(),
            WeekStart::Monday => date.weekday().num_days_from_monday(),
        }
    }
}

/// Moving-average windows offered by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum WindowSize {
    #[value(name = "7")]
    D7,
    #[value(name = "15")]
    D15,
    #[value(name = "30")]
    D30,
}

impl WindowSize {
    pub fn days(self) -> usize {
        match self {
            WindowSize::D7 => 7,
            WindowSize::D15 => 15,
            WindowSize::D30 => 30,
        }
    }
}

/// Thai PM2.5 air-quality category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AqiLevel {
    Good,
    Moderate,
    UnhealthySensitive,
    Unhealthy,
    VeryUnhealthy,
}

impl AqiLevel {
    pub const ALL: [AqiLevel; 5] = [
        AqiLevel::Good,
        AqiLevel::Moderate,
        AqiLevel::UnhealthySensitive,
        AqiLevel::Unhealthy,
        AqiLevel::VeryUnhealthy,
    ];

    pub fn classify(value: f64) -> Self {
        if value <= 25.0 {
            AqiLevel::Good
        } else if value <= 37.0 {
            AqiLevel::Moderate
        } else if value <= 50.0 {
            AqiLevel::UnhealthySensitive
        } else if value <= 90.0 {
            AqiLevel::Unhealthy
        } else {
            AqiLevel::VeryUnhealthy
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            AqiLevel::Good => "Good (0-25)",
            AqiLevel::Moderate => "Moderate (26-37)",
            AqiLevel::UnhealthySensitive => "Unhealthy Sensitive (38-50)",
            AqiLevel::Unhealthy => "Unhealthy (51-90)",
            AqiLevel::VeryUnhealthy => "Very Unhealthy (>90)",
        }
    }

    /// One-character marker used in text heatmaps.
    pub fn glyph(self) -> char {
        match self {
            AqiLevel::Good => '.',
            AqiLevel::Moderate => ':',
            AqiLevel::UnhealthySensitive => '+',
            AqiLevel::Unhealthy => '#',
            AqiLevel::VeryUnhealthy => '@',
        }
    }
}

/// One year of monthly means (January first).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRow {
    pub year: i32,
    pub months: [Option<f64>; 12],
}

/// Year × month heatmap matrix. Empty input gives no years and no rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthlyMatrix {
    pub years: Vec<i32>,
    pub rows: Vec<MonthlyRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

/// Full-year day grid, folded column-major into 7 rows.
///
/// `padding` empty cells precede January 1 so its row matches its weekday.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyGrid {
    pub year: i32,
    pub week_start: WeekStart,
    pub padding: usize,
    pub cells: Vec<DayCell>,
    pub columns: usize,
}

impl DailyGrid {
    pub fn empty(year: i32, week_start: WeekStart) -> Self {
        Self {
            year,
            week_start,
            padding: 0,
            cells: Vec::new(),
            columns: 0,
        }
    }

    /// Cell at grid position `(row, column)`; `None` for padding or past the end.
    pub fn cell_at(&self, row: usize, column: usize) -> Option<&DayCell> {
        let slot = column * 7 + row;
        slot.checked_sub(self.padding)
            .and_then(|idx| self.cells.get(idx))
    }
}

/// One point of a trend line: the raw value plus its trailing average.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: String,
    pub value: f64,
    pub average: Option<f64>,
}

/// Inclusive range of calendar years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    /// The `years` calendar years immediately before `current_year`.
    ///
    /// Huge spans clamp instead of wrapping, so the range stays non-empty.
    pub fn trailing(current_year: i32, years: u32) -> Self {
        let span = i32::try_from(years).unwrap_or(i32::MAX);
        Self {
            start: current_year.saturating_sub(span),
            end: current_year.saturating_sub(1),
        }
    }

    pub fn contains(&self, year: i32) -> bool {
        self.start <= year && year <= self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// One calendar month of the year-over-year comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonalRow {
    /// 1-based month (January = 1).
    pub month: u32,
    pub current: Option<f64>,
    pub previous: Option<f64>,
    pub historical_median: Option<f64>,
}

/// One ISO week of the PM2.5 × health-case join.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyJoinRow {
    pub week: u32,
    pub pm25_avg: Option<f64>,
    pub case_count: Option<u64>,
}

/// Pearson correlation over paired weekly values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Correlation {
    pub r: f64,
    pub n: usize,
}

/// Which health-case series to join against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseCategory {
    /// Sum of every named group, recomputed per week.
    Total,
    Named(String),
}

impl CaseCategory {
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("total") {
            CaseCategory::Total
        } else {
            CaseCategory::Named(raw.to_string())
        }
    }
}

impl fmt::Display for CaseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseCategory::Total => write!(f, "Total"),
            CaseCategory::Named(name) => write!(f, "{name}"),
        }
    }
}

/// Number of ISO week slots in a health-case year.
pub const ISO_WEEKS: usize = 53;

/// Weekly case counts for one category; `counts[0]` is ISO week 1.
///
/// A slot is `None` when the source has no data for that week.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyCases {
    pub category: CaseCategory,
    pub counts: Vec<Option<f64>>,
}

impl WeeklyCases {
    pub fn empty(category: CaseCategory) -> Self {
        Self {
            category,
            counts: vec![None; ISO_WEEKS],
        }
    }

    /// Count for a 1-based ISO week.
    pub fn week(&self, week: u32) -> Option<f64> {
        let idx = (week as usize).checked_sub(1)?;
        self.counts.get(idx).copied().flatten()
    }
}

/// Which stations feed a series. Multi-station selections are averaged per date.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SeriesSelector {
    Station(String),
    Province(String),
    Region(String),
    All,
}

impl fmt::Display for SeriesSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesSelector::Station(code) => write!(f, "station {code}"),
            SeriesSelector::Province(name) => write!(f, "province {name}"),
            SeriesSelector::Region(name) => write!(f, "region {name}"),
            SeriesSelector::All => write!(f, "all stations"),
        }
    }
}

/// Where a dataset is loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    File(PathBuf),
    Url(String),
}

impl DataSource {
    /// `http://` / `https://` locations are fetched, anything else is a file path.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            DataSource::Url(trimmed.to_string())
        } else {
            DataSource::File(PathBuf::from(trimmed))
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::File(path) => write!(f, "{}", path.display()),
            DataSource::Url(url) => write!(f, "{url}"),
        }
    }
}

/// Resolved run configuration (env defaults overridden by CLI flags).
#[derive(Debug, Clone)]
pub struct DashConfig {
    pub pm25_source: DataSource,
    pub hdc_source: DataSource,
    pub api_url: String,
}
