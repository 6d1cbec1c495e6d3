//! Command-line parsing for the PM2.5 analytics tool.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! aggregation code and from command dispatch (`crate::app`).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{Granularity, SeriesSelector, WeekStart, WindowSize};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "pm25", version, about = "PM2.5 air-quality analytics")]
pub struct Cli {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Dataset locations. Each falls back to an environment variable, then a default.
#[derive(Debug, Args, Clone, Default)]
pub struct DataArgs {
    /// PM2.5 dataset: file path or http(s) URL [env: PM25_DATA].
    #[arg(long, global = true, value_name = "PATH|URL")]
    pub pm25: Option<String>,

    /// Health-case dataset: file path or http(s) URL [env: HDC_DATA].
    #[arg(long, global = true, value_name = "PATH|URL")]
    pub hdc: Option<String>,

    /// Analysis backend base URL [env: PM25_API_URL].
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List monitoring stations with province/region metadata.
    Stations,
    /// Check the PM2.5 dataset's metadata against its readings.
    Verify(VerifyArgs),
    /// Monthly heatmap matrix, or a daily calendar grid with `--daily`.
    Heatmap(HeatmapArgs),
    /// Per-bucket mean and median at a chosen calendar granularity.
    Buckets(BucketsArgs),
    /// Moving-average trend line.
    Trend(TrendArgs),
    /// Month-by-month comparison against the previous year and a historical median.
    Seasonal(SeasonalArgs),
    /// Weekly PM2.5 joined with health-case counts.
    Health(HealthArgs),
    /// Request statistical analysis from the backend.
    Compute(ComputeArgs),
}

/// Which stations to aggregate. Defaults to all stations when nothing is given.
#[derive(Debug, Args, Clone, Default)]
pub struct SelectArgs {
    /// Single station code.
    #[arg(short = 's', long, conflicts_with_all = ["province", "region"])]
    pub station: Option<String>,

    /// Average all stations in a province.
    #[arg(short = 'p', long, conflicts_with = "region")]
    pub province: Option<String>,

    /// Average all stations in a health region.
    #[arg(long)]
    pub region: Option<String>,
}

impl SelectArgs {
    pub fn selector(&self) -> SeriesSelector {
        if let Some(code) = &self.station {
            SeriesSelector::Station(code.clone())
        } else if let Some(name) = &self.province {
            SeriesSelector::Province(name.clone())
        } else if let Some(name) = &self.region {
            SeriesSelector::Region(name.clone())
        } else {
            SeriesSelector::All
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct VerifyArgs {
    /// Count stations with readings on or after this date (YYYY-MM-DD).
    /// Defaults to January 1 of the latest year with data.
    #[arg(long, value_name = "DATE")]
    pub since: Option<String>,

    /// Export the report to JSON.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct HeatmapArgs {
    #[command(flatten)]
    pub select: SelectArgs,

    /// Render the daily calendar grid instead of the monthly matrix.
    #[arg(long)]
    pub daily: bool,

    /// Year for the daily grid (defaults to the latest year with data).
    #[arg(short = 'y', long)]
    pub year: Option<i32>,

    /// First row of the daily grid.
    #[arg(long, value_enum, default_value_t = WeekStart::Sunday)]
    pub week_start: WeekStart,

    /// Export the view to JSON.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct BucketsArgs {
    #[command(flatten)]
    pub select: SelectArgs,

    /// Bucket size.
    #[arg(short = 'g', long, value_enum, default_value_t = Granularity::Month)]
    pub granularity: Granularity,

    /// Only print buckets from this year.
    #[arg(short = 'y', long)]
    pub year: Option<i32>,

    /// Export the buckets to JSON.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct TrendArgs {
    #[command(flatten)]
    pub select: SelectArgs,

    /// Moving-average window (days).
    #[arg(short = 'w', long, value_enum, default_value_t = WindowSize::D7)]
    pub window: WindowSize,

    /// Only print points from this year (the average still uses earlier history).
    #[arg(short = 'y', long)]
    pub year: Option<i32>,

    /// Export the trend to JSON, or CSV when the path ends in `.csv`.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct SeasonalArgs {
    #[command(flatten)]
    pub select: SelectArgs,

    /// Year to compare (defaults to the latest year with data).
    #[arg(short = 'y', long)]
    pub year: Option<i32>,

    /// Number of years before `--year` used for the historical median.
    #[arg(long, default_value_t = 5)]
    pub history: u32,

    /// Export the table to JSON.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct HealthArgs {
    #[command(flatten)]
    pub select: SelectArgs,

    /// ISO week-year to align (defaults to the latest year with data).
    #[arg(short = 'y', long)]
    pub year: Option<i32>,

    /// Disease group, or `Total` for the sum of all groups.
    #[arg(short = 'c', long, default_value = "Total")]
    pub category: String,

    /// Export the join to JSON, or CSV when the path ends in `.csv`.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ComputeArgs {
    /// Series used for the client-side correlation shown beside the backend's.
    #[command(flatten)]
    pub select: SelectArgs,

    /// Year to analyse (defaults to the latest year with data).
    #[arg(short = 'y', long)]
    pub year: Option<i32>,

    /// Ask the backend to bypass its result cache.
    #[arg(long)]
    pub force: bool,

    /// Only check that the backend is up.
    #[arg(long)]
    pub ping: bool,

    /// Export the raw response to JSON.
    #[arg(long)]
    pub export: Option<PathBuf>,
}
