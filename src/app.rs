//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and initializes logging
//! - parses CLI arguments and resolves the run configuration
//! - loads the datasets into a session
//! - prints the requested view and writes optional exports

use std::path::Path;

use clap::Parser;
use reqwest::blocking::Client;
use tracing_subscriber::EnvFilter;

use crate::cli::{
    BucketsArgs, Command, ComputeArgs, DataArgs, HealthArgs, HeatmapArgs, SeasonalArgs, SelectArgs,
    TrendArgs, VerifyArgs,
};
use crate::data::{ComputeClient, Pm25Dataset};
use crate::domain::{CaseCategory, DashConfig, DataSource, YearRange, parse_date};
use crate::error::AppError;
use crate::io::export;
use crate::session::Session;

pub mod pipeline;

const DEFAULT_PM25_DATA: &str = "public/data/pm25_consolidated.json";
const DEFAULT_HDC_DATA: &str = "public/data/hdc_consolidated.json";
const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Entry point for the `pm25` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = crate::cli::Cli::parse();
    let config = dash_config_from_args(&cli.data);
    let client = Client::new();

    match cli.command {
        Command::Stations => handle_stations(&config, &client),
        Command::Verify(args) => handle_verify(&config, &client, args),
        Command::Heatmap(args) => handle_heatmap(&config, &client, args),
        Command::Buckets(args) => handle_buckets(&config, &client, args),
        Command::Trend(args) => handle_trend(&config, &client, args),
        Command::Seasonal(args) => handle_seasonal(&config, &client, args),
        Command::Health(args) => handle_health(&config, &client, args),
        Command::Compute(args) => handle_compute(&config, &client, args),
    }
}

/// Logs go to stderr so stdout only carries the tables.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "pm25_dash=info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Resolve dataset locations: CLI flag, then environment, then default.
pub fn dash_config_from_args(args: &DataArgs) -> DashConfig {
    let pick = |flag: &Option<String>, var: &str, default: &str| -> String {
        flag.clone()
            .or_else(|| std::env::var(var).ok().filter(|v| !v.trim().is_empty()))
            .unwrap_or_else(|| default.to_string())
    };

    DashConfig {
        pm25_source: DataSource::parse(&pick(&args.pm25, "PM25_DATA", DEFAULT_PM25_DATA)),
        hdc_source: DataSource::parse(&pick(&args.hdc, "HDC_DATA", DEFAULT_HDC_DATA)),
        api_url: pick(&args.api_url, "PM25_API_URL", DEFAULT_API_URL),
    }
}

fn open(
    config: &DashConfig,
    client: &Client,
    select: &SelectArgs,
    year: Option<i32>,
) -> Result<Session, AppError> {
    pipeline::open_session(config, client, select.selector(), year)
}

fn handle_stations(config: &DashConfig, client: &Client) -> Result<(), AppError> {
    let pm25 = Pm25Dataset::load(&config.pm25_source, client)?;
    println!("{}", crate::report::format_stations(&pm25.stations()));
    Ok(())
}

fn handle_verify(config: &DashConfig, client: &Client, args: VerifyArgs) -> Result<(), AppError> {
    let since = args
        .since
        .as_deref()
        .map(|raw| {
            parse_date(raw)
                .ok_or_else(|| AppError::input(format!("Invalid --since date '{raw}'. Expected YYYY-MM-DD.")))
        })
        .transpose()?;

    let pm25 = Pm25Dataset::load(&config.pm25_source, client)?;
    let report = pm25.integrity(since);
    println!("{}", crate::report::format_integrity(&report));
    if let Some(path) = &args.export {
        export::write_json(path, &report)?;
    }
    Ok(())
}

fn handle_heatmap(config: &DashConfig, client: &Client, args: HeatmapArgs) -> Result<(), AppError> {
    let mut session = open(config, client, &args.select, args.year)?;
    session.set_week_start(args.week_start);
    let label = session.selection().series.to_string();

    let series = session.series()?;
    println!("{}", crate::report::format_summary(&label, &crate::report::summarize(&series)));

    if args.daily {
        let grid = session.daily()?;
        println!("{}", crate::report::format_daily(&label, &grid));
        if let Some(path) = &args.export {
            export::write_json(path, &grid)?;
        }
    } else {
        let matrix = session.monthly()?;
        println!("{}", crate::report::format_monthly(&label, &matrix));
        if let Some(path) = &args.export {
            export::write_json(path, &matrix)?;
        }
    }
    Ok(())
}

fn handle_buckets(config: &DashConfig, client: &Client, args: BucketsArgs) -> Result<(), AppError> {
    let mut session = open(config, client, &args.select, args.year)?;
    let label = session.selection().series.to_string();

    let mut buckets = session.buckets(args.granularity)?;
    if let Some(year) = args.year {
        buckets.retain(|b| b.key.year() == year);
    }

    println!("{}", crate::report::format_buckets(&label, &buckets));
    if let Some(path) = &args.export {
        export::write_json(path, &buckets)?;
    }
    Ok(())
}

fn handle_trend(config: &DashConfig, client: &Client, args: TrendArgs) -> Result<(), AppError> {
    let mut session = open(config, client, &args.select, args.year)?;
    session.set_window(args.window);
    let label = session.selection().series.to_string();

    let mut points = session.trend()?;
    if let Some(year) = args.year {
        let prefix = format!("{year}-");
        points.retain(|p| p.date.starts_with(&prefix));
    }

    println!(
        "{}",
        crate::report::format_trend(&label, args.window.days(), &points)
    );
    if let Some(path) = &args.export {
        if export::wants_csv(path) {
            export::write_trend_csv(path, &points)?;
        } else {
            export::write_json(path, &points)?;
        }
    }
    Ok(())
}

fn handle_seasonal(config: &DashConfig, client: &Client, args: SeasonalArgs) -> Result<(), AppError> {
    let mut session = open(config, client, &args.select, args.year)?;
    session.set_history_years(args.history);
    let label = session.selection().series.to_string();
    let year = session.selection().year;

    let rows = session.seasonal()?;
    println!(
        "{}",
        crate::report::format_seasonal(&label, year, YearRange::trailing(year, args.history), &rows)
    );
    if let Some(path) = &args.export {
        export::write_json(path, &rows)?;
    }
    Ok(())
}

fn handle_health(config: &DashConfig, client: &Client, args: HealthArgs) -> Result<(), AppError> {
    let mut session = open(config, client, &args.select, args.year)?;
    session.set_category(CaseCategory::parse(&args.category));
    let label = session.selection().series.to_string();

    let view = session.health_view()?;
    println!("{}", crate::report::format_health(&label, &view));
    if let Some(path) = &args.export {
        write_health_export(path, &view)?;
    }
    Ok(())
}

fn write_health_export(path: &Path, view: &crate::session::HealthView) -> Result<(), AppError> {
    if export::wants_csv(path) {
        export::write_weekly_csv(path, &view.rows)
    } else {
        export::write_json(path, view)
    }
}

fn handle_compute(config: &DashConfig, client: &Client, args: ComputeArgs) -> Result<(), AppError> {
    let backend = ComputeClient::new(client.clone(), config.api_url.clone());
    if args.ping {
        println!("backend {}: {}", config.api_url, backend.health()?);
        return Ok(());
    }

    let mut session = open(config, client, &args.select, args.year)?;
    let label = session.selection().series.to_string();
    let data = session.request_analysis(&backend, args.force)?.clone();
    println!("{}", crate::report::format_analysis(&data));

    let view = session.health_view()?;
    println!("{}", crate::report::format_local_correlation(&label, &view));
    if let Some(path) = &args.export {
        export::write_json(path, &data)?;
    }
    Ok(())
}
