//! Plain-text rendering of every derived view.
//!
//! We keep formatting code in one place so:
//! - the aggregation code stays free of presentation concerns
//! - output changes are localized
//!
//! Values are rounded here, at display time only. Missing values print as `-`.

use crate::data::{AnalysisData, IntegrityReport, StationInfo};
use crate::domain::{AqiLevel, BucketSummary, DailyGrid, MonthlyMatrix, SeasonalRow, TrendPoint, WeekStart, YearRange};
use crate::report::SeriesSummary;
use crate::session::HealthView;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Station listing with display metadata.
pub fn format_stations(stations: &[StationInfo]) -> String {
    let mut out = String::new();
    push_line(
        &mut out,
        format!("{:<8} {:<32} {:<18} {:<20} {:>8}", "code", "name", "province", "region", "days"),
    );
    push_line(&mut out, format!("{:-<8} {:-<32} {:-<18} {:-<20} {:->8}", "", "", "", "", ""));
    for s in stations {
        push_line(
            &mut out,
            format!(
                "{:<8} {} {} {} {:>8}",
                truncate(&s.code, 8),
                pad(&truncate(&s.name, 32), 32),
                pad(&truncate(s.province.as_deref().unwrap_or("-"), 18), 18),
                pad(&truncate(s.region.as_deref().unwrap_or("-"), 20), 20),
                s.readings
            ),
        );
    }
    out
}

pub fn format_integrity(report: &IntegrityReport) -> String {
    let mut out = String::new();
    out.push_str("=== PM2.5 dataset check ===\n");
    out.push_str(&format!(
        "Stations: {} listed, {} with data\n",
        report.listed_stations, report.stations_with_data
    ));
    out.push_str(&format!(
        "Declared range: {} .. {}\n",
        report.declared_min_date.as_deref().unwrap_or("-"),
        report.declared_max_date.as_deref().unwrap_or("-")
    ));
    out.push_str(&format!(
        "Observed range: {} .. {}\n",
        report.observed_min_date.as_deref().unwrap_or("-"),
        report.observed_max_date.as_deref().unwrap_or("-")
    ));
    out.push_str(&format!("Data points: {}\n", report.data_points));
    if let Some(from) = &report.recent_from {
        out.push_str(&format!(
            "Stations with data since {from}: {}\n",
            report.stations_with_recent_data
        ));
    }

    let warnings = report.warnings();
    if warnings.is_empty() {
        out.push_str("OK\n");
    }
    for w in warnings {
        out.push_str(&format!("WARNING: {w}\n"));
    }
    out
}

/// One-paragraph summary of the selected series.
pub fn format_summary(label: &str, summary: &SeriesSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== PM2.5: {label} ===\n"));
    out.push_str(&format!(
        "Readings: {} | {} .. {}\n",
        summary.readings,
        summary.first_date.as_deref().unwrap_or("-"),
        summary.last_date.as_deref().unwrap_or("-"),
    ));
    out.push_str(&format!(
        "Mean: {} µg/m³ | Max: {} µg/m³\n",
        fmt_opt(summary.mean),
        fmt_opt(summary.max)
    ));
    for level in AqiLevel::ALL {
        let days = summary.levels.get(&level).copied().unwrap_or(0);
        out.push_str(&format!("  {} {:<28} {days:>6} days\n", level.glyph(), level.display_name()));
    }
    out
}

/// Year × month table of monthly means.
pub fn format_monthly(label: &str, matrix: &MonthlyMatrix) -> String {
    let mut out = String::new();
    out.push_str(&format!("Monthly mean PM2.5 (µg/m³) - {label}\n"));
    if matrix.rows.is_empty() {
        out.push_str("(no data)\n");
        return out;
    }

    let mut header = format!("{:<6}", "year");
    for m in MONTHS {
        header.push_str(&format!(" {m:>6}"));
    }
    push_line(&mut out, header);
    push_line(&mut out, format!("{:-<6}{}", "", " ------".repeat(12)));

    for row in &matrix.rows {
        let mut line = format!("{:<6}", row.year);
        for value in row.months {
            line.push_str(&format!(" {:>6}", fmt_opt(value)));
        }
        push_line(&mut out, line);
    }
    out
}

/// Calendar heatmap: seven rows of AQI glyphs, one column per week.
pub fn format_daily(label: &str, grid: &DailyGrid) -> String {
    let mut out = String::new();
    out.push_str(&format!("Daily PM2.5 {} - {label}\n", grid.year));
    if grid.cells.is_empty() {
        out.push_str("(no days)\n");
        return out;
    }

    let row_labels = match grid.week_start {
        WeekStart::Sunday => ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"],
        WeekStart::Monday => ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"],
    };

    for (row, row_label) in row_labels.iter().enumerate() {
        let mut line = format!("{row_label} ");
        for column in 0..grid.columns {
            let glyph = match grid.cell_at(row, column) {
                None => ' ',
                Some(cell) => cell.value.map_or('_', |v| AqiLevel::classify(v).glyph()),
            };
            line.push(glyph);
        }
        push_line(&mut out, line);
    }

    let observed = grid.cells.iter().filter(|c| c.value.is_some()).count();
    out.push_str(&format!(
        "\n{observed}/{} days observed. Legend: _ no data",
        grid.cells.len()
    ));
    for level in AqiLevel::ALL {
        out.push_str(&format!(", {} {}", level.glyph(), level.display_name()));
    }
    out.push('\n');
    out
}

/// One line per bucket: key, reading count, mean and median.
pub fn format_buckets(label: &str, buckets: &[BucketSummary]) -> String {
    let mut out = String::new();
    push_line(&mut out, format!("Buckets - {label}"));
    push_line(&mut out, format!("{:<12} {:>6} {:>8} {:>8}", "bucket", "n", "mean", "median"));
    for b in buckets {
        push_line(
            &mut out,
            format!(
                "{:<12} {:>6} {:>8.1} {:>8.1}",
                b.key.to_string(),
                b.count,
                b.mean,
                b.median
            ),
        );
    }
    if buckets.is_empty() {
        push_line(&mut out, "no data".to_string());
    }
    out
}

/// Trend table: raw value and trailing average per day.
pub fn format_trend(label: &str, window: usize, points: &[TrendPoint]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{window}-day moving average - {label}\n"));
    push_line(&mut out, format!("{:<12} {:>8} {:>8}", "date", "value", "avg"));
    push_line(&mut out, format!("{:-<12} {:->8} {:->8}", "", "", ""));
    for p in points {
        push_line(
            &mut out,
            format!("{:<12} {:>8} {:>8}", p.date, fmt_opt(Some(p.value)), fmt_opt(p.average)),
        );
    }
    out
}

/// Year-over-year comparison table.
pub fn format_seasonal(label: &str, year: i32, history: YearRange, rows: &[SeasonalRow]) -> String {
    let mut out = String::new();
    out.push_str(&format!("Seasonal comparison {year} - {label}\n"));
    push_line(
        &mut out,
        format!(
            "{:<5} {:>8} {:>8} {:>14}",
            "month",
            year,
            year - 1,
            format!("median {history}")
        ),
    );
    push_line(&mut out, format!("{:-<5} {:->8} {:->8} {:->14}", "", "", "", ""));
    for row in rows {
        let month = MONTHS
            .get(row.month as usize - 1)
            .copied()
            .unwrap_or("?");
        push_line(
            &mut out,
            format!(
                "{:<5} {:>8} {:>8} {:>14}",
                month,
                fmt_opt(row.current),
                fmt_opt(row.previous),
                fmt_opt(row.historical_median)
            ),
        );
    }
    out
}

/// Weekly PM2.5 × cases table with correlation footer.
pub fn format_health(label: &str, view: &HealthView) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Weekly PM2.5 vs {} cases {} - {label}\n",
        view.category, view.year
    ));
    for province in &view.unavailable {
        out.push_str(&format!("health data not available for {province}\n"));
    }
    if view.rows.is_empty() {
        out.push_str("(no data)\n");
        return out;
    }

    push_line(&mut out, format!("{:>4} {:>8} {:>8}", "week", "pm25", "cases"));
    push_line(&mut out, format!("{:->4} {:->8} {:->8}", "", "", ""));
    for row in &view.rows {
        let cases = row
            .case_count
            .map_or_else(|| "-".to_string(), |c| c.to_string());
        push_line(
            &mut out,
            format!("{:>4} {:>8} {:>8}", row.week, fmt_opt(row.pm25_avg), cases),
        );
    }

    match view.correlation {
        Some(c) => out.push_str(&format!("\nPearson r = {:.3} (n = {} weeks)\n", c.r, c.n)),
        None => out.push_str("\nPearson r: not enough paired weeks\n"),
    }
    out
}

/// Client-side Pearson r for the selection, shown next to the backend's.
pub fn format_local_correlation(label: &str, view: &HealthView) -> String {
    let mut out = format!("Local check ({label}, {} {}): ", view.category, view.year);
    match view.correlation {
        Some(c) => out.push_str(&format!("Pearson r = {:.3} over {} weeks\n", c.r, c.n)),
        None => out.push_str("not enough paired weeks\n"),
    }
    if !view.unavailable.is_empty() {
        out.push_str(&format!("health data not available for {}\n", view.unavailable.join(", ")));
    }
    out
}

/// Backend analysis payload.
pub fn format_analysis(data: &AnalysisData) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "=== Analysis computed at {}{} ===\n",
        data.computed_at,
        if data.cached { " (cached)" } else { "" }
    ));

    out.push_str("\nCorrelations:\n");
    push_line(
        &mut out,
        format!(
            "{:<16} {:>7} {:>17} {:>10} {:>6} {:>4}",
            "disease", "r", "95% CI", "p", "r²", "n"
        ),
    );
    for c in &data.correlations {
        push_line(
            &mut out,
            format!(
                "{} {:>7.3} {:>17} {:>10.4} {:>6.3} {:>4}",
                pad(&truncate(&c.disease, 16), 16),
                c.r,
                format!("[{:.3}, {:.3}]", c.ci_lower, c.ci_upper),
                c.p_value,
                c.r_squared,
                c.n
            ),
        );
    }

    out.push_str("\nLag analysis:\n");
    for lag in &data.lag_analysis {
        let parts: Vec<String> = lag
            .correlations
            .iter()
            .map(|p| format!("{}w:{:.3}", p.lag, p.r))
            .collect();
        out.push_str(&format!(
            "- {}: optimal lag {}w (r={:.3}) [{}]\n",
            lag.disease,
            lag.optimal_lag,
            lag.optimal_r,
            parts.join(", ")
        ));
    }

    out.push_str("\nForecasts:\n");
    for f in &data.forecasts {
        let parts: Vec<String> = f
            .forecast
            .iter()
            .map(|p| format!("w{} {:.1} [{:.1}, {:.1}]", p.week, p.value, p.ci_lower, p.ci_upper))
            .collect();
        out.push_str(&format!("- {}: {}\n", f.target, parts.join("; ")));
    }

    let thresholds = &data.threshold_analysis;
    if !thresholds.thresholds.is_empty() {
        out.push_str("\nAverage cases by PM2.5 level:\n");
        for (category, values) in &thresholds.avg_cases {
            let parts: Vec<String> = thresholds
                .thresholds
                .iter()
                .zip(values)
                .map(|(t, v)| format!("{t}: {v:.1}"))
                .collect();
            out.push_str(&format!("- {category}: {}\n", parts.join(" | ")));
        }
    }
    out
}

fn push_line(out: &mut String, line: String) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.1}"),
        _ => "-".to_string(),
    }
}

/// Left-align to `width` display characters (`format!` pads by bytes for non-ASCII).
fn pad(s: &str, width: usize) -> String {
    let len = s.chars().count();
    let mut out = s.to_string();
    out.extend(std::iter::repeat_n(' ', width.saturating_sub(len)));
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
