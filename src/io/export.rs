//! Export derived views to JSON or CSV.
//!
//! JSON exports are the serde representation of the view (missing values are
//! `null`). CSV is offered for the flat, row-shaped views.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::domain::{TrendPoint, WeeklyJoinRow};
use crate::error::AppError;

/// True when `path` has a `.csv` extension (case-insensitive).
pub fn wants_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

/// Write any serializable view as pretty JSON.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), AppError> {
    let file = create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .map_err(|e| AppError::runtime(format!("Failed to write JSON export: {e}")))?;
    info!(path = %path.display(), "wrote JSON export");
    Ok(())
}

/// Write the weekly join as `week,pm25_avg,case_count`.
pub fn write_weekly_csv(path: &Path, rows: &[WeeklyJoinRow]) -> Result<(), AppError> {
    let mut out = BufWriter::new(create(path)?);
    writeln!(out, "week,pm25_avg,case_count").map_err(write_err)?;
    for row in rows {
        writeln!(
            out,
            "{},{},{}",
            row.week,
            row.pm25_avg.map(|v| v.to_string()).unwrap_or_default(),
            row.case_count.map(|c| c.to_string()).unwrap_or_default(),
        )
        .map_err(write_err)?;
    }
    out.flush().map_err(write_err)?;
    info!(path = %path.display(), rows = rows.len(), "wrote CSV export");
    Ok(())
}

/// Write a trend line as `date,value,average`.
pub fn write_trend_csv(path: &Path, points: &[TrendPoint]) -> Result<(), AppError> {
    let mut out = BufWriter::new(create(path)?);
    writeln!(out, "date,value,average").map_err(write_err)?;
    for p in points {
        writeln!(
            out,
            "{},{},{}",
            p.date,
            p.value,
            p.average.map(|v| v.to_string()).unwrap_or_default(),
        )
        .map_err(write_err)?;
    }
    out.flush().map_err(write_err)?;
    info!(path = %path.display(), rows = points.len(), "wrote CSV export");
    Ok(())
}

fn create(path: &Path) -> Result<File, AppError> {
    File::create(path).map_err(|e| {
        AppError::runtime(format!("Failed to create export '{}': {e}", path.display()))
    })
}

fn write_err(e: std::io::Error) -> AppError {
    AppError::runtime(format!("Failed to write export: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekly_csv_leaves_missing_values_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weekly.csv");
        let rows = vec![
            WeeklyJoinRow { week: 1, pm25_avg: Some(30.5), case_count: None },
            WeeklyJoinRow { week: 2, pm25_avg: None, case_count: Some(7) },
        ];
        write_weekly_csv(&path, &rows).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "week,pm25_avg,case_count\n1,30.5,\n2,,7\n");
    }

    #[test]
    fn json_export_uses_camel_case_and_nulls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weekly.json");
        let rows = vec![WeeklyJoinRow { week: 4, pm25_avg: Some(12.0), case_count: None }];
        write_json(&path, &rows).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["pm25Avg"], 12.0);
        assert!(value[0]["caseCount"].is_null());
    }

    #[test]
    fn csv_detection_by_extension() {
        assert!(wants_csv(Path::new("out/TREND.CSV")));
        assert!(!wants_csv(Path::new("out/trend.json")));
        assert!(!wants_csv(Path::new("out/trend")));
    }
}
