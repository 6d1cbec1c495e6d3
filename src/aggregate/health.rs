//! Weekly alignment of PM2.5 with health-case counts.
//!
//! PM2.5 readings are averaged per ISO week of the selected ISO week-year and
//! joined against a 53-slot vector of case counts. The join is sparse: a week
//! appears only when at least one side has data.

use crate::aggregate::temporal::iso_week_means;
use crate::domain::{Correlation, ISO_WEEKS, Reading, WeeklyCases, WeeklyJoinRow};

/// Join weekly PM2.5 averages with weekly case counts for `year`.
///
/// `cases = None` means the health dataset (or this province/year) is not
/// available; PM2.5 rows are still emitted with `case_count = None`.
pub fn align_weekly(
    series: &[Reading],
    year: i32,
    cases: Option<&WeeklyCases>,
) -> Vec<WeeklyJoinRow> {
    let pm25 = iso_week_means(series, year);

    (1..=ISO_WEEKS as u32)
        .filter_map(|week| {
            let pm25_avg = pm25.get(&week).copied();
            let case_count = cases
                .and_then(|c| c.week(week))
                .map(|count| count.round().max(0.0) as u64);
            if pm25_avg.is_none() && case_count.is_none() {
                return None;
            }
            Some(WeeklyJoinRow {
                week,
                pm25_avg,
                case_count,
            })
        })
        .collect()
}

/// Pearson correlation between PM2.5 and case counts over weeks where both exist.
///
/// Returns `None` for fewer than 3 pairs or when either side is constant.
pub fn pearson(rows: &[WeeklyJoinRow]) -> Option<Correlation> {
    let pairs: Vec<(f64, f64)> = rows
        .iter()
        .filter_map(|row| Some((row.pm25_avg?, row.case_count? as f64)))
        .collect();
    let n = pairs.len();
    if n < 3 {
        return None;
    }

    let nf = n as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / nf;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / nf;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }
    let r = (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0);
    Some(Correlation { r, n })
}
