//! Calendar bucketing of daily readings.
//!
//! Everything here is a pure function over a borrowed series. Readings whose
//! date does not parse are skipped: they are neither counted nor reported.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use tracing::debug;

use crate::aggregate::stats;
use crate::domain::{
    AggregateStat, BucketKey, BucketSummary, DATE_FORMAT, DailyGrid, DayCell, Granularity,
    MonthlyMatrix, MonthlyRow, Reading, WeekStart,
};

/// Group readings by `granularity` and summarize each bucket.
///
/// Buckets come back in chronological order. Empty input gives an empty vector.
pub fn aggregate(series: &[Reading], granularity: Granularity) -> Vec<BucketSummary> {
    let mut buckets: BTreeMap<BucketKey, Vec<f64>> = BTreeMap::new();
    for reading in series {
        let Some(date) = reading.parsed_date() else {
            continue;
        };
        buckets
            .entry(BucketKey::for_date(date, granularity))
            .or_default()
            .push(reading.value);
    }

    buckets
        .into_iter()
        .filter_map(|(key, values)| {
            let mut stat = AggregateStat::default();
            for &v in &values {
                stat.push(v);
            }
            Some(BucketSummary {
                key,
                count: stat.count,
                mean: stat.mean()?,
                median: stats::median(&values)?,
            })
        })
        .collect()
}

/// Year × month matrix of monthly means.
///
/// Years are the distinct years present in the input, ascending. Each row has
/// twelve slots (January first); months without readings are `None`.
pub fn monthly_matrix(series: &[Reading]) -> MonthlyMatrix {
    let mut cells: BTreeMap<(i32, u32), AggregateStat> = BTreeMap::new();
    let mut years = BTreeSet::new();

    for reading in series {
        let Some(date) = reading.parsed_date() else {
            continue;
        };
        let BucketKey::Month { year, month0 } = BucketKey::for_date(date, Granularity::Month) else {
            continue;
        };
        years.insert(year);
        cells.entry((year, month0)).or_default().push(reading.value);
    }

    let years: Vec<i32> = years.into_iter().collect();
    let rows = years
        .iter()
        .map(|&year| {
            let mut months = [None; 12];
            for (month0, slot) in months.iter_mut().enumerate() {
                *slot = cells
                    .get(&(year, month0 as u32))
                    .and_then(AggregateStat::mean);
            }
            MonthlyRow { year, months }
        })
        .collect();

    MonthlyMatrix { years, rows }
}

/// Every day of `year`, left-joined with the readings by exact date string.
///
/// Days without a reading have `value = None`. When a date occurs more than
/// once, the first reading wins. `padding` is the number of empty cells that
/// precede January 1 in a 7-row grid starting on `week_start`.
pub fn daily_grid(series: &[Reading], year: i32, week_start: WeekStart) -> DailyGrid {
    let (Some(first), Some(last)) = (
        NaiveDate::from_ymd_opt(year, 1, 1),
        NaiveDate::from_ymd_opt(year, 12, 31),
    ) else {
        return DailyGrid::empty(year, week_start);
    };

    let mut by_date: HashMap<&str, f64> = HashMap::with_capacity(series.len());
    for reading in series {
        by_date.entry(reading.date.as_str()).or_insert(reading.value);
    }

    let cells: Vec<DayCell> = first
        .iter_days()
        .take_while(|d| *d <= last)
        .map(|date| {
            let key = date.format(DATE_FORMAT).to_string();
            DayCell {
                date,
                value: by_date.get(key.as_str()).copied(),
            }
        })
        .collect();

    let padding = week_start.row_of(first) as usize;
    let columns = (padding + cells.len()).div_ceil(7);
    debug!(year, padding, columns, days = cells.len(), "built daily grid");

    DailyGrid {
        year,
        week_start,
        padding,
        cells,
        columns,
    }
}

/// Mean PM2.5 per ISO week for readings whose ISO week-year is `year`.
///
/// Days near New Year belong to the ISO week-year, not the calendar year:
/// 2024-12-30 counts as week 1 of 2025.
pub fn iso_week_means(series: &[Reading], year: i32) -> BTreeMap<u32, f64> {
    let mut weeks: BTreeMap<u32, AggregateStat> = BTreeMap::new();
    for reading in series {
        let Some(date) = reading.parsed_date() else {
            continue;
        };
        if let BucketKey::IsoWeek { year: week_year, week } =
            BucketKey::for_date(date, Granularity::IsoWeek)
        {
            if week_year == year {
                weeks.entry(week).or_default().push(reading.value);
            }
        }
    }

    weeks
        .into_iter()
        .filter_map(|(week, stat)| stat.mean().map(|m| (week, m)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(date: &str, value: f64) -> Reading {
        Reading::new(date, value)
    }

    #[test]
    fn month_mean_uses_only_values_in_that_month() {
        let series = vec![
            r("2024-01-01", 10.0),
            r("2024-01-31", 20.0),
            r("2024-02-01", 100.0),
            r("2025-01-15", 40.0),
        ];
        let matrix = monthly_matrix(&series);
        assert_eq!(matrix.years, vec![2024, 2025]);
        assert_eq!(matrix.rows[0].months[0], Some(15.0));
        assert_eq!(matrix.rows[0].months[1], Some(100.0));
        assert_eq!(matrix.rows[0].months[2], None);
        assert_eq!(matrix.rows[1].months[0], Some(40.0));
    }

    #[test]
    fn monthly_matrix_keeps_full_precision() {
        let series = vec![r("2024-03-01", 1.0), r("2024-03-02", 2.0), r("2024-03-03", 2.0)];
        let matrix = monthly_matrix(&series);
        assert_eq!(matrix.rows[0].months[2], Some(5.0 / 3.0));
    }

    #[test]
    fn malformed_dates_are_skipped() {
        let series = vec![
            r("2024-01-01", 10.0),
            r("not-a-date", 1000.0),
            r("2024-13-01", 1000.0),
        ];
        let matrix = monthly_matrix(&series);
        assert_eq!(matrix.years, vec![2024]);
        assert_eq!(matrix.rows[0].months[0], Some(10.0));

        let buckets = aggregate(&series, Granularity::Year);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].count, 1);
    }

    #[test]
    fn empty_input_yields_placeholders() {
        assert_eq!(monthly_matrix(&[]), MonthlyMatrix::default());
        assert!(aggregate(&[], Granularity::Month).is_empty());
        assert!(iso_week_means(&[], 2025).is_empty());
    }

    #[test]
    fn aggregate_reports_mean_and_median_per_bucket() {
        let series = vec![
            r("2025-01-06", 10.0),
            r("2025-01-07", 20.0),
            r("2025-01-08", 60.0),
            r("2025-01-13", 5.0),
        ];
        let weeks = aggregate(&series, Granularity::IsoWeek);
        assert_eq!(weeks.len(), 2);
        assert_eq!(weeks[0].key, BucketKey::IsoWeek { year: 2025, week: 2 });
        assert_eq!(weeks[0].count, 3);
        assert_eq!(weeks[0].mean, 30.0);
        assert_eq!(weeks[0].median, 20.0);
        assert_eq!(weeks[1].key, BucketKey::IsoWeek { year: 2025, week: 3 });
    }

    #[test]
    fn daily_grid_pads_wednesday_start_with_three_cells() {
        // 2025-01-01 is a Wednesday.
        let grid = daily_grid(&[], 2025, WeekStart::Sunday);
        assert_eq!(grid.padding, 3);
        assert_eq!(grid.cells.len(), 365);
        assert_eq!(grid.columns, (3 + 365usize).div_ceil(7));

        let monday_grid = daily_grid(&[], 2025, WeekStart::Monday);
        assert_eq!(monday_grid.padding, 2);
    }

    #[test]
    fn daily_grid_left_joins_by_date_string() {
        let series = vec![
            r("2024-02-29", 42.0),
            r("2024-02-29", 99.0),
            r("2023-12-31", 7.0),
        ];
        let grid = daily_grid(&series, 2024, WeekStart::Sunday);
        assert_eq!(grid.cells.len(), 366);
        let leap = grid
            .cells
            .iter()
            .find(|c| c.date == NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
            .unwrap();
        assert_eq!(leap.value, Some(42.0));
        assert_eq!(grid.cells.iter().filter(|c| c.value.is_some()).count(), 1);
        // 2024-01-01 is a Monday.
        assert_eq!(grid.padding, 1);
        assert!(grid.cell_at(0, 0).is_none());
        assert_eq!(grid.cell_at(1, 0).map(|c| c.date), NaiveDate::from_ymd_opt(2024, 1, 1));
    }

    #[test]
    fn iso_week_means_follow_week_year() {
        let series = vec![
            r("2024-12-30", 30.0), // ISO 2025-W01
            r("2025-01-01", 10.0), // ISO 2025-W01
            r("2024-12-29", 99.0), // ISO 2024-W52
            r("2027-01-01", 50.0), // ISO 2026-W53
        ];
        let weeks = iso_week_means(&series, 2025);
        assert_eq!(weeks.len(), 1);
        assert_eq!(weeks.get(&1), Some(&20.0));

        let weeks_2026 = iso_week_means(&series, 2026);
        assert_eq!(weeks_2026.get(&53), Some(&50.0));
    }

    #[test]
    fn aggregation_is_idempotent() {
        let series = vec![r("2024-01-01", 10.1), r("2024-01-02", 20.7), r("2024-05-02", 3.3)];
        assert_eq!(monthly_matrix(&series), monthly_matrix(&series));
        assert_eq!(
            daily_grid(&series, 2024, WeekStart::Sunday),
            daily_grid(&series, 2024, WeekStart::Sunday)
        );
        assert_eq!(aggregate(&series, Granularity::Day), aggregate(&series, Granularity::Day));
    }

    #[test]
    fn duplicate_dates_are_all_counted() {
        let series = vec![r("2024-03-01", 10.0), r("2024-03-01", 30.0), r("2024-03-02", 50.0)];

        let days = aggregate(&series, Granularity::Day);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].count, 2);
        assert_eq!(days[0].mean, 20.0);

        let months = aggregate(&series, Granularity::Month);
        assert_eq!(months[0].count, 3);
        assert_eq!(months[0].mean, 30.0);
        assert_eq!(months[0].median, 30.0);
    }
}
