//! Year-over-year monthly comparison.

use chrono::Datelike;

use crate::aggregate::stats;
use crate::domain::{Reading, SeasonalRow, YearRange};

/// Twelve rows (January first) comparing one year against the previous year
/// and a historical median.
///
/// For each calendar month:
/// - `current`: mean of the values in `current_year`
/// - `previous`: mean of the values in `current_year - 1`
/// - `historical_median`: median of every value in that month across `history`
///
/// A partition without values is `None`. All twelve rows are always present.
pub fn seasonal_comparison(
    series: &[Reading],
    current_year: i32,
    history: YearRange,
) -> Vec<SeasonalRow> {
    let mut current: [Vec<f64>; 12] = Default::default();
    let mut previous: [Vec<f64>; 12] = Default::default();
    let mut historical: [Vec<f64>; 12] = Default::default();

    for reading in series {
        let Some(date) = reading.parsed_date() else {
            continue;
        };
        let year = date.year();
        let m = date.month0() as usize;
        if year == current_year {
            current[m].push(reading.value);
        }
        if year == current_year - 1 {
            previous[m].push(reading.value);
        }
        if history.contains(year) {
            historical[m].push(reading.value);
        }
    }

    (0..12)
        .map(|m| SeasonalRow {
            month: m as u32 + 1,
            current: stats::mean(&current[m]),
            previous: stats::mean(&previous[m]),
            historical_median: stats::median(&historical[m]),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_still_has_twelve_rows() {
        let rows = seasonal_comparison(&[], 2025, YearRange::trailing(2025, 5));
        assert_eq!(rows.len(), 12);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.month, i as u32 + 1);
            assert_eq!(row.current, None);
            assert_eq!(row.previous, None);
            assert_eq!(row.historical_median, None);
        }
    }

    #[test]
    fn partitions_are_computed_independently() {
        let series = vec![
            Reading::new("2025-01-05", 40.0),
            Reading::new("2025-01-06", 60.0),
            Reading::new("2024-01-05", 30.0),
            Reading::new("2023-01-05", 10.0),
            Reading::new("2022-01-05", 20.0),
            Reading::new("2021-01-05", 30.0),
            Reading::new("2020-01-05", 40.0),
            Reading::new("2019-01-05", 1000.0),
            Reading::new("2024-07-01", 12.0),
        ];
        let rows = seasonal_comparison(&series, 2025, YearRange::trailing(2025, 5));

        assert_eq!(rows[0].current, Some(50.0));
        assert_eq!(rows[0].previous, Some(30.0));
        // 2020..=2024 January values: 10, 20, 30, 30, 40 (2019 excluded).
        assert_eq!(rows[0].historical_median, Some(30.0));

        assert_eq!(rows[6].current, None);
        assert_eq!(rows[6].previous, Some(12.0));
        assert_eq!(rows[6].historical_median, Some(12.0));
    }

    #[test]
    fn even_history_averages_middle_values() {
        let series = vec![
            Reading::new("2021-03-01", 10.0),
            Reading::new("2022-03-01", 20.0),
            Reading::new("2023-03-01", 30.0),
            Reading::new("2024-03-01", 40.0),
        ];
        let rows = seasonal_comparison(&series, 2025, YearRange::new(2021, 2024));
        assert_eq!(rows[2].historical_median, Some(25.0));
        assert_eq!(
            seasonal_comparison(&series, 2025, YearRange::new(2021, 2024)),
            rows
        );
    }

    #[test]
    fn malformed_dates_are_ignored() {
        let series = vec![
            Reading::new("2025-01-05", 40.0),
            Reading::new("2025-13-01", 500.0),
            Reading::new("January 2025", 500.0),
            Reading::new("2024-01-05", 30.0),
        ];
        let rows = seasonal_comparison(&series, 2025, YearRange::trailing(2025, 5));
        assert_eq!(rows.len(), 12);
        assert_eq!(rows[0].current, Some(40.0));
        assert_eq!(rows[0].previous, Some(30.0));
        assert_eq!(rows[0].historical_median, Some(30.0));
        assert!(rows[1..].iter().all(|row| row.current.is_none()));
    }

    #[test]
    fn huge_history_covers_every_earlier_year() {
        let series = vec![
            Reading::new("1990-04-01", 10.0),
            Reading::new("2024-04-01", 30.0),
        ];
        let rows = seasonal_comparison(&series, 2025, YearRange::trailing(2025, u32::MAX));
        assert_eq!(rows[3].historical_median, Some(20.0));
    }
}
