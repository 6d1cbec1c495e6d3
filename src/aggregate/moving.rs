//! Trailing simple moving average.

use crate::domain::{Reading, TrendPoint};

/// Trailing mean over the `window` most recent readings, by index position.
///
/// The series is re-sorted ascending by date first (stable, so equal dates
/// keep their input order); readings with malformed dates are dropped. Gaps
/// in the calendar are not interpolated, so a 7-point window may span more
/// than 7 days. The first `window - 1` points have no average. A window of 0
/// or one longer than the series yields no averages at all.
pub fn moving_average(series: &[Reading], window: usize) -> Vec<TrendPoint> {
    let mut dated: Vec<_> = series
        .iter()
        .filter_map(|r| r.parsed_date().map(|d| (d, r)))
        .collect();
    dated.sort_by_key(|(d, _)| *d);

    let values: Vec<f64> = dated.iter().map(|(_, r)| r.value).collect();

    dated
        .iter()
        .enumerate()
        .map(|(i, (_, reading))| TrendPoint {
            date: reading.date.clone(),
            value: reading.value,
            average: window_mean(&values, i, window),
        })
        .collect()
}

/// Mean of `values[i + 1 - window ..= i]`, summed left to right.
fn window_mean(values: &[f64], i: usize, window: usize) -> Option<f64> {
    if window == 0 || i + 1 < window {
        return None;
    }
    let slice = &values[i + 1 - window..=i];
    Some(slice.iter().sum::<f64>() / window as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn daily(values: &[f64]) -> Vec<Reading> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| Reading::new(format!("2025-01-{:02}", i + 1), v))
            .collect()
    }

    #[test]
    fn seven_day_window_on_seven_points() {
        let series = daily(&[10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0]);
        let averages: Vec<Option<f64>> = moving_average(&series, 7)
            .into_iter()
            .map(|p| p.average)
            .collect();
        assert_eq!(
            averages,
            vec![None, None, None, None, None, None, Some(40.0)]
        );
    }

    #[test]
    fn unsorted_input_is_sorted_by_date() {
        let series = vec![
            Reading::new("2025-01-03", 30.0),
            Reading::new("2025-01-01", 10.0),
            Reading::new("2025-01-02", 20.0),
        ];
        let points = moving_average(&series, 2);
        let dates: Vec<&str> = points.iter().map(|p| p.date.as_str()).collect();
        assert_eq!(dates, vec!["2025-01-01", "2025-01-02", "2025-01-03"]);
        assert_eq!(points[1].average, Some(15.0));
        assert_eq!(points[2].average, Some(25.0));
    }

    #[test]
    fn window_counts_positions_not_calendar_days() {
        let series = vec![
            Reading::new("2025-01-01", 10.0),
            Reading::new("2025-01-10", 20.0),
            Reading::new("2025-02-01", 30.0),
        ];
        let points = moving_average(&series, 3);
        assert_eq!(points[2].average, Some(20.0));
    }

    #[test]
    fn oversized_and_zero_windows_yield_no_averages() {
        let series = daily(&[1.0, 2.0, 3.0]);
        assert!(moving_average(&series, 30).iter().all(|p| p.average.is_none()));
        assert!(moving_average(&series, 0).iter().all(|p| p.average.is_none()));
        assert!(moving_average(&[], 7).is_empty());
    }

    #[test]
    fn matches_naive_definition_bit_for_bit() {
        let raw: Vec<f64> = (0..60).map(|i| (i as f64 * 0.37).sin() * 40.0 + 41.3).collect();
        let series = daily_long(&raw);
        let window = 15;
        for (i, point) in moving_average(&series, window).iter().enumerate() {
            if i + 1 < window {
                assert_eq!(point.average, None);
                continue;
            }
            let mut sum = 0.0;
            for v in &raw[i + 1 - window..=i] {
                sum += v;
            }
            assert_eq!(point.average.map(f64::to_bits), Some((sum / window as f64).to_bits()));
        }
        assert_eq!(moving_average(&series, window), moving_average(&series, window));
    }

    fn daily_long(values: &[f64]) -> Vec<Reading> {
        let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        values
            .iter()
            .zip(start.iter_days())
            .map(|(&v, d)| Reading::new(d.format("%Y-%m-%d").to_string(), v))
            .collect()
    }

    #[test]
    fn malformed_dates_do_not_occupy_window_slots() {
        let series = vec![
            Reading::new("2025-01-01", 10.0),
            Reading::new("not-a-date", 1000.0),
            Reading::new("2025-01-02", 20.0),
            Reading::new("", 1000.0),
        ];
        let points = moving_average(&series, 2);
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].date, "2025-01-02");
        assert_eq!(points[1].average, Some(15.0));
    }
}
