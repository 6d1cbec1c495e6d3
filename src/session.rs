//! Presentation-layer session: the datasets currently held, the user's
//! selection, and memoized derived views.
//!
//! Every view is a pure function of `(datasets, selection)`. The memo cells
//! only skip recomputation when the exact same key is requested again, so
//! results are identical whether or not a cell was hit.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::aggregate;
use crate::data::{AnalysisData, ComputeClient, HealthDataset, Pm25Dataset};
use crate::domain::{
    BucketSummary, CaseCategory, Correlation, DailyGrid, Granularity, MonthlyMatrix, SeasonalRow,
    Series, SeriesSelector, TrendPoint, WeekStart, WeeklyJoinRow, WindowSize, YearRange,
};
use crate::error::AppError;

/// Single-entry cache keyed on the full input key.
#[derive(Debug)]
pub struct Memo<K, V> {
    entry: Option<(K, V)>,
    computes: usize,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self {
            entry: None,
            computes: 0,
        }
    }
}

impl<K: PartialEq, V: Clone> Memo<K, V> {
    pub fn get_or_compute(&mut self, key: K, compute: impl FnOnce() -> V) -> V {
        match self.get_or_try_compute::<std::convert::Infallible>(key, || Ok(compute())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Like `get_or_compute`, but errors are returned and not cached.
    pub fn get_or_try_compute<E>(
        &mut self,
        key: K,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some((cached_key, value)) = &self.entry {
            if *cached_key == key {
                return Ok(value.clone());
            }
        }
        let value = compute()?;
        self.computes += 1;
        self.entry = Some((key, value.clone()));
        Ok(value)
    }

    /// How many times the cell actually ran its computation.
    pub fn computes(&self) -> usize {
        self.computes
    }
}

/// What the user is currently looking at.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub series: SeriesSelector,
    pub year: i32,
    pub window: WindowSize,
    pub week_start: WeekStart,
    pub history_years: u32,
    pub category: CaseCategory,
}

impl Selection {
    pub fn new(series: SeriesSelector, year: i32) -> Self {
        Self {
            series,
            year,
            window: WindowSize::D7,
            week_start: WeekStart::Sunday,
            history_years: 5,
            category: CaseCategory::Total,
        }
    }
}

/// Weekly PM2.5 × health-case join for the selected provinces.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthView {
    pub year: i32,
    pub category: String,
    pub provinces: Vec<String>,
    /// Provinces with no health data for this year (or no dataset at all).
    pub unavailable: Vec<String>,
    pub rows: Vec<WeeklyJoinRow>,
    pub correlation: Option<Correlation>,
}

pub struct Session {
    pm25: Pm25Dataset,
    health: Option<HealthDataset>,
    selection: Selection,
    analysis: Option<AnalysisData>,

    series: Memo<SeriesSelector, Arc<Series>>,
    buckets: Memo<(SeriesSelector, Granularity), Vec<BucketSummary>>,
    monthly: Memo<SeriesSelector, MonthlyMatrix>,
    daily: Memo<(SeriesSelector, i32, WeekStart), DailyGrid>,
    trend: Memo<(SeriesSelector, WindowSize), Vec<TrendPoint>>,
    seasonal: Memo<(SeriesSelector, i32, u32), Vec<SeasonalRow>>,
    health_view: Memo<(SeriesSelector, i32, CaseCategory), HealthView>,
}

impl Session {
    pub fn new(pm25: Pm25Dataset, health: Option<HealthDataset>, selection: Selection) -> Self {
        Self {
            pm25,
            health,
            selection,
            analysis: None,
            series: Memo::default(),
            buckets: Memo::default(),
            monthly: Memo::default(),
            daily: Memo::default(),
            trend: Memo::default(),
            seasonal: Memo::default(),
            health_view: Memo::default(),
        }
    }

    pub fn pm25(&self) -> &Pm25Dataset {
        &self.pm25
    }

    pub fn health(&self) -> Option<&HealthDataset> {
        self.health.as_ref()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn select_series(&mut self, series: SeriesSelector) {
        self.selection.series = series;
    }

    pub fn set_year(&mut self, year: i32) {
        self.selection.year = year;
    }

    pub fn set_window(&mut self, window: WindowSize) {
        self.selection.window = window;
    }

    pub fn set_week_start(&mut self, week_start: WeekStart) {
        self.selection.week_start = week_start;
    }

    pub fn set_history_years(&mut self, years: u32) {
        self.selection.history_years = years;
    }

    pub fn set_category(&mut self, category: CaseCategory) {
        self.selection.category = category;
    }

    /// Store a backend response. Whichever response arrives last is kept.
    pub fn record_analysis(&mut self, data: AnalysisData) -> &AnalysisData {
        self.analysis.insert(data)
    }

    /// Ask the backend to analyse the selected year and keep the response.
    ///
    /// A failed request leaves the previous response in place.
    pub fn request_analysis(
        &mut self,
        backend: &ComputeClient,
        force: bool,
    ) -> Result<&AnalysisData, AppError> {
        let data = backend.compute(self.selection.year, force)?;
        Ok(self.record_analysis(data))
    }

    pub fn analysis(&self) -> Option<&AnalysisData> {
        self.analysis.as_ref()
    }

    /// Readings of the current selection.
    pub fn series(&mut self) -> Result<Arc<Series>, AppError> {
        let key = self.selection.series.clone();
        let pm25 = &self.pm25;
        self.series
            .get_or_try_compute(key.clone(), || pm25.select(&key).map(Arc::new))
    }

    /// Latest calendar year with data in the current selection.
    pub fn latest_year(&mut self) -> Result<Option<i32>, AppError> {
        let series = self.series()?;
        Ok(Pm25Dataset::years(&series).last().copied())
    }

    pub fn buckets(&mut self, granularity: Granularity) -> Result<Vec<BucketSummary>, AppError> {
        let series = self.series()?;
        let key = (self.selection.series.clone(), granularity);
        Ok(self
            .buckets
            .get_or_compute(key, || aggregate::aggregate(&series, granularity)))
    }

    pub fn monthly(&mut self) -> Result<MonthlyMatrix, AppError> {
        let series = self.series()?;
        let key = self.selection.series.clone();
        Ok(self
            .monthly
            .get_or_compute(key, || aggregate::monthly_matrix(&series)))
    }

    pub fn daily(&mut self) -> Result<DailyGrid, AppError> {
        let series = self.series()?;
        let Selection { year, week_start, .. } = self.selection;
        let key = (self.selection.series.clone(), year, week_start);
        Ok(self
            .daily
            .get_or_compute(key, || aggregate::daily_grid(&series, year, week_start)))
    }

    pub fn trend(&mut self) -> Result<Vec<TrendPoint>, AppError> {
        let series = self.series()?;
        let window = self.selection.window;
        let key = (self.selection.series.clone(), window);
        Ok(self
            .trend
            .get_or_compute(key, || aggregate::moving_average(&series, window.days())))
    }

    pub fn seasonal(&mut self) -> Result<Vec<SeasonalRow>, AppError> {
        let series = self.series()?;
        let Selection {
            year, history_years, ..
        } = self.selection;
        let key = (self.selection.series.clone(), year, history_years);
        Ok(self.seasonal.get_or_compute(key, || {
            aggregate::seasonal_comparison(&series, year, YearRange::trailing(year, history_years))
        }))
    }

    pub fn health_view(&mut self) -> Result<HealthView, AppError> {
        let series = self.series()?;
        let year = self.selection.year;
        let category = self.selection.category.clone();
        let key = (self.selection.series.clone(), year, category.clone());
        let selector = self.selection.series.clone();
        let pm25 = &self.pm25;
        let health = self.health.as_ref();

        self.health_view.get_or_try_compute(key, || {
            let provinces = pm25.provinces_for(&selector)?;
            let (cases, unavailable) = match health {
                Some(ds) => ds.weekly_cases(&provinces, year, &category)?,
                None => (None, provinces.clone()),
            };
            debug!(
                %selector,
                year,
                %category,
                unavailable = unavailable.len(),
                "aligning weekly health data"
            );
            let rows = aggregate::align_weekly(&series, year, cases.as_ref());
            let correlation = aggregate::pearson(&rows);
            Ok(HealthView {
                year,
                category: category.to_string(),
                provinces,
                unavailable,
                rows,
                correlation,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Reading;

    fn pm25() -> Pm25Dataset {
        let mut ds = Pm25Dataset::default();
        ds.metadata.stations = vec!["a".into(), "b".into()];
        ds.metadata
            .station_provinces
            .insert("a".into(), "ชลบุรี".into());
        ds.data.insert(
            "a".into(),
            vec![
                Reading::new("2024-01-06", 10.0),
                Reading::new("2025-01-06", 20.0),
                Reading::new("2025-01-07", 40.0),
            ],
        );
        ds.data.insert("b".into(), vec![Reading::new("2025-02-01", 5.0)]);
        ds
    }

    #[test]
    fn memo_only_recomputes_on_key_change() {
        let mut memo: Memo<u32, u32> = Memo::default();
        assert_eq!(memo.get_or_compute(1, || 10), 10);
        assert_eq!(memo.get_or_compute(1, || 99), 10);
        assert_eq!(memo.computes(), 1);
        assert_eq!(memo.get_or_compute(2, || 20), 20);
        assert_eq!(memo.computes(), 2);
        assert_eq!(memo.get_or_compute(1, || 11), 11);
        assert_eq!(memo.computes(), 3);
    }

    #[test]
    fn memo_does_not_cache_errors() {
        let mut memo: Memo<u32, u32> = Memo::default();
        assert!(memo.get_or_try_compute(1, || Err::<u32, &str>("boom")).is_err());
        assert_eq!(memo.get_or_try_compute(1, || Ok::<u32, &str>(5)), Ok(5));
    }

    #[test]
    fn cached_views_match_fresh_computation() {
        let mut session = Session::new(pm25(), None, Selection::new(SeriesSelector::Station("a".into()), 2025));
        let first = session.monthly().unwrap();
        let again = session.monthly().unwrap();
        assert_eq!(first, again);
        assert_eq!(session.monthly.computes(), 1);

        let series = session.series().unwrap();
        assert_eq!(first, aggregate::monthly_matrix(&series));
    }

    #[test]
    fn buckets_are_keyed_on_granularity() {
        let mut session = Session::new(pm25(), None, Selection::new(SeriesSelector::Station("a".into()), 2025));
        let years = session.buckets(Granularity::Year).unwrap();
        assert_eq!(years.len(), 2);
        assert_eq!(years[1].mean, 30.0);

        let weeks = session.buckets(Granularity::IsoWeek).unwrap();
        assert_eq!(session.buckets.computes(), 2);
        // 2025-01-06 and 2025-01-07 share ISO week 2.
        assert_eq!(weeks.last().map(|b| b.count), Some(2));
    }

    #[test]
    fn selection_change_recomputes() {
        let mut session = Session::new(pm25(), None, Selection::new(SeriesSelector::Station("a".into()), 2025));
        let a = session.monthly().unwrap();
        session.select_series(SeriesSelector::Station("b".into()));
        let b = session.monthly().unwrap();
        assert_ne!(a, b);
        assert_eq!(b.years, vec![2025]);
        assert_eq!(session.latest_year().unwrap(), Some(2025));
    }

    #[test]
    fn health_view_without_dataset_reports_unavailable_provinces() {
        let mut session = Session::new(pm25(), None, Selection::new(SeriesSelector::Station("a".into()), 2025));
        let view = session.health_view().unwrap();
        assert_eq!(view.provinces, vec!["ชลบุรี".to_string()]);
        assert_eq!(view.unavailable, view.provinces);
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].pm25_avg, Some(30.0));
        assert_eq!(view.rows[0].case_count, None);
    }

    #[test]
    fn latest_analysis_response_wins() {
        let response = |at: &str| AnalysisData {
            correlations: Vec::new(),
            forecasts: Vec::new(),
            lag_analysis: Vec::new(),
            threshold_analysis: Default::default(),
            computed_at: at.to_string(),
            cached: false,
        };
        let mut session = Session::new(pm25(), None, Selection::new(SeriesSelector::All, 2025));
        assert!(session.analysis().is_none());
        session.record_analysis(response("2025-03-01T10:00:00"));
        let kept = session.record_analysis(response("2025-03-01T10:00:05"));
        assert_eq!(kept.computed_at, "2025-03-01T10:00:05");
        assert_eq!(session.analysis().unwrap().computed_at, "2025-03-01T10:00:05");
    }

    #[test]
    fn failed_request_keeps_previous_analysis() {
        let mut session = Session::new(pm25(), None, Selection::new(SeriesSelector::All, 2025));
        session.record_analysis(AnalysisData {
            correlations: Vec::new(),
            forecasts: Vec::new(),
            lag_analysis: Vec::new(),
            threshold_analysis: Default::default(),
            computed_at: "2025-03-01T10:00:00".to_string(),
            cached: true,
        });

        let backend = ComputeClient::new(reqwest::blocking::Client::new(), "http://127.0.0.1:9");
        let err = session.request_analysis(&backend, false).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_RUNTIME);
        assert_eq!(session.analysis().unwrap().computed_at, "2025-03-01T10:00:00");
    }

    #[test]
    fn unknown_station_surfaces_as_error() {
        let mut session = Session::new(pm25(), None, Selection::new(SeriesSelector::Station("zzz".into()), 2025));
        assert!(session.trend().is_err());
    }
}
