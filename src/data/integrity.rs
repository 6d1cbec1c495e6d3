//! Integrity report for a loaded PM2.5 dataset.
//!
//! Checks that the metadata agrees with the readings: station lists, the
//! declared date range, and that every station resolves to a province and a
//! health region.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::data::Pm25Dataset;
use crate::domain::{DATE_FORMAT, parse_date};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    pub listed_stations: usize,
    pub stations_with_data: usize,
    /// Codes with readings that the metadata station list leaves out.
    pub unlisted_stations: Vec<String>,
    pub declared_min_date: Option<String>,
    pub declared_max_date: Option<String>,
    pub observed_min_date: Option<String>,
    pub observed_max_date: Option<String>,
    pub data_points: usize,
    pub malformed_dates: usize,
    pub without_province: Vec<String>,
    pub without_region: Vec<String>,
    pub recent_from: Option<String>,
    pub stations_with_recent_data: usize,
}

impl IntegrityReport {
    /// Human-readable problems. Empty means the dataset looks consistent.
    pub fn warnings(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.stations_with_data == 0 {
            out.push("no station has any readings".to_string());
        }
        if !self.unlisted_stations.is_empty() {
            out.push(format!(
                "stations missing from metadata: {}",
                self.unlisted_stations.join(", ")
            ));
        }
        if self.malformed_dates > 0 {
            out.push(format!("{} readings have malformed dates", self.malformed_dates));
        }
        if self.declared_max_date.is_some()
            && self.observed_max_date.is_some()
            && self.declared_max_date != self.observed_max_date
        {
            out.push(format!(
                "metadata maxDate {} does not match latest reading {}",
                self.declared_max_date.as_deref().unwrap_or("-"),
                self.observed_max_date.as_deref().unwrap_or("-")
            ));
        }
        if !self.without_province.is_empty() {
            out.push(format!("stations without province: {}", self.without_province.join(", ")));
        }
        if !self.without_region.is_empty() {
            out.push(format!("stations without health region: {}", self.without_region.join(", ")));
        }
        if let Some(from) = &self.recent_from {
            if self.stations_with_recent_data == 0 {
                out.push(format!("no station has data since {from}"));
            }
        }
        out
    }
}

impl Pm25Dataset {
    /// Build the integrity report.
    ///
    /// `recent_from` defaults to January 1 of the latest observed year.
    pub fn integrity(&self, recent_from: Option<NaiveDate>) -> IntegrityReport {
        let mut data_points = 0;
        let mut malformed_dates = 0;
        let mut observed: Option<(NaiveDate, NaiveDate)> = None;
        let mut last_per_station = Vec::new();

        for readings in self.data.values() {
            let mut station_last: Option<NaiveDate> = None;
            for reading in readings {
                data_points += 1;
                let Some(date) = reading.parsed_date() else {
                    malformed_dates += 1;
                    continue;
                };
                observed = Some(match observed {
                    None => (date, date),
                    Some((lo, hi)) => (lo.min(date), hi.max(date)),
                });
                station_last = Some(station_last.map_or(date, |d| d.max(date)));
            }
            last_per_station.push(station_last);
        }

        let recent_from = recent_from.or_else(|| {
            observed.and_then(|(_, hi)| NaiveDate::from_ymd_opt(hi.year(), 1, 1))
        });
        let stations_with_recent_data = match recent_from {
            Some(from) => last_per_station
                .iter()
                .filter(|last| last.is_some_and(|d| d >= from))
                .count(),
            None => 0,
        };

        let codes = self.station_codes();
        let fmt = |d: NaiveDate| d.format(DATE_FORMAT).to_string();

        IntegrityReport {
            listed_stations: self.metadata.stations.len(),
            stations_with_data: self.data.values().filter(|r| !r.is_empty()).count(),
            unlisted_stations: self
                .data
                .keys()
                .filter(|code| !self.metadata.stations.contains(code))
                .cloned()
                .collect(),
            declared_min_date: normalize(self.metadata.min_date.as_deref()),
            declared_max_date: normalize(self.metadata.max_date.as_deref()),
            observed_min_date: observed.map(|(lo, _)| fmt(lo)),
            observed_max_date: observed.map(|(_, hi)| fmt(hi)),
            data_points,
            malformed_dates,
            without_province: codes
                .iter()
                .filter(|code| self.province_of(code).is_none())
                .map(|code| code.to_string())
                .collect(),
            without_region: codes
                .iter()
                .filter(|code| self.region_of(code).is_none())
                .map(|code| code.to_string())
                .collect(),
            recent_from: recent_from.map(fmt),
            stations_with_recent_data,
        }
    }
}

/// Canonical `YYYY-MM-DD`, or the raw text when it does not parse.
fn normalize(raw: Option<&str>) -> Option<String> {
    raw.map(|s| parse_date(s).map_or_else(|| s.to_string(), |d| d.format(DATE_FORMAT).to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Pm25Dataset {
        serde_json::from_str(
            r#"{
                "metadata": {
                    "minDate": "2024-01-01",
                    "maxDate": "2025-03-01",
                    "stations": ["100t", "60t", "87t"],
                    "stationProvinces": {"100t": "จันทบุรี", "60t": "จันทบุรี", "87t": "ตราด"},
                    "stationRegions": {"100t": "เขตสุขภาพที่ 6"}
                },
                "data": {
                    "100t": [{"date": "2024-01-01", "value": 10.0}, {"date": "2025-03-01", "value": 20.0}],
                    "60t": [{"date": "2024-06-01", "value": 30.0}, {"date": "bad", "value": 1.0}],
                    "87t": [],
                    "32t": [{"date": "2025-01-15", "value": 40.0}]
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn counts_points_dates_and_recent_stations() {
        let report = dataset().integrity(None);
        assert_eq!(report.listed_stations, 3);
        assert_eq!(report.stations_with_data, 3);
        assert_eq!(report.data_points, 5);
        assert_eq!(report.malformed_dates, 1);
        assert_eq!(report.observed_min_date.as_deref(), Some("2024-01-01"));
        assert_eq!(report.observed_max_date.as_deref(), Some("2025-03-01"));
        assert_eq!(report.recent_from.as_deref(), Some("2025-01-01"));
        // 100t and 32t have 2025 readings; 60t stops in 2024.
        assert_eq!(report.stations_with_recent_data, 2);
    }

    #[test]
    fn flags_metadata_gaps() {
        let report = dataset().integrity(None);
        assert_eq!(report.unlisted_stations, vec!["32t".to_string()]);
        assert_eq!(report.without_province, vec!["32t".to_string()]);
        // 60t and 87t resolve through the province table.
        assert_eq!(report.without_region, vec!["32t".to_string()]);

        let warnings = report.warnings();
        assert!(warnings.iter().any(|w| w.contains("missing from metadata: 32t")));
        assert!(warnings.iter().any(|w| w.contains("1 readings have malformed dates")));
        assert!(!warnings.iter().any(|w| w.contains("maxDate")));
    }

    #[test]
    fn explicit_cutoff_can_exclude_everything() {
        let cutoff = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let report = dataset().integrity(Some(cutoff));
        assert_eq!(report.stations_with_recent_data, 0);
        assert!(report.warnings().iter().any(|w| w.contains("since 2026-01-01")));
    }

    #[test]
    fn empty_dataset_reports_without_panicking() {
        let report = Pm25Dataset::default().integrity(None);
        assert_eq!(report.data_points, 0);
        assert_eq!(report.recent_from, None);
        assert!(report.warnings().iter().any(|w| w.contains("no station has any readings")));
    }
}
