//! Consolidated PM2.5 dataset (`pm25_consolidated.json`).
//!
//! ```json
//! {
//!   "metadata": {"minDate": "...", "maxDate": "...", "stations": ["02t", ...],
//!                "stationNames": {...}, "stationProvinces": {...}, "stationRegions": {...}},
//!   "data": {"02t": [{"date": "2024-01-01", "value": 31.4}, ...]}
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::data::regions;
use crate::data::source::load_json;
use crate::domain::{AggregateStat, DATE_FORMAT, DataSource, Reading, Series, SeriesSelector};
use crate::error::AppError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pm25Metadata {
    #[serde(default)]
    pub min_date: Option<String>,
    #[serde(default)]
    pub max_date: Option<String>,
    #[serde(default)]
    pub stations: Vec<String>,
    #[serde(default)]
    pub station_names: BTreeMap<String, String>,
    #[serde(default)]
    pub station_provinces: BTreeMap<String, String>,
    #[serde(default)]
    pub station_regions: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pm25Dataset {
    pub metadata: Pm25Metadata,
    #[serde(default)]
    pub data: BTreeMap<String, Series>,
}

/// Display metadata for one station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationInfo {
    pub code: String,
    pub name: String,
    pub province: Option<String>,
    pub region: Option<String>,
    pub readings: usize,
}

impl Pm25Dataset {
    pub fn load(source: &DataSource, client: &Client) -> Result<Self, AppError> {
        let dataset: Self = load_json(source, client)?;
        info!(
            %source,
            stations = dataset.data.len(),
            min_date = dataset.metadata.min_date.as_deref().unwrap_or("-"),
            max_date = dataset.metadata.max_date.as_deref().unwrap_or("-"),
            "loaded PM2.5 dataset"
        );
        Ok(dataset)
    }

    /// Station codes: the metadata list, plus any code that only appears in `data`.
    pub fn station_codes(&self) -> Vec<&str> {
        let mut codes: BTreeSet<&str> = self.metadata.stations.iter().map(String::as_str).collect();
        codes.extend(self.data.keys().map(String::as_str));
        codes.into_iter().collect()
    }

    pub fn station_name<'a>(&'a self, code: &'a str) -> &'a str {
        self.metadata
            .station_names
            .get(code)
            .map(String::as_str)
            .unwrap_or(code)
    }

    pub fn province_of(&self, code: &str) -> Option<&str> {
        self.metadata.station_provinces.get(code).map(String::as_str)
    }

    /// Health region of a station. Stations without a stored region fall
    /// back to the fixed province table.
    pub fn region_of(&self, code: &str) -> Option<&str> {
        match self.metadata.station_regions.get(code) {
            Some(region) => Some(region.as_str()),
            None => self.province_of(code).and_then(regions::health_region),
        }
    }

    pub fn stations(&self) -> Vec<StationInfo> {
        self.station_codes()
            .into_iter()
            .map(|code| StationInfo {
                code: code.to_string(),
                name: self.station_name(code).to_string(),
                province: self.province_of(code).map(str::to_string),
                region: self.region_of(code).map(str::to_string),
                readings: self.data.get(code).map_or(0, Vec::len),
            })
            .collect()
    }

    /// Raw readings of one station.
    pub fn station_series(&self, code: &str) -> Result<&[Reading], AppError> {
        self.data
            .get(code)
            .map(Vec::as_slice)
            .ok_or_else(|| AppError::input(format!("Unknown station '{code}'.")))
    }

    /// Station codes feeding a selection.
    pub fn stations_for<'a>(
        &'a self,
        selector: &'a SeriesSelector,
    ) -> Result<Vec<&'a str>, AppError> {
        let codes: Vec<&'a str> = match selector {
            SeriesSelector::Station(code) => {
                self.station_series(code)?;
                vec![code.as_str()]
            }
            SeriesSelector::Province(name) => self
                .station_codes()
                .into_iter()
                .filter(|code| self.province_of(code) == Some(name.as_str()))
                .collect(),
            SeriesSelector::Region(name) => self
                .station_codes()
                .into_iter()
                .filter(|code| self.region_of(code) == Some(name.as_str()))
                .collect(),
            SeriesSelector::All => self.station_codes(),
        };

        if codes.is_empty() {
            return Err(AppError::input(format!("No stations found for {selector}.")));
        }
        Ok(codes)
    }

    /// Provinces covered by a selection (used to look up health data).
    pub fn provinces_for(&self, selector: &SeriesSelector) -> Result<Vec<String>, AppError> {
        if let SeriesSelector::Province(name) = selector {
            return Ok(vec![name.clone()]);
        }
        let provinces: BTreeSet<String> = self
            .stations_for(selector)?
            .into_iter()
            .filter_map(|code| self.province_of(code).map(str::to_string))
            .collect();
        Ok(provinces.into_iter().collect())
    }

    /// Build the series for a selection.
    ///
    /// A single station returns its readings unchanged. Several stations are
    /// averaged per date over the stations reporting that day.
    pub fn select(&self, selector: &SeriesSelector) -> Result<Series, AppError> {
        let codes = self.stations_for(selector)?;
        if let [code] = codes.as_slice() {
            return Ok(self.station_series(code)?.to_vec());
        }

        let parts: Vec<&[Reading]> = codes
            .iter()
            .filter_map(|code| self.data.get(*code).map(Vec::as_slice))
            .collect();
        debug!(%selector, stations = parts.len(), "averaging stations per date");
        Ok(average_by_date(&parts))
    }

    /// Year of `metadata.maxDate`, when it parses.
    pub fn declared_max_year(&self) -> Option<i32> {
        self.metadata
            .max_date
            .as_deref()
            .and_then(crate::domain::parse_date)
            .map(|d| d.year())
    }

    /// Distinct calendar years present in a series, ascending.
    pub fn years(series: &[Reading]) -> Vec<i32> {
        let years: BTreeSet<i32> = series
            .iter()
            .filter_map(|r| r.parsed_date().map(|d| d.year()))
            .collect();
        years.into_iter().collect()
    }
}

/// Per-date mean across several series. Malformed dates are dropped; output is ascending.
pub fn average_by_date(parts: &[&[Reading]]) -> Series {
    let mut by_date: BTreeMap<NaiveDate, AggregateStat> = BTreeMap::new();
    for part in parts {
        for reading in *part {
            if let Some(date) = reading.parsed_date() {
                by_date.entry(date).or_default().push(reading.value);
            }
        }
    }

    by_date
        .into_iter()
        .filter_map(|(date, stat)| {
            stat.mean()
                .map(|mean| Reading::new(date.format(DATE_FORMAT).to_string(), mean))
        })
        .collect()
}
