//! Weekly health-case dataset (`hdc_consolidated.json`).
//!
//! Counts are stored per province and year as 53 weekly slots per disease
//! group. A stored `Total` series may be present but is never trusted: the
//! total is always recomputed from the groups named in `metadata.groups`.

use std::collections::BTreeMap;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::data::source::load_json;
use crate::domain::{CaseCategory, DataSource, ISO_WEEKS, WeeklyCases};
use crate::error::AppError;

const TOTAL_KEY: &str = "Total";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthMetadata {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub groups: Vec<String>,
}

/// One province-year: optional week numbers plus per-group weekly counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthYear {
    /// Week number for each slot; slot `i` is week `i + 1` when absent.
    #[serde(default)]
    pub weeks: Vec<u32>,
    #[serde(default)]
    pub diseases: BTreeMap<String, Vec<Option<f64>>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthDataset {
    #[serde(default)]
    pub metadata: HealthMetadata,
    /// province → year → counts. Years are JSON object keys, hence strings.
    #[serde(default)]
    pub data: BTreeMap<String, BTreeMap<String, HealthYear>>,
}

impl HealthYear {
    /// Weekly counts for one category in this province-year.
    ///
    /// `groups` is the fixed list of named categories that make up `Total`.
    /// Returns `None` when the category has no series here.
    pub fn weekly(&self, category: &CaseCategory, groups: &[String]) -> Option<WeeklyCases> {
        match category {
            CaseCategory::Named(name) => {
                let counts = self.diseases.get(name)?;
                let mut out = WeeklyCases::empty(category.clone());
                self.fill(&mut out, counts);
                Some(out)
            }
            CaseCategory::Total => {
                let mut out = WeeklyCases::empty(CaseCategory::Total);
                let mut found = false;
                for group in groups {
                    if let Some(counts) = self.diseases.get(group) {
                        found = true;
                        self.fill(&mut out, counts);
                    }
                }
                found.then_some(out)
            }
        }
    }

    /// Add `counts` into `out`, mapping slots through `weeks`.
    fn fill(&self, out: &mut WeeklyCases, counts: &[Option<f64>]) {
        for (i, count) in counts.iter().enumerate() {
            let Some(count) = count else {
                continue;
            };
            let week = self.weeks.get(i).copied().unwrap_or(i as u32 + 1);
            if !(1..=ISO_WEEKS as u32).contains(&week) {
                continue;
            }
            let slot = &mut out.counts[week as usize - 1];
            *slot = Some(slot.unwrap_or(0.0) + count);
        }
    }
}

impl HealthDataset {
    pub fn load(source: &DataSource, client: &Client) -> Result<Self, AppError> {
        let dataset: Self = load_json(source, client)?;
        info!(
            %source,
            provinces = dataset.data.len(),
            groups = dataset.metadata.groups.len(),
            "loaded health dataset"
        );
        Ok(dataset)
    }

    /// Named groups that make up `Total`.
    ///
    /// Falls back to every non-`Total` disease key found in the data when the
    /// metadata does not list any groups.
    pub fn groups(&self) -> Vec<String> {
        if !self.metadata.groups.is_empty() {
            return self.metadata.groups.clone();
        }
        let mut names: Vec<String> = self
            .data
            .values()
            .flat_map(|years| years.values())
            .flat_map(|year| year.diseases.keys())
            .filter(|name| name.as_str() != TOTAL_KEY)
            .cloned()
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// `Total` followed by every named group.
    pub fn categories(&self) -> Vec<CaseCategory> {
        std::iter::once(CaseCategory::Total)
            .chain(self.groups().into_iter().map(CaseCategory::Named))
            .collect()
    }

    pub fn year(&self, province: &str, year: i32) -> Option<&HealthYear> {
        self.data.get(province)?.get(&year.to_string())
    }

    /// Weekly counts summed over `provinces`.
    ///
    /// Provinces without data for `year` are skipped and reported in the
    /// second element. The first element is `None` when no province
    /// contributed. An unknown category name is an input error.
    pub fn weekly_cases(
        &self,
        provinces: &[String],
        year: i32,
        category: &CaseCategory,
    ) -> Result<(Option<WeeklyCases>, Vec<String>), AppError> {
        let groups = self.groups();
        if let CaseCategory::Named(name) = category {
            if !groups.iter().any(|g| g == name) {
                let available: Vec<String> =
                    self.categories().iter().map(ToString::to_string).collect();
                return Err(AppError::input(format!(
                    "Unknown health category '{name}'. Available: {}.",
                    available.join(", ")
                )));
            }
        }

        let mut merged: Option<WeeklyCases> = None;
        let mut missing = Vec::new();
        for province in provinces {
            let Some(weekly) = self
                .year(province, year)
                .and_then(|y| y.weekly(category, &groups))
            else {
                debug!(%province, year, "no health data for province");
                missing.push(province.clone());
                continue;
            };

            match merged.as_mut() {
                None => merged = Some(weekly),
                Some(acc) => {
                    for (slot, count) in acc.counts.iter_mut().zip(weekly.counts) {
                        if let Some(count) = count {
                            *slot = Some(slot.unwrap_or(0.0) + count);
                        }
                    }
                }
            }
        }

        Ok((merged, missing))
    }
}
