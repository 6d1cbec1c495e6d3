//! Client for the statistical analysis backend.
//!
//! The backend owns correlation with confidence intervals, SARIMA/Holt-Winters
//! forecasts, lag cross-correlation and threshold bucketing. This module only
//! knows the JSON contract of its responses.

use std::collections::BTreeMap;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;

const COMPUTE_PATH: &str = "/api/compute";
const HEALTH_PATH: &str = "/api/health";

#[derive(Debug, Clone, Serialize)]
pub struct ComputeRequest {
    pub year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_recompute: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub disease: String,
    pub r: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub p_value: f64,
    pub r_squared: f64,
    pub n: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub week: u32,
    pub value: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    /// `"PM2.5"` or a disease group name.
    pub target: String,
    pub forecast: Vec<ForecastPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LagPoint {
    pub lag: u32,
    pub r: f64,
    #[serde(default)]
    pub p_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LagResult {
    pub disease: String,
    pub correlations: Vec<LagPoint>,
    pub optimal_lag: u32,
    pub optimal_r: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdAnalysis {
    #[serde(default)]
    pub thresholds: Vec<String>,
    /// category → average weekly cases per threshold bucket.
    #[serde(default)]
    pub avg_cases: BTreeMap<String, Vec<f64>>,
}

/// Precomputed analysis payload returned by `POST /api/compute`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisData {
    #[serde(default)]
    pub correlations: Vec<CorrelationResult>,
    #[serde(default)]
    pub forecasts: Vec<ForecastResult>,
    #[serde(default)]
    pub lag_analysis: Vec<LagResult>,
    #[serde(default)]
    pub threshold_analysis: ThresholdAnalysis,
    pub computed_at: String,
    #[serde(default)]
    pub cached: bool,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

pub struct ComputeClient {
    client: Client,
    base_url: String,
}

impl ComputeClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Request the analysis for `year`. `force` asks the backend to bypass its cache.
    pub fn compute(&self, year: i32, force: bool) -> Result<AnalysisData, AppError> {
        let url = format!("{}{COMPUTE_PATH}", self.base_url);
        let body = ComputeRequest {
            year,
            force_recompute: force.then_some(true),
        };
        info!(%url, year, force, "requesting analysis");

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| AppError::runtime(format!("Analysis request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::runtime(format!(
                "Analysis request failed with status {}.",
                resp.status()
            )));
        }

        let data: AnalysisData = resp
            .json()
            .map_err(|e| AppError::runtime(format!("Failed to parse analysis response: {e}")))?;
        info!(
            correlations = data.correlations.len(),
            forecasts = data.forecasts.len(),
            cached = data.cached,
            computed_at = %data.computed_at,
            "analysis received"
        );
        Ok(data)
    }

    /// Liveness check; returns the backend's status string.
    pub fn health(&self) -> Result<String, AppError> {
        let url = format!("{}{HEALTH_PATH}", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| AppError::runtime(format!("Backend health check failed: {e}")))?;
        if !resp.status().is_success() {
            return Err(AppError::runtime(format!(
                "Backend health check failed with status {}.",
                resp.status()
            )));
        }
        let body: HealthResponse = resp
            .json()
            .map_err(|e| AppError::runtime(format!("Failed to parse health response: {e}")))?;
        Ok(body.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backend_payload() {
        let raw = r#"{
            "correlations": [{"disease": "Total", "r": 0.61, "ci_lower": 0.4, "ci_upper": 0.76,
                              "p_value": 0.0001, "r_squared": 0.3721, "n": 40}],
            "forecasts": [{"target": "PM2.5", "forecast": [{"week": 9, "value": 30.5, "ci_lower": 25.0, "ci_upper": 36.0}]}],
            "lag_analysis": [{"disease": "Respiratory", "correlations": [{"lag": 0, "r": 0.5, "p_value": 0.01}],
                              "optimal_lag": 0, "optimal_r": 0.5}],
            "threshold_analysis": {"thresholds": ["Good (0-25)"], "avg_cases": {"Total": [100]}},
            "computed_at": "2025-03-01T10:00:00"
        }"#;
        let data: AnalysisData = serde_json::from_str(raw).unwrap();
        assert!(!data.cached);
        assert_eq!(data.correlations[0].n, 40);
        assert_eq!(data.forecasts[0].forecast[0].week, 9);
        assert_eq!(data.threshold_analysis.avg_cases["Total"], vec![100.0]);
    }

    #[test]
    fn request_omits_force_flag_unless_set() {
        let plain = serde_json::to_string(&ComputeRequest { year: 2025, force_recompute: None }).unwrap();
        assert_eq!(plain, r#"{"year":2025}"#);
        let forced = serde_json::to_string(&ComputeRequest {
            year: 2025,
            force_recompute: Some(true),
        })
        .unwrap();
        assert_eq!(forced, r#"{"year":2025,"force_recompute":true}"#);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ComputeClient::new(Client::new(), "http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
    }
}
