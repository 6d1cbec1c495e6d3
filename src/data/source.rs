//! Load a JSON dataset from a local file or an HTTP(S) URL.

use std::fs::File;
use std::io::BufReader;

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::domain::DataSource;
use crate::error::AppError;

/// Read and deserialize a JSON document.
///
/// File problems (missing, unreadable, invalid JSON) are input errors (exit
/// code 2); HTTP failures are runtime errors (exit code 4).
pub fn load_json<T: DeserializeOwned>(source: &DataSource, client: &Client) -> Result<T, AppError> {
    match source {
        DataSource::File(path) => {
            debug!(path = %path.display(), "reading dataset file");
            let file = File::open(path).map_err(|e| {
                AppError::input(format!("Failed to open dataset '{}': {e}", path.display()))
            })?;
            serde_json::from_reader(BufReader::new(file)).map_err(|e| {
                AppError::input(format!("Invalid dataset JSON '{}': {e}", path.display()))
            })
        }
        DataSource::Url(url) => {
            info!(%url, "fetching dataset");
            let resp = client
                .get(url)
                .send()
                .map_err(|e| AppError::runtime(format!("Request for '{url}' failed: {e}")))?;

            if !resp.status().is_success() {
                return Err(AppError::runtime(format!(
                    "Request for '{url}' failed with status {}.",
                    resp.status()
                )));
            }

            resp.json()
                .map_err(|e| AppError::runtime(format!("Failed to parse dataset from '{url}': {e}")))
        }
    }
}
