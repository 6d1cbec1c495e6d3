//! Shared startup logic: load both datasets and open a session.
//!
//! The PM2.5 dataset is required; the health dataset is optional. Both loads
//! run concurrently and a health failure only degrades the health views.

use chrono::{Datelike, Local};
use reqwest::blocking::Client;
use tracing::{debug, info, warn};

use crate::data::{HealthDataset, Pm25Dataset};
use crate::domain::{DashConfig, SeriesSelector};
use crate::error::AppError;
use crate::session::{Selection, Session};

/// Result of the startup loads.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub pm25: Pm25Dataset,
    pub health: Option<HealthDataset>,
}

/// Load both datasets concurrently.
///
/// A PM2.5 failure is returned as the error. A health failure is logged and
/// leaves `health` empty.
pub fn load_datasets(config: &DashConfig, client: &Client) -> Result<LoadedData, AppError> {
    let (pm25, health) = rayon::join(
        || Pm25Dataset::load(&config.pm25_source, client),
        || HealthDataset::load(&config.hdc_source, client),
    );

    let pm25 = pm25?;
    let health = match health {
        Ok(ds) => Some(ds),
        Err(err) => {
            warn!(source = %config.hdc_source, error = %err, "health dataset unavailable");
            None
        }
    };

    Ok(LoadedData { pm25, health })
}

/// Load the datasets and open a session on `selector`.
///
/// Without an explicit `year` the session uses the latest year with data in
/// the selection, then the dataset's `maxDate` year, then the current year.
/// An empty selection therefore still opens and renders empty views.
pub fn open_session(
    config: &DashConfig,
    client: &Client,
    selector: SeriesSelector,
    year: Option<i32>,
) -> Result<Session, AppError> {
    let loaded = load_datasets(config, client)?;
    let mut session = Session::new(loaded.pm25, loaded.health, Selection::new(selector, 0));

    let year = match year {
        Some(y) => y,
        None => match session.latest_year()? {
            Some(y) => y,
            None => {
                let fallback = session
                    .pm25()
                    .declared_max_year()
                    .unwrap_or_else(|| Local::now().year());
                debug!(selector = %session.selection().series, fallback, "selection has no dated readings");
                fallback
            }
        },
    };
    session.set_year(year);
    info!(selector = %session.selection().series, year, "session ready");
    Ok(session)
}
