//! External data: the two consolidated JSON datasets and the analysis backend.

pub mod compute;
pub mod health;
pub mod integrity;
pub mod pm25;
pub mod regions;
pub mod source;

pub use compute::{AnalysisData, ComputeClient};
pub use health::HealthDataset;
pub use integrity::IntegrityReport;
pub use pm25::{Pm25Dataset, StationInfo};
