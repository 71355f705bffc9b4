pub mod domain;
pub mod timestamp;

pub use domain::{ForecastRecord, HourlyFeatures, Observation};
pub use timestamp::Timestamp;
