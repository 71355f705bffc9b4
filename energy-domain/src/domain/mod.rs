pub mod features;
pub mod forecast_record;
pub mod observation;

pub use features::HourlyFeatures;
pub use forecast_record::ForecastRecord;
pub use observation::Observation;
