use crate::pipeline::{Envelope, PipelineError, Transform};
use energy_domain::{HourlyFeatures, Observation};

/// Pure feature derivation for an `Observation`.
///
/// - hour: wall-clock hour of the timestamp, 0..=23.
/// - day_of_year: ordinal day, 1..=366.
pub fn hourly_features(observation: Observation) -> HourlyFeatures {
    let hour = observation.timestamp.hour();
    let day_of_year = observation.timestamp.ordinal();

    HourlyFeatures {
        observation,
        hour,
        day_of_year,
    }
}

#[derive(Clone, Default)]
pub struct HourlyFeatureTransform;

#[async_trait::async_trait]
impl Transform<Observation, HourlyFeatures> for HourlyFeatureTransform {
    async fn apply(
        &self,
        input: Envelope<Observation>,
    ) -> Result<Envelope<HourlyFeatures>, PipelineError> {
        Ok(input.map(hourly_features))
    }
}
