use energy_domain::{ForecastRecord, Timestamp};
use rand::Rng;
use rand_distr::{Distribution, Normal, NormalError};
use time::Duration;

use crate::{model::LinearModel, pipeline::PipelineError};

pub const HORIZON_HOURS: i64 = 24;
pub const NOISE_STD_DEV: f64 = 5.0;

/// Per-point perturbation added on top of the fitted line.
pub trait NoiseSource {
    fn sample(&mut self) -> f64;
}

/// Zero-mean Gaussian noise drawn from an injected RNG.
pub struct GaussianNoise<R> {
    rng: R,
    normal: Normal<f64>,
}

impl<R: Rng> GaussianNoise<R> {
    pub fn new(rng: R, std_dev: f64) -> Result<Self, NormalError> {
        Ok(Self {
            rng,
            normal: Normal::new(0.0, std_dev)?,
        })
    }
}

impl<R: Rng> NoiseSource for GaussianNoise<R> {
    fn sample(&mut self) -> f64 {
        self.normal.sample(&mut self.rng)
    }
}

/// Adds the same offset to every point. `ConstantNoise(0.0)` yields the bare
/// regression line.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantNoise(pub f64);

impl NoiseSource for ConstantNoise {
    fn sample(&mut self) -> f64 {
        self.0
    }
}

/// Two decimals, exact ties to even (`0.125 -> 0.12`), the way Python's
/// `round(x, 2)` behaves.
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Predicts the `HORIZON_HOURS` hours following `last_observed`.
///
/// No clamping: a steep negative slope can produce negative consumption and
/// that is passed through unchanged.
pub fn generate_forecast<N: NoiseSource + ?Sized>(
    model: &LinearModel,
    last_observed: Timestamp,
    noise: &mut N,
) -> Result<Vec<ForecastRecord>, PipelineError> {
    (1..=HORIZON_HOURS)
        .map(|k| -> Result<ForecastRecord, PipelineError> {
            let timestamp = last_observed
                .checked_add(Duration::hours(k))
                .ok_or_else(|| PipelineError::Forecast(format!("{last_observed} + {k}h is out of range")))?;
            let predicted = model.predict(f64::from(timestamp.hour())) + noise.sample();
            Ok(ForecastRecord {
                timestamp,
                predicted_consumption: round_to_cents(predicted),
            })
        })
        .collect()
}
