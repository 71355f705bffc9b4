use std::{pin::Pin, sync::Arc, time::SystemTime};

use energy_domain::{ForecastRecord, HourlyFeatures, Observation, Timestamp};
use futures::{Stream, StreamExt};

use crate::{
    forecast::{generate_forecast, NoiseSource},
    model::LinearModel,
};

#[derive(Debug, Clone)]
pub struct Envelope<T> {
    pub payload: T,
    pub received_at: SystemTime,
}

impl<T> Envelope<T> {
    pub fn now(payload: T) -> Self {
        Self {
            payload,
            received_at: SystemTime::now(),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        Envelope {
            payload: f(self.payload),
            received_at: self.received_at,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("malformed input: {0}")]
    MalformedInput(String),
    #[error("input contains no observations")]
    EmptyInput,
    #[error("source error: {0}")]
    Source(String),
    #[error("transform error: {0}")]
    Transform(String),
    #[error("forecast error: {0}")]
    Forecast(String),
    #[error("sink error: {0}")]
    Sink(String),
}

pub type ItemStream<T> = Pin<Box<dyn Stream<Item = Result<Envelope<T>, PipelineError>> + Send>>;

#[async_trait::async_trait]
pub trait Source<T>: Send + Sync {
    async fn stream(&self) -> ItemStream<T>;
}

#[async_trait::async_trait]
pub trait Transform<I, O>: Send + Sync {
    async fn apply(&self, input: Envelope<I>) -> Result<Envelope<O>, PipelineError>;
}

#[async_trait::async_trait]
pub trait Sink<T>: Send + Sync {
    async fn run<S>(&self, input: S) -> Result<(), PipelineError>
    where
        S: Stream<Item = Result<Envelope<T>, PipelineError>> + Send + Unpin + 'static;
}

/// What a completed run produced, for logging and tests.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub observations: usize,
    pub last_observed: Timestamp,
    pub model: LinearModel,
    pub forecast: Vec<ForecastRecord>,
}

/// Observations in, 24 hourly forecast records out.
///
/// Unlike a streaming pipeline the fit needs every row, so the source is
/// drained before anything reaches the sink. The first upstream error aborts
/// the run and the sink never sees a partial forecast.
pub struct ForecastPipeline<S, N, K> {
    pub source: S,
    pub features: Arc<dyn Transform<Observation, HourlyFeatures> + Send + Sync>,
    pub noise: N,
    pub sink: K,
}

impl<S, N, K> ForecastPipeline<S, N, K>
where
    S: Source<Observation> + Send + Sync + 'static,
    N: NoiseSource,
    K: Sink<ForecastRecord> + Send + Sync + 'static,
{
    pub async fn run(mut self) -> Result<RunSummary, PipelineError> {
        let features = self.features.clone();
        let mut stream = Box::pin(self.source.stream().await.then(move |item| {
            let t = features.clone();
            async move {
                match item {
                    Ok(env) => t.apply(env).await,
                    Err(e) => Err(e),
                }
            }
        }));

        let mut rows = Vec::new();
        while let Some(item) = stream.next().await {
            rows.push(item?.payload);
        }
        metrics::counter!("forecast_observations_total").increment(rows.len() as u64);

        let last_observed = latest_timestamp(&rows)?;

        let model = LinearModel::fit(&rows)?;
        tracing::info!(
            observations = rows.len(),
            slope = model.slope,
            intercept = model.intercept,
            %last_observed,
            "fitted consumption ~ hour"
        );

        let forecast = generate_forecast(&model, last_observed, &mut self.noise)?;

        let envelopes: Vec<_> = forecast.iter().cloned().map(|r| Ok(Envelope::now(r))).collect();
        self.sink.run(futures::stream::iter(envelopes)).await?;

        Ok(RunSummary {
            observations: rows.len(),
            last_observed,
            model,
            forecast,
        })
    }
}

/// Latest observed timestamp. Rows must agree on their UTC offset (or all
/// lack one), otherwise "latest" and the forecast's offset are ambiguous.
fn latest_timestamp(rows: &[HourlyFeatures]) -> Result<Timestamp, PipelineError> {
    let first = rows.first().ok_or(PipelineError::EmptyInput)?.observation.timestamp;
    if let Some(other) = rows
        .iter()
        .map(|r| r.observation.timestamp)
        .find(|ts| ts.offset != first.offset)
    {
        return Err(PipelineError::MalformedInput(format!(
            "mixed UTC offsets: '{first}' and '{other}'"
        )));
    }

    rows.iter()
        .map(|r| r.observation.timestamp)
        .max()
        .ok_or(PipelineError::EmptyInput)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::hourly_features;
    use time::{macros::datetime, UtcOffset};

    fn row(ts: Timestamp) -> HourlyFeatures {
        hourly_features(Observation {
            timestamp: ts,
            consumption: 100.0,
            production: 50.0,
        })
    }

    #[test]
    fn latest_is_max_not_last() {
        let rows = [
            row(Timestamp::naive(datetime!(2026-01-23 18:00:00))),
            row(Timestamp::naive(datetime!(2026-01-22 04:00:00))),
        ];
        assert_eq!(
            latest_timestamp(&rows).unwrap(),
            Timestamp::naive(datetime!(2026-01-23 18:00:00))
        );
    }

    #[test]
    fn shared_offset_is_kept() {
        let rows = [
            row(Timestamp::with_offset(datetime!(2026-01-22 00:00:00), UtcOffset::UTC)),
            row(Timestamp::with_offset(datetime!(2026-01-22 01:00:00), UtcOffset::UTC)),
        ];
        assert_eq!(latest_timestamp(&rows).unwrap().offset, Some(UtcOffset::UTC));
    }

    #[test]
    fn mixed_offsets_are_malformed_input() {
        let rows = [
            row(Timestamp::with_offset(datetime!(2026-01-22 00:00:00), UtcOffset::UTC)),
            row(Timestamp::naive(datetime!(2026-01-22 01:00:00))),
        ];
        assert!(matches!(latest_timestamp(&rows), Err(PipelineError::MalformedInput(_))));
    }

    #[test]
    fn no_rows_is_empty_input() {
        assert!(matches!(latest_timestamp(&[]), Err(PipelineError::EmptyInput)));
    }
}
