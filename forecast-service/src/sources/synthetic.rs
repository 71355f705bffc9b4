use std::sync::Mutex;

use energy_domain::Observation;
use futures::Stream;
use rand::Rng;
use time::{macros::datetime, Duration, PrimitiveDateTime};

use crate::pipeline::{Envelope, PipelineError, Source};

pub const SYNTHETIC_START: PrimitiveDateTime = datetime!(2026-01-22 00:00:00);
pub const SYNTHETIC_PERIODS: usize = 72;

/// `periods` hourly rows from `start`, with integer consumption in [90, 180)
/// and production in [60, 130).
pub fn synthetic_observations<R: Rng>(
    rng: &mut R,
    start: PrimitiveDateTime,
    periods: usize,
) -> Vec<Observation> {
    (0..periods)
        .map(|i| Observation {
            timestamp: (start + Duration::hours(i as i64)).into(),
            consumption: f64::from(rng.gen_range(90..180_u32)),
            production: f64::from(rng.gen_range(60..130_u32)),
        })
        .collect()
}

/// Stand-in data used when no export is available.
pub struct SyntheticObservationSource<R> {
    start: PrimitiveDateTime,
    periods: usize,
    rng: Mutex<R>,
}

impl<R: Rng + Send> SyntheticObservationSource<R> {
    pub fn new(rng: R) -> Self {
        Self::with_range(rng, SYNTHETIC_START, SYNTHETIC_PERIODS)
    }

    pub fn with_range(rng: R, start: PrimitiveDateTime, periods: usize) -> Self {
        Self {
            start,
            periods,
            rng: Mutex::new(rng),
        }
    }
}

#[async_trait::async_trait]
impl<R: Rng + Send> Source<Observation> for SyntheticObservationSource<R> {
    async fn stream(
        &self,
    ) -> std::pin::Pin<Box<dyn Stream<Item = Result<Envelope<Observation>, PipelineError>> + Send>> {
        let rows = match self.rng.lock() {
            Ok(mut rng) => Ok(synthetic_observations(&mut *rng, self.start, self.periods)),
            Err(_) => Err(PipelineError::Source("synthetic rng lock poisoned".to_string())),
        };
        metrics::counter!("observation_synthetic_rows_total").increment(self.periods as u64);

        let items: Vec<_> = match rows {
            Ok(rows) => rows.into_iter().map(|o| Ok(Envelope::now(o))).collect(),
            Err(e) => vec![Err(e)],
        };
        Box::pin(futures::stream::iter(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn seventy_two_hourly_rows_from_start() {
        let rows = synthetic_observations(&mut StdRng::seed_from_u64(1), SYNTHETIC_START, SYNTHETIC_PERIODS);

        assert_eq!(rows.len(), 72);
        assert_eq!(rows[0].timestamp.local, datetime!(2026-01-22 00:00:00));
        assert_eq!(rows[71].timestamp.local, datetime!(2026-01-24 23:00:00));
        for pair in rows.windows(2) {
            assert_eq!(pair[1].timestamp.local - pair[0].timestamp.local, Duration::HOUR);
            assert_eq!(pair[1].timestamp.offset, None);
        }
    }

    #[test]
    fn values_are_integers_in_range() {
        let rows = synthetic_observations(&mut StdRng::seed_from_u64(2), SYNTHETIC_START, 500);

        for o in &rows {
            assert!((90.0..180.0).contains(&o.consumption), "{}", o.consumption);
            assert!((60.0..130.0).contains(&o.production), "{}", o.production);
            assert_eq!(o.consumption.fract(), 0.0);
            assert_eq!(o.production.fract(), 0.0);
        }
    }

    #[tokio::test]
    async fn same_seed_same_rows() {
        let a = SyntheticObservationSource::new(StdRng::seed_from_u64(3));
        let b = SyntheticObservationSource::new(StdRng::seed_from_u64(3));

        let a: Vec<_> = a.stream().await.map(|r| r.unwrap().payload).collect().await;
        let b: Vec<_> = b.stream().await.map(|r| r.unwrap().payload).collect().await;
        assert_eq!(a.len(), SYNTHETIC_PERIODS);
        assert_eq!(a, b);
    }
}
