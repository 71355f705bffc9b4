use anyhow::Result;
use forecast_service::{
    config::ForecastConfig,
    forecast::{GaussianNoise, NOISE_STD_DEV},
    metrics_textfile, observability,
    pipeline::ForecastPipeline,
    sinks::JsonFileSink,
    sources::ObservationSource,
    transform::HourlyFeatureTransform,
};
use std::{sync::Arc, time::Instant};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    observability::init_tracing();
    let started = Instant::now();

    // Load configuration (defaults unless forecast-config.toml is present)
    let cfg = ForecastConfig::load()?;

    if cfg.metrics.is_some() {
        metrics_textfile::init()?;
    }

    let source = ObservationSource::resolve(&cfg.input_path, cfg.synthetic_rng());
    let noise = GaussianNoise::new(cfg.noise_rng(), NOISE_STD_DEV)?;

    let pipeline = ForecastPipeline {
        source,
        features: Arc::new(HourlyFeatureTransform),
        noise,
        sink: JsonFileSink::new(&cfg.output_path),
    };

    let summary = pipeline.run().await?;
    tracing::debug!(
        observations = summary.observations,
        records = summary.forecast.len(),
        "forecast run complete"
    );

    metrics::histogram!("forecast_run_duration_seconds").record(started.elapsed().as_secs_f64());
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_textfile::write(&metrics_cfg.textfile_path)?;
    }

    Ok(())
}
