use std::{fs, path::PathBuf};

use energy_domain::ForecastRecord;
use futures::StreamExt;

use crate::pipeline::{Envelope, PipelineError, Sink};

/// Writes the forecast as one pretty-printed JSON array.
///
/// Records are buffered until the input ends, serialized, written to a
/// sibling `*.tmp` file and renamed over `path`. An upstream error or a
/// failed write leaves whatever was at `path` before untouched.
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write(&self, records: &[ForecastRecord]) -> Result<(), PipelineError> {
        let body = serde_json::to_string_pretty(records)
            .map_err(|e| PipelineError::Sink(format!("failed to serialize forecast: {e}")))?;

        let tmp = self.tmp_path();
        fs::write(&tmp, body)
            .map_err(|e| PipelineError::Sink(format!("failed to write {}: {e}", tmp.display())))?;

        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(PipelineError::Sink(format!(
                "failed to move forecast into {}: {e}",
                self.path.display()
            )));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Sink<ForecastRecord> for JsonFileSink {
    async fn run<S>(&self, mut input: S) -> Result<(), PipelineError>
    where
        S: futures::Stream<Item = Result<Envelope<ForecastRecord>, PipelineError>> + Send + Unpin + 'static,
    {
        let mut records = Vec::new();
        while let Some(item) = input.next().await {
            match item {
                Ok(env) => records.push(env.payload),
                Err(e) => {
                    tracing::error!(error = %e, "upstream error, forecast not written");
                    return Err(e);
                }
            }
        }

        match self.write(&records) {
            Ok(()) => {
                metrics::counter!("forecast_records_written_total").increment(records.len() as u64);
                tracing::info!(
                    path = %self.path.display(),
                    records = records.len(),
                    "predictions generated and saved to {}",
                    self.path.display()
                );
                Ok(())
            }
            Err(e) => {
                metrics::counter!("forecast_sink_errors_total").increment(1);
                tracing::error!(error = %e, "json sink write failed");
                Err(e)
            }
        }
    }
}
