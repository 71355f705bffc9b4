use std::{fs::File, path::PathBuf};

use csv::StringRecord;
use energy_domain::{timestamp::parse_timestamp, Observation};
use futures::Stream;

use crate::pipeline::{Envelope, PipelineError, Source};

/// Semicolon-delimited export of hourly readings.
///
/// Expected header columns (by name, any order, extra columns ignored):
/// - timestamp
/// - consumption
/// - production
pub struct CsvObservationSource {
    path: PathBuf,
}

impl CsvObservationSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

/// `str::parse` accepts `NaN` and `inf`; neither can be fitted or written as
/// a JSON number, so both are rejected here.
fn parse_f64(name: &str, raw: &str, line: u64) -> Result<f64, PipelineError> {
    let value: f64 = raw
        .parse()
        .map_err(|e| PipelineError::MalformedInput(format!("line {line}: invalid {name} '{raw}': {e}")))?;
    if !value.is_finite() {
        return Err(PipelineError::MalformedInput(format!(
            "line {line}: {name} '{raw}' is not a finite number"
        )));
    }
    Ok(value)
}

fn record_to_observation(record: &StringRecord, headers: &StringRecord) -> Result<Observation, PipelineError> {
    let line = record.position().map(|p| p.line()).unwrap_or_default();
    let get = |name: &str| -> Result<&str, PipelineError> {
        headers
            .iter()
            .position(|h| h == name)
            .and_then(|idx| record.get(idx))
            .ok_or_else(|| PipelineError::MalformedInput(format!("line {line}: missing column '{name}'")))
    };

    let ts_str = get("timestamp")?;
    let timestamp =
        parse_timestamp(ts_str).map_err(|e| PipelineError::MalformedInput(format!("line {line}: {e}")))?;

    let consumption = parse_f64("consumption", get("consumption")?, line)?;
    let production = parse_f64("production", get("production")?, line)?;

    Ok(Observation {
        timestamp,
        consumption,
        production,
    })
}

fn read_error(context: &str, e: csv::Error) -> PipelineError {
    if e.is_io_error() {
        PipelineError::Source(format!("{context}: {e}"))
    } else {
        PipelineError::MalformedInput(format!("{context}: {e}"))
    }
}

#[async_trait::async_trait]
impl Source<Observation> for CsvObservationSource {
    async fn stream(
        &self,
    ) -> std::pin::Pin<Box<dyn Stream<Item = Result<Envelope<Observation>, PipelineError>> + Send>> {
        // Blocking reader; the exports are a few dozen rows.
        let path = self.path.clone();
        let s = async_stream::try_stream! {
            let file = File::open(&path)
                .map_err(|e| PipelineError::Source(format!("failed to open {}: {e}", path.display())))?;
            // Opening a directory succeeds on Linux; only the first read fails.
            let meta = file
                .metadata()
                .map_err(|e| PipelineError::Source(format!("failed to stat {}: {e}", path.display())))?;
            if meta.is_dir() {
                Err::<(), _>(PipelineError::Source(format!("{} is a directory", path.display())))?;
            }
            let mut rdr = csv::ReaderBuilder::new()
                .delimiter(b';')
                .trim(csv::Trim::All)
                .from_reader(file);
            let headers = rdr
                .headers()
                .map_err(|e| read_error("failed to read header row", e))?
                .clone();

            for required in ["timestamp", "consumption", "production"] {
                if !headers.iter().any(|h| h == required) {
                    metrics::counter!("observation_csv_parse_errors_total").increment(1);
                    Err::<(), _>(PipelineError::MalformedInput(format!(
                        "header row has no '{required}' column"
                    )))?;
                }
            }

            let mut rows: u64 = 0;
            for result in rdr.records() {
                let record = result.map_err(|e| read_error("failed to read record", e))?;

                let observation = match record_to_observation(&record, &headers) {
                    Ok(o) => o,
                    Err(e) => {
                        metrics::counter!("observation_csv_parse_errors_total").increment(1);
                        Err(e)?
                    }
                };

                rows += 1;
                yield Envelope::now(observation);
            }

            tracing::debug!(path = %path.display(), rows, "read observations");
        };

        Box::pin(s)
    }
}
