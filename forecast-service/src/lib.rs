pub mod pipeline;
pub mod config;
pub mod sources;
pub mod sinks;
pub mod transform;
pub mod model;
pub mod forecast;
pub mod observability;
pub mod metrics_textfile;

pub use pipeline::{Envelope, ForecastPipeline, PipelineError, RunSummary};
