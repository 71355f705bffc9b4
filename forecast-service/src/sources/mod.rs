pub mod observation_csv_file;
pub mod synthetic;

pub use observation_csv_file::CsvObservationSource;
pub use synthetic::SyntheticObservationSource;

use std::path::{Path, PathBuf};

use energy_domain::Observation;
use rand::Rng;

use crate::pipeline::{ItemStream, Source};

/// Where a run's observations came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataOrigin {
    File(PathBuf),
    Synthetic { missing: PathBuf },
}

pub fn fallback_warning(missing: &Path) -> String {
    format!("{} not found, using generated data", missing.display())
}

/// The export file when it exists, otherwise generated data.
pub enum ObservationSource<R> {
    Csv(CsvObservationSource),
    Synthetic {
        source: SyntheticObservationSource<R>,
        missing: PathBuf,
    },
}

impl<R: Rng + Send> ObservationSource<R> {
    /// Only existence is checked here; a file that exists but cannot be
    /// read or parsed fails later, when the stream is drained.
    pub fn resolve<P: Into<PathBuf>>(path: P, rng: R) -> Self {
        let path = path.into();
        if path.exists() {
            tracing::info!(path = %path.display(), "reading observations");
            Self::Csv(CsvObservationSource::new(path))
        } else {
            tracing::warn!("{}", fallback_warning(&path));
            Self::Synthetic {
                source: SyntheticObservationSource::new(rng),
                missing: path,
            }
        }
    }

    pub fn origin(&self) -> DataOrigin {
        match self {
            Self::Csv(s) => DataOrigin::File(s.path().to_path_buf()),
            Self::Synthetic { missing, .. } => DataOrigin::Synthetic {
                missing: missing.clone(),
            },
        }
    }
}

#[async_trait::async_trait]
impl<R: Rng + Send> Source<Observation> for ObservationSource<R> {
    async fn stream(&self) -> ItemStream<Observation> {
        match self {
            Self::Csv(s) => s.stream().await,
            Self::Synthetic { source, .. } => source.stream().await,
        }
    }
}
