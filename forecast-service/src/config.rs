use rand::{rngs::StdRng, SeedableRng};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_CONFIG_FILE: &str = "forecast-config.toml";
pub const DEFAULT_INPUT_PATH: &str = "../energie-2026-01-22-au-2026-01-24.csv";
pub const DEFAULT_OUTPUT_PATH: &str = "predictions.json";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MetricsConfig {
    /// Prometheus text exposition is written here when the run ends.
    pub textfile_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// Fixes both the synthetic data and the forecast noise. Unset means
    /// entropy-seeded, so every run differs.
    pub random_seed: Option<u64>,
    pub metrics: Option<MetricsConfig>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            random_seed: None,
            metrics: None,
        }
    }
}

impl ForecastConfig {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Defaults when `path` does not exist; a file that exists must parse.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
            .map_err(|e| anyhow::anyhow!("invalid config {}: {e}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let cfg: ForecastConfig = toml::from_str(contents)?;
        Ok(cfg)
    }

    pub fn synthetic_rng(&self) -> StdRng {
        self.rng(0)
    }

    pub fn noise_rng(&self) -> StdRng {
        self.rng(1)
    }

    fn rng(&self, stream: u64) -> StdRng {
        match self.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
            None => StdRng::from_entropy(),
        }
    }
}
