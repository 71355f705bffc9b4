//! Prometheus exposition for a run that exits immediately.
//!
//! There is nothing to scrape, so the rendered text is dropped into a file
//! for a node-exporter textfile collector to pick up.

use std::{fs, path::Path};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static PROM_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

pub fn init() -> anyhow::Result<()> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    // Ignore error if the handle was already set; this should only be called once.
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

/// Returns `false` when no recorder was installed.
pub fn write(path: &Path) -> anyhow::Result<bool> {
    let Some(handle) = PROM_HANDLE.get() else {
        return Ok(false);
    };
    fs::write(path, handle.render())?;
    tracing::debug!(path = %path.display(), "metrics written");
    Ok(true)
}
