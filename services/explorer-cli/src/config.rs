//! Metric catalog loading.
//!
//! Loads the dashboard's metric catalog from config/metrics.yaml, dropping
//! invalid entries with a warning rather than failing the whole load.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use explorer_common::MetricCatalog;

/// Load the metric catalog from `{config_dir}/metrics.yaml`.
pub fn load_catalog(config_dir: &Path) -> Result<MetricCatalog> {
    let path = config_dir.join("metrics.yaml");
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;

    let mut catalog: MetricCatalog = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse catalog file: {}", path.display()))?;

    let dropped = catalog.retain_valid();
    if dropped > 0 {
        warn!(dropped, path = %path.display(), "Dropped invalid catalog entries");
    }
    anyhow::ensure!(
        !catalog.is_empty(),
        "Catalog {} contains no valid metrics",
        path.display()
    );

    info!(count = catalog.len(), path = %path.display(), "Loaded metric catalog");
    Ok(catalog)
}
