//! Metric catalog: the downscaled climate indicators the dashboard can show.
//!
//! Each metric carries one set of data paths per value type (absolute values
//! or deltas against a baseline). The catalog is normally loaded from a YAML
//! file shipped with the service.

use serde::{Deserialize, Serialize};

use crate::error::{ExplorerError, ExplorerResult};

/// Which flavor of a metric's data to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Absolute values for a warming level.
    Abs,
    /// Change relative to the historical baseline.
    Del,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Abs => "abs",
            ValueType::Del => "del",
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data paths and rendering parameters for one value type of a metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantPaths {
    /// Variable name inside the data array (e.g. "TX99p").
    pub variable: String,
    /// Data path of the ensemble mean (the tile layer source).
    pub mean: String,
    /// Optional data path of the ensemble minimum.
    #[serde(default)]
    pub min_path: Option<String>,
    /// Optional data path of the ensemble maximum.
    #[serde(default)]
    pub max_path: Option<String>,
    /// Rescale bounds, "min,max". Sent verbatim to the tile service.
    pub rescale: String,
    /// Colormap name, possibly carrying a "_r" reversal suffix.
    pub colormap: String,
    /// Long description, shown under the legend.
    #[serde(default)]
    pub description: String,
    /// Short description, shown as the popup title.
    #[serde(default)]
    pub short_desc: String,
}

impl VariantPaths {
    /// Parse the rescale string into numeric bounds.
    pub fn rescale_bounds(&self) -> Option<(f64, f64)> {
        let (min, max) = self.rescale.split_once(',')?;
        Some((min.trim().parse().ok()?, max.trim().parse().ok()?))
    }

    fn validate(&self) -> Result<(), String> {
        if self.variable.is_empty() {
            return Err("variable must not be empty".to_string());
        }
        if self.mean.is_empty() {
            return Err("mean data path must not be empty".to_string());
        }
        if self.rescale_bounds().is_none() {
            return Err(format!("rescale '{}' is not 'min,max'", self.rescale));
        }
        Ok(())
    }
}

/// A single climate metric with its per-value-type variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metric {
    pub id: usize,
    pub title: String,
    #[serde(default)]
    pub abs: Option<VariantPaths>,
    #[serde(default)]
    pub del: Option<VariantPaths>,
}

impl Metric {
    /// Paths for the requested value type, if the metric defines them.
    pub fn variant(&self, value_type: ValueType) -> Option<&VariantPaths> {
        match value_type {
            ValueType::Abs => self.abs.as_ref(),
            ValueType::Del => self.del.as_ref(),
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.abs.is_none() && self.del.is_none() {
            return Err("metric defines neither abs nor del paths".to_string());
        }
        if let Some(v) = &self.abs {
            v.validate().map_err(|e| format!("abs: {}", e))?;
        }
        if let Some(v) = &self.del {
            v.validate().map_err(|e| format!("del: {}", e))?;
        }
        Ok(())
    }
}

/// The full set of metrics available to the dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricCatalog {
    pub metrics: Vec<Metric>,
}

impl MetricCatalog {
    pub fn new(metrics: Vec<Metric>) -> Self {
        Self { metrics }
    }

    /// Parse a catalog from YAML, rejecting entries that fail validation.
    pub fn from_yaml(content: &str) -> ExplorerResult<Self> {
        let catalog: MetricCatalog = serde_yaml::from_str(content)
            .map_err(|e| ExplorerError::Decode(format!("YAML error: {}", e)))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Validate every entry.
    pub fn validate(&self) -> ExplorerResult<()> {
        for metric in &self.metrics {
            metric
                .validate()
                .map_err(|message| ExplorerError::InvalidCatalogEntry {
                    name: metric.title.clone(),
                    message,
                })?;
        }
        Ok(())
    }

    /// Drop entries that fail validation, logging each. Returns the number
    /// dropped. Used when loading an operator-edited catalog file where one
    /// bad entry should not take the whole dashboard down.
    pub fn retain_valid(&mut self) -> usize {
        let before = self.metrics.len();
        self.metrics.retain(|metric| match metric.validate() {
            Ok(()) => true,
            Err(message) => {
                tracing::warn!(metric = %metric.title, %message, "Skipping invalid catalog entry");
                false
            }
        });
        before - self.metrics.len()
    }

    /// Look up a metric by id.
    pub fn get(&self, id: usize) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.id == id)
    }

    /// Look up the paths for a metric id and value type.
    pub fn variant(&self, id: usize, value_type: ValueType) -> Option<&VariantPaths> {
        self.get(id).and_then(|m| m.variant(value_type))
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}
