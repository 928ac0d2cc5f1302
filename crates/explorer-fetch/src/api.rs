//! Typed wire payloads for the remote tile, point, metadata and catalog
//! search endpoints, plus the [`FetchApi`] seam the orchestrator is driven
//! through.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use serde::Deserialize;

use explorer_common::{ExplorerResult, GwlLevel, GwlList};
use explorer_resolver::ResourceDescriptor;

/// Transport seam between the orchestrator and the network.
///
/// The orchestrator only ever issues GETs described by a
/// [`ResourceDescriptor`] and decodes JSON, so one method covers every slot.
/// Tests substitute a mock that controls response timing and content.
#[async_trait]
pub trait FetchApi: Send + Sync {
    /// Perform the GET described by `descriptor` and return the decoded
    /// JSON body.
    async fn fetch_json(&self, descriptor: &ResourceDescriptor)
        -> ExplorerResult<serde_json::Value>;
}

/// Tile metadata response from the tilejson endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TileJson {
    /// Tile URL templates for the map layer.
    pub tiles: Vec<String>,
    #[serde(rename = "tileSize", default)]
    pub tile_size: Option<u32>,
}

/// Point-value response: one value per warming level, nulls where the
/// dataset has no data at the queried location.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PointResponse {
    pub data: Vec<Option<f64>>,
}

impl PointResponse {
    /// Value at a GWL position; `None` for nulls and out-of-range indices.
    pub fn value_at(&self, gwl_index: usize) -> Option<f64> {
        self.data.get(gwl_index).copied().flatten()
    }
}

/// Metadata response; only the `gwl` dimension is consumed.
#[derive(Debug, Clone, Deserialize)]
pub struct InfoResponse {
    pub dimensions: InfoDimensions,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InfoDimensions {
    pub gwl: GwlDimension,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GwlDimension {
    pub data: Vec<GwlLevel>,
}

impl InfoResponse {
    pub fn gwl_list(&self) -> GwlList {
        GwlList::new(self.dimensions.gwl.data.clone())
    }
}

/// Mean/min/max values extracted from point responses at one warming level.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointValues {
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PointValues {
    /// A well-formed response with nulls across the board means the queried
    /// location is outside the dataset (ocean, masked-out grid cell). This
    /// is a legitimate terminal outcome, distinct from loading or failure.
    pub fn is_no_data(&self) -> bool {
        self.mean.is_none() && self.min.is_none() && self.max.is_none()
    }
}

/// Catalog search feature collection.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub features: Vec<SearchFeature>,
}

/// One feature: a model run whose assets map variable names to data URLs.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchFeature {
    pub id: String,
    #[serde(default)]
    pub assets: BTreeMap<String, Asset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Asset {
    pub href: String,
}

/// A downloadable-variable link in the results table.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetLink {
    pub name: String,
    pub href: String,
}

/// Asset links for one model, the row shape of the results table.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAssets {
    pub model: String,
    pub links: Vec<AssetLink>,
}

impl SearchResponse {
    /// Flatten each feature's asset map into a per-model link table,
    /// keeping only the selected variables (an empty selection keeps all).
    pub fn model_assets(&self, variables: &BTreeSet<String>) -> Vec<ModelAssets> {
        self.features
            .iter()
            .map(|feature| ModelAssets {
                model: feature.id.clone(),
                links: feature
                    .assets
                    .iter()
                    .filter(|(name, _)| variables.is_empty() || variables.contains(*name))
                    .map(|(name, asset)| AssetLink {
                        name: name.clone(),
                        href: asset.href.clone(),
                    })
                    .collect(),
            })
            .collect()
    }
}
