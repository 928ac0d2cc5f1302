//! Canned catalogs and remote payloads.

use serde_json::{json, Value};

use explorer_common::{Metric, MetricCatalog, VariantPaths};
use explorer_resolver::{Endpoints, Resolver};

/// Endpoints pointing at nothing in particular; fine for tests that never
/// touch the network.
pub fn endpoints() -> Endpoints {
    Endpoints::new("https://tiles.example.com", "https://catalog.example.com")
}

fn variant(
    variable: &str,
    rescale: &str,
    colormap: &str,
    description: &str,
    short_desc: &str,
    with_range: bool,
) -> VariantPaths {
    VariantPaths {
        variable: variable.to_string(),
        mean: format!("s3://cadcat/mean/{}.zarr", variable),
        min_path: with_range.then(|| format!("s3://cadcat/min/{}.zarr", variable)),
        max_path: with_range.then(|| format!("s3://cadcat/max/{}.zarr", variable)),
        rescale: rescale.to_string(),
        colormap: colormap.to_string(),
        description: description.to_string(),
        short_desc: short_desc.to_string(),
    }
}

/// Three-metric catalog mirroring the dashboard's real one: extreme heat
/// (with min/max ensemble paths), extreme precipitation, and a delta-only
/// fire-weather metric.
pub fn sample_catalog() -> MetricCatalog {
    MetricCatalog::new(vec![
        Metric {
            id: 0,
            title: "Extreme Heat".to_string(),
            abs: Some(variant(
                "TX99p",
                "-30,30",
                "RdBu_r",
                "Mean annual change in extreme heat days",
                "Extreme heat days",
                true,
            )),
            del: None,
        },
        Metric {
            id: 1,
            title: "Extreme Precipitation".to_string(),
            abs: Some(variant(
                "R99p",
                "-20,20",
                "BrBG",
                "Absolute change in 99th percentile 1-day accumulated precipitation",
                "Extreme precipitation",
                false,
            )),
            del: None,
        },
        Metric {
            id: 2,
            title: "Fire Weather".to_string(),
            abs: None,
            del: Some(variant(
                "ffwige50",
                "-60,60",
                "PuOr",
                "Change in median annual number of days with FFWI greater than 50",
                "Fire weather days",
                false,
            )),
        },
    ])
}

/// Resolver over [`sample_catalog`] and [`endpoints`].
pub fn sample_resolver() -> Resolver {
    Resolver::new(sample_catalog(), endpoints())
}

/// Metadata-endpoint payload enumerating warming levels.
pub fn info_json(levels: &[f64]) -> Value {
    json!({ "dimensions": { "gwl": { "data": levels } } })
}

/// Point-endpoint payload, one value per warming level.
pub fn point_json(values: &[Option<f64>]) -> Value {
    json!({ "data": values })
}

/// Point-endpoint payload for a location outside the dataset.
pub fn null_point_json(levels: usize) -> Value {
    point_json(&vec![None; levels])
}

/// Tilejson payload with a single tile template.
pub fn tilejson_json(tag: &str) -> Value {
    json!({
        "tiles": [format!("https://tiles.example.com/{}/{{z}}/{{x}}/{{y}}.png", tag)],
        "tileSize": 256
    })
}

/// Search feature collection with two models carrying tasmax/pr assets.
pub fn search_json() -> Value {
    json!({
        "features": [
            {
                "id": "EC-Earth3",
                "assets": {
                    "tasmax": { "href": "s3://cadcat/loca2/EC-Earth3/tasmax.nc" },
                    "pr": { "href": "s3://cadcat/loca2/EC-Earth3/pr.nc" }
                }
            },
            {
                "id": "MIROC6",
                "assets": {
                    "tasmax": { "href": "s3://cadcat/loca2/MIROC6/tasmax.nc" },
                    "pr": { "href": "s3://cadcat/loca2/MIROC6/pr.nc" }
                }
            }
        ]
    })
}

/// YAML source equivalent to [`sample_catalog`], for config-loading tests.
pub fn catalog_yaml() -> &'static str {
    r#"
metrics:
  - id: 0
    title: "Extreme Heat"
    abs:
      variable: TX99p
      mean: "s3://cadcat/mean/TX99p.zarr"
      min_path: "s3://cadcat/min/TX99p.zarr"
      max_path: "s3://cadcat/max/TX99p.zarr"
      rescale: "-30,30"
      colormap: RdBu_r
      description: "Mean annual change in extreme heat days"
      short_desc: "Extreme heat days"
  - id: 1
    title: "Extreme Precipitation"
    abs:
      variable: R99p
      mean: "s3://cadcat/mean/R99p.zarr"
      rescale: "-20,20"
      colormap: BrBG
      description: "Absolute change in 99th percentile 1-day accumulated precipitation"
      short_desc: "Extreme precipitation"
  - id: 2
    title: "Fire Weather"
    del:
      variable: ffwige50
      mean: "s3://cadcat/mean/ffwige50.zarr"
      rescale: "-60,60"
      colormap: PuOr
      description: "Change in median annual number of days with FFWI greater than 50"
      short_desc: "Fire weather days"
"#
}
