//! Remote-resource descriptors: the resolver's output.

use serde::{Deserialize, Serialize};
use url::Url;

use explorer_common::{ExplorerError, ExplorerResult};

/// The logical slot a descriptor is destined for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Tile,
    Point,
    GwlList,
    Search,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Tile => "tile",
            ResourceKind::Point => "point",
            ResourceKind::GwlList => "gwl_list",
            ResourceKind::Search => "search",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved remote request: base URL, path and ordered query params.
///
/// Never mutated after construction; a newer selection supersedes it with a
/// fresh descriptor. Two descriptors resolved from semantically equal
/// selections are identical, which is what makes [`cache_key`]
/// (Self::cache_key) usable as the staleness identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub kind: ResourceKind,
    pub base_url: String,
    /// Path below the base URL, leading slash included.
    pub path: String,
    /// Query parameters in emission order.
    pub params: Vec<(String, String)>,
}

impl ResourceDescriptor {
    pub fn new(kind: ResourceKind, base_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            kind,
            base_url: base_url.into(),
            path: path.into(),
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Assemble the request URL, percent-encoding the query pairs.
    pub fn url(&self) -> ExplorerResult<Url> {
        let joined = format!("{}{}", self.base_url.trim_end_matches('/'), self.path);
        let mut url = Url::parse(&joined)
            .map_err(|e| ExplorerError::Internal(format!("bad url '{}': {}", joined, e)))?;
        if !self.params.is_empty() {
            url.query_pairs_mut().extend_pairs(
                self.params
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str())),
            );
        }
        Ok(url)
    }

    /// Deterministic identity of this request's semantic content.
    ///
    /// The canonical string form rather than a digest: when a staleness
    /// mismatch shows up in the logs, the key itself names the offending
    /// parameters.
    pub fn cache_key(&self) -> String {
        let mut key = format!("{}:{}", self.kind, self.path);
        for (i, (k, v)) in self.params.iter().enumerate() {
            key.push(if i == 0 { '?' } else { '&' });
            key.push_str(k);
            key.push('=');
            key.push_str(v);
        }
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile_descriptor() -> ResourceDescriptor {
        ResourceDescriptor::new(
            ResourceKind::Tile,
            "https://tiles.example.com",
            "/WebMercatorQuad/tilejson.json",
        )
        .with_param("url", "s3://cadcat/mean/TX99p.zarr")
        .with_param("variable", "TX99p")
        .with_param("datetime", "1.5")
        .with_param("rescale", "-30,30")
        .with_param("colormap_name", "RdBu_r")
    }

    #[test]
    fn test_url_encodes_query_pairs() {
        let url = tile_descriptor().url().unwrap();
        assert_eq!(url.host_str(), Some("tiles.example.com"));
        assert_eq!(url.path(), "/WebMercatorQuad/tilejson.json");
        let query = url.query().unwrap();
        assert!(query.contains("url=s3%3A%2F%2Fcadcat%2Fmean%2FTX99p.zarr"));
        assert!(query.contains("colormap_name=RdBu_r"));
    }

    #[test]
    fn test_cache_key_is_deterministic() {
        assert_eq!(tile_descriptor().cache_key(), tile_descriptor().cache_key());
        assert_eq!(
            tile_descriptor().cache_key(),
            "tile:/WebMercatorQuad/tilejson.json?url=s3://cadcat/mean/TX99p.zarr\
             &variable=TX99p&datetime=1.5&rescale=-30,30&colormap_name=RdBu_r"
        );
    }

    #[test]
    fn test_cache_key_distinguishes_kind_and_params() {
        let a = tile_descriptor();
        let mut b = tile_descriptor();
        b.kind = ResourceKind::Point;
        assert_ne!(a.cache_key(), b.cache_key());

        let c = tile_descriptor().with_param("extra", "1");
        assert_ne!(a.cache_key(), c.cache_key());
    }

    #[test]
    fn test_trailing_slash_on_base_url() {
        let d = ResourceDescriptor::new(ResourceKind::GwlList, "https://api.example.com/", "/info");
        assert_eq!(d.url().unwrap().as_str(), "https://api.example.com/info");
    }
}
