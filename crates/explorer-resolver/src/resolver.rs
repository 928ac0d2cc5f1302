//! Two-phase parameter resolution.
//!
//! Phase one resolves the dependent enumeration: the GWL list valid for the
//! selected metric/value-type, fetched from the metadata endpoint. Phase two
//! constructs the primary descriptors (tile, point, search) — but only once a
//! valid GWL index is established, so a tile request can never be built
//! against a warming level the new metric does not have.

use explorer_common::{Colormap, GwlList, LegendRamp, LegendScale, MetricCatalog, VariantPaths};

use crate::descriptor::{ResourceDescriptor, ResourceKind};
use crate::search::{and_join, or_group};
use crate::selection::{ResourceType, SelectionState};
use crate::validation::{Field, ValidationError};

/// Collection the catalog search is scoped to.
const SEARCH_COLLECTION: &str = "loca2-mon-county";

/// Data root for the renewables drought datasets; the configuration code is
/// both the final path segment and the query variable.
const RENEWABLES_DATA_ROOT: &str = "s3://cadcat/tmp/era/wrf/cae/mm4mean/ssp370/gwl";

/// Default number of features requested from the search endpoint.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Base URLs of the remote collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Raster tile / point / metadata service.
    pub tile_base: String,
    /// STAC-like catalog search service.
    pub search_base: String,
}

impl Endpoints {
    pub fn new(tile_base: impl Into<String>, search_base: impl Into<String>) -> Self {
        Self {
            tile_base: tile_base.into(),
            search_base: search_base.into(),
        }
    }
}

/// Identity of a dependent enumeration: the GWL list is a function of the
/// metric and value type, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumerationKey {
    pub metric_id: usize,
    pub value_type: explorer_common::ValueType,
}

/// Point descriptors for one location: the mean is always queried, min/max
/// only when the metric defines those paths.
#[derive(Debug, Clone, PartialEq)]
pub struct PointPlan {
    pub mean: ResourceDescriptor,
    pub min: Option<ResourceDescriptor>,
    pub max: Option<ResourceDescriptor>,
    /// GWL position to index into each response's data array.
    pub gwl_index: usize,
    /// Popup title.
    pub title: String,
}

/// Legend inputs derived from the active metric variant.
#[derive(Debug, Clone, PartialEq)]
pub struct Legend {
    pub ramp: LegendRamp,
    pub scale: LegendScale,
    pub title: String,
}

/// Pure mapping from selection snapshots to resource descriptors.
#[derive(Debug, Clone)]
pub struct Resolver {
    catalog: MetricCatalog,
    endpoints: Endpoints,
}

impl Resolver {
    pub fn new(catalog: MetricCatalog, endpoints: Endpoints) -> Self {
        Self { catalog, endpoints }
    }

    pub fn catalog(&self) -> &MetricCatalog {
        &self.catalog
    }

    /// The metric variant the selection points at, if the catalog has it.
    pub fn variant(&self, state: &SelectionState) -> Option<&VariantPaths> {
        self.catalog.variant(state.metric_id, state.value_type)
    }

    /// Key identifying which GWL enumeration a selection depends on.
    pub fn enumeration_key(state: &SelectionState) -> EnumerationKey {
        EnumerationKey {
            metric_id: state.metric_id,
            value_type: state.value_type,
        }
    }

    /// Phase-one descriptor: the metadata query enumerating valid GWLs.
    pub fn gwl_descriptor(&self, state: &SelectionState) -> Option<ResourceDescriptor> {
        let variant = self.variant(state)?;
        Some(
            ResourceDescriptor::new(ResourceKind::GwlList, &self.endpoints.tile_base, "/info")
                .with_param("url", &variant.mean)
                .with_param("variable", &variant.variable),
        )
    }

    /// Phase-two descriptor: the tilejson request for the current selection.
    ///
    /// Requires the fetched GWL list; returns `None` when the selection's
    /// index does not point into it, so a request can never name a warming
    /// level the dataset lacks. The colormap name goes out verbatim — the
    /// tile service interprets any `_r` suffix itself.
    pub fn tile_descriptor(
        &self,
        state: &SelectionState,
        gwl_list: &GwlList,
    ) -> Option<ResourceDescriptor> {
        let variant = self.variant(state)?;
        let level = gwl_list.get(state.gwl_index)?;
        Some(
            ResourceDescriptor::new(
                ResourceKind::Tile,
                &self.endpoints.tile_base,
                "/WebMercatorQuad/tilejson.json",
            )
            .with_param("url", &variant.mean)
            .with_param("variable", &variant.variable)
            .with_param("datetime", level.literal())
            .with_param("rescale", &variant.rescale)
            .with_param("colormap_name", &variant.colormap),
        )
    }

    /// Point-query descriptors for a clicked location.
    pub fn point_plan(&self, lon: f64, lat: f64, state: &SelectionState) -> Option<PointPlan> {
        let variant = self.variant(state)?;
        let mean = self.point_descriptor(lon, lat, &variant.mean, &variant.variable);
        let min = variant
            .min_path
            .as_deref()
            .map(|path| self.point_descriptor(lon, lat, path, &variant.variable));
        let max = variant
            .max_path
            .as_deref()
            .map(|path| self.point_descriptor(lon, lat, path, &variant.variable));
        Some(PointPlan {
            mean,
            min,
            max,
            gwl_index: state.gwl_index,
            title: variant.short_desc.clone(),
        })
    }

    /// Point-query descriptor for the renewables drought data, where the
    /// configuration code selects both the data path and the variable.
    pub fn renewables_point_descriptor(
        &self,
        lon: f64,
        lat: f64,
        state: &SelectionState,
    ) -> ResourceDescriptor {
        let data_path = format!("{}/{}/d03", RENEWABLES_DATA_ROOT, state.configuration);
        debug_assert!(matches!(
            state.resource_type,
            ResourceType::Solar | ResourceType::Wind
        ));
        self.point_descriptor(lon, lat, &data_path, &state.configuration)
    }

    /// Catalog search descriptor, blocked entirely when required fields are
    /// empty. The error flags each missing field; no request leaves here.
    pub fn search_descriptor(
        &self,
        state: &SelectionState,
    ) -> Result<ResourceDescriptor, ValidationError> {
        let mut missing = Vec::new();
        if state.selected_models.is_empty() {
            missing.push(Field::Models);
        }
        if state.selected_variables.is_empty() {
            missing.push(Field::Variables);
        }
        if state.selected_boundaries.is_empty() {
            missing.push(Field::Boundaries);
        }
        if state.selected_scenarios.is_empty() {
            missing.push(Field::Scenarios);
        }
        if !missing.is_empty() {
            return Err(ValidationError::new(missing));
        }

        let filter = and_join([
            Some(format!("collection='{}'", SEARCH_COLLECTION)),
            or_group(
                "cmip6:experiment_id",
                state.selected_scenarios.iter().map(String::as_str),
            ),
            or_group(
                "countyname",
                state.selected_boundaries.iter().map(String::as_str),
            ),
            or_group(
                "cmip6:source_id",
                state.selected_models.iter().map(String::as_str),
            ),
        ]);

        Ok(
            ResourceDescriptor::new(ResourceKind::Search, &self.endpoints.search_base, "/search")
                .with_param("limit", DEFAULT_SEARCH_LIMIT.to_string())
                .with_param("filter", filter)
                .with_param("filter_lang", "cql2-text"),
        )
    }

    /// Legend ramp and scale for the active metric variant.
    ///
    /// The ramp is derived from the base colormap name with the reversal
    /// applied locally — the opposite half of the suffix contract from
    /// [`tile_descriptor`](Self::tile_descriptor).
    pub fn legend(&self, state: &SelectionState) -> Option<Legend> {
        let variant = self.variant(state)?;
        let (min, max) = variant.rescale_bounds()?;
        let colormap = Colormap::new(variant.colormap.clone());
        Some(Legend {
            ramp: colormap.legend_ramp(),
            scale: LegendScale::new(min, max),
            title: variant.description.clone(),
        })
    }

    fn point_descriptor(
        &self,
        lon: f64,
        lat: f64,
        data_path: &str,
        variable: &str,
    ) -> ResourceDescriptor {
        ResourceDescriptor::new(
            ResourceKind::Point,
            &self.endpoints.tile_base,
            format!("/point/{},{}", lon, lat),
        )
        .with_param("url", data_path)
        .with_param("variable", variable)
    }
}
