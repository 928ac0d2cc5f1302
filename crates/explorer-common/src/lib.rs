//! Common types shared across the climate-explorer workspace.

pub mod colormap;
pub mod error;
pub mod gwl;
pub mod metric;

pub use colormap::{Colormap, LegendRamp, LegendScale, Rgb};
pub use error::{ExplorerError, ExplorerResult};
pub use gwl::{GwlLevel, GwlList, DEFAULT_GWL};
pub use metric::{Metric, MetricCatalog, ValueType, VariantPaths};
