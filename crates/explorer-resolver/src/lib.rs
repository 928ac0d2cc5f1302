//! Parameter resolution for the climate-explorer dashboard.
//!
//! Turns a [`SelectionState`] snapshot into concrete remote-resource
//! descriptors (tile metadata, point queries, GWL enumeration, catalog
//! search). Resolution is pure and infallible: a selection with no usable
//! data simply yields no descriptor for that slot.

pub mod descriptor;
pub mod resolver;
pub mod search;
pub mod selection;
pub mod validation;

pub use descriptor::{ResourceDescriptor, ResourceKind};
pub use resolver::{Endpoints, EnumerationKey, Legend, PointPlan, Resolver};
pub use selection::{ResourceType, SelectionState};
pub use validation::{Field, ValidationError};
