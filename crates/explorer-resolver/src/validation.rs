//! Pre-dispatch validation for the catalog search form.
//!
//! A search with empty required fields is blocked before any request is
//! built; the error names each missing field so the form can flag them
//! individually.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Form fields that must be non-empty before a search dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Models,
    Variables,
    Boundaries,
    Scenarios,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Models => "models",
            Field::Variables => "variables",
            Field::Boundaries => "boundaries",
            Field::Scenarios => "scenarios",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation failure listing every missing field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required selection fields: {}", self.field_names())]
pub struct ValidationError {
    pub missing: Vec<Field>,
}

impl ValidationError {
    pub fn new(missing: Vec<Field>) -> Self {
        Self { missing }
    }

    /// Whether a specific field was flagged.
    pub fn has(&self, field: Field) -> bool {
        self.missing.contains(&field)
    }

    fn field_names(&self) -> String {
        self.missing
            .iter()
            .map(Field::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}
