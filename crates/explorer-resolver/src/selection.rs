//! The authoritative view-model: every user-adjustable parameter.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use explorer_common::ValueType;

/// Renewable resource families the renewables visualizer can query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Solar,
    Wind,
}

/// Solar photovoltaic configuration codes.
pub const SOLAR_UTILITY: &str = "srdu";
pub const SOLAR_DISTRIBUTED: &str = "srdd";
/// Wind installation codes (near-term / far-term hub heights).
pub const WIND_NEAR: &str = "wrdn";
pub const WIND_FAR: &str = "wrdf";

/// Scenario seeded into new selections; the only experiment the hosted
/// datasets currently carry.
pub const DEFAULT_SCENARIO: &str = "ssp370";

/// Snapshot of every user-chosen parameter.
///
/// Holds no derived values; descriptors are recomputed from a snapshot by
/// the [`Resolver`](crate::Resolver). Mutated only by user-event handlers on
/// the UI thread, so two snapshots compare by value (`PartialEq`).
///
/// Selection sets use `BTreeSet` so iteration order — and therefore every
/// derived cache key — is deterministic regardless of insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionState {
    pub metric_id: usize,
    pub value_type: ValueType,
    /// Index into the GWL list currently associated with the selected
    /// metric/value-type. Only valid after that list has been fetched.
    pub gwl_index: usize,
    pub selected_models: BTreeSet<String>,
    pub selected_scenarios: BTreeSet<String>,
    pub selected_variables: BTreeSet<String>,
    pub selected_boundaries: BTreeSet<String>,
    pub resource_type: ResourceType,
    /// Renewables configuration code (`srdu`/`srdd`/`wrdn`/`wrdf`).
    pub configuration: String,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self {
            metric_id: 0,
            value_type: ValueType::Abs,
            gwl_index: 0,
            selected_models: BTreeSet::new(),
            selected_scenarios: BTreeSet::from([DEFAULT_SCENARIO.to_string()]),
            selected_variables: BTreeSet::new(),
            selected_boundaries: BTreeSet::new(),
            resource_type: ResourceType::Solar,
            configuration: SOLAR_UTILITY.to_string(),
        }
    }
}

impl SelectionState {
    /// Return to defaults. Used when switching tools where prior selections
    /// carry no meaning (e.g. solar to wind).
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn set_metric(&mut self, metric_id: usize) {
        self.metric_id = metric_id;
    }

    pub fn set_value_type(&mut self, value_type: ValueType) {
        self.value_type = value_type;
    }

    pub fn set_gwl_index(&mut self, gwl_index: usize) {
        self.gwl_index = gwl_index;
    }

    /// Switch resource family, resetting the configuration code to that
    /// family's default since codes are not transferable between families.
    pub fn set_resource_type(&mut self, resource_type: ResourceType) {
        self.resource_type = resource_type;
        self.configuration = match resource_type {
            ResourceType::Solar => SOLAR_UTILITY.to_string(),
            ResourceType::Wind => WIND_NEAR.to_string(),
        };
    }

    pub fn set_configuration(&mut self, configuration: impl Into<String>) {
        self.configuration = configuration.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semantic_equality_ignores_insertion_order() {
        let mut a = SelectionState::default();
        a.selected_models.insert("EC-Earth3".to_string());
        a.selected_models.insert("MIROC6".to_string());

        let mut b = SelectionState::default();
        b.selected_models.insert("MIROC6".to_string());
        b.selected_models.insert("EC-Earth3".to_string());

        assert_eq!(a, b);
    }

    #[test]
    fn test_switching_resource_resets_configuration() {
        let mut state = SelectionState::default();
        state.set_configuration(SOLAR_DISTRIBUTED);
        state.set_resource_type(ResourceType::Wind);
        assert_eq!(state.configuration, WIND_NEAR);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut state = SelectionState::default();
        state.set_metric(2);
        state.selected_boundaries.insert("Alameda".to_string());
        state.reset();
        assert_eq!(state, SelectionState::default());
    }
}
