//! Global warming level (GWL) lists.
//!
//! GWL lists are metric-dependent: the set of valid warming levels for one
//! metric's data array is discovered from the remote metadata endpoint, so
//! switching metrics means the previously selected level has to be re-located
//! in the new list by its literal value, not by its old index.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Canonical default warming level (degrees C above pre-industrial).
pub const DEFAULT_GWL: f64 = 1.5;

/// One warming level as delivered by the metadata endpoint.
///
/// The endpoint mixes numbers and strings across datasets, so the literal
/// form is preserved for the wire (the tile `datetime` parameter) and a
/// numeric view is derived for comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GwlLevel {
    Number(f64),
    Text(String),
}

impl GwlLevel {
    /// Numeric value, if the literal parses as one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            GwlLevel::Number(n) => Some(*n),
            GwlLevel::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Literal form for query parameters.
    pub fn literal(&self) -> String {
        match self {
            GwlLevel::Number(n) => format_level(*n),
            GwlLevel::Text(s) => s.clone(),
        }
    }

    /// Whether two levels denote the same warming level.
    ///
    /// Compares numerically when both sides parse, byte-wise otherwise.
    pub fn same_level(&self, other: &GwlLevel) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => (a - b).abs() < f64::EPSILON,
            _ => self.literal() == other.literal(),
        }
    }
}

/// Format a numeric level the way the upstream datasets spell it (no
/// trailing ".0" on whole numbers, otherwise shortest float form).
fn format_level(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// An ordered list of warming levels valid for one metric/value-type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GwlList {
    pub levels: Vec<GwlLevel>,
}

impl GwlList {
    pub fn new(levels: Vec<GwlLevel>) -> Self {
        Self { levels }
    }

    /// Convenience constructor from plain numbers.
    pub fn from_numbers(values: &[f64]) -> Self {
        Self::new(values.iter().copied().map(GwlLevel::Number).collect())
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&GwlLevel> {
        self.levels.get(index)
    }

    /// Index of the level closest to [`DEFAULT_GWL`].
    ///
    /// Levels that do not parse numerically are skipped; if nothing parses,
    /// index 0 is the fallback.
    pub fn default_index(&self) -> usize {
        self.levels
            .iter()
            .enumerate()
            .filter_map(|(i, l)| l.as_f64().map(|v| (i, (v - DEFAULT_GWL).abs())))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    /// Re-anchor a selection from a previous list onto this list.
    ///
    /// Locates the previous literal level in the new list; when the level no
    /// longer exists (or there was no previous level), falls back to
    /// [`default_index`](Self::default_index) and logs the disappearance.
    pub fn anchor_index(&self, previous: Option<&GwlLevel>) -> usize {
        if let Some(prev) = previous {
            if let Some(index) = self.levels.iter().position(|l| l.same_level(prev)) {
                return index;
            }
            warn!(
                level = %prev.literal(),
                "Previously selected warming level is not in the new list, falling back to default"
            );
        }
        self.default_index()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reanchor_preserves_literal_value() {
        let old = GwlList::from_numbers(&[0.8, 1.5, 2.0, 3.0]);
        let selected = old.get(1).cloned().unwrap(); // 1.5

        let new = GwlList::from_numbers(&[1.5, 2.0, 2.5, 3.0]);
        assert_eq!(new.anchor_index(Some(&selected)), 0);
    }

    #[test]
    fn test_reanchor_falls_back_to_closest_default() {
        let old = GwlList::from_numbers(&[0.8, 1.5, 2.0, 3.0]);
        let selected = old.get(0).cloned().unwrap(); // 0.8

        let new = GwlList::from_numbers(&[2.0, 2.5, 3.0]);
        // 0.8 is gone; closest to 1.5 is 2.0 at index 0.
        assert_eq!(new.anchor_index(Some(&selected)), 0);
    }

    #[test]
    fn test_default_index_picks_closest_to_one_point_five() {
        let list = GwlList::from_numbers(&[0.8, 1.2, 2.0, 3.0]);
        assert_eq!(list.default_index(), 1);

        let exact = GwlList::from_numbers(&[1.0, 1.5, 2.0]);
        assert_eq!(exact.default_index(), 1);
    }

    #[test]
    fn test_mixed_literal_forms_compare_numerically() {
        let number = GwlLevel::Number(1.5);
        let text = GwlLevel::Text("1.5".to_string());
        assert!(number.same_level(&text));

        let list = GwlList::new(vec![GwlLevel::Text("1.5".to_string()), GwlLevel::Number(2.0)]);
        assert_eq!(list.anchor_index(Some(&number)), 0);
    }

    #[test]
    fn test_literal_form_roundtrip() {
        assert_eq!(GwlLevel::Number(2.0).literal(), "2");
        assert_eq!(GwlLevel::Number(1.5).literal(), "1.5");
        assert_eq!(GwlLevel::Text("1.50".to_string()).literal(), "1.50");
    }

    #[test]
    fn test_anchor_on_empty_previous() {
        let list = GwlList::from_numbers(&[0.8, 1.5, 2.0]);
        assert_eq!(list.anchor_index(None), 1);
    }

    #[test]
    fn test_deserialize_mixed_payload() {
        let list: GwlList = serde_json::from_str(r#"{"levels":[0.8,"1.5",2.0]}"#).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list.get(1).unwrap().as_f64(), Some(1.5));
    }
}
