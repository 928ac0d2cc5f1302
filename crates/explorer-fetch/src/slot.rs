//! Per-slot dispatch bookkeeping and the render-facing slot views.
//!
//! Each logical channel (tile, point, gwl list, search) carries at most one
//! accepted in-flight request. The ledger hands out a sequence-numbered
//! ticket at dispatch time; a response is accepted only if its ticket is
//! still the latest for the slot, so a later dispatch always wins over an
//! earlier one regardless of arrival order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// The fixed set of logical request channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Tile,
    Point,
    GwlList,
    Search,
}

impl Slot {
    pub fn as_str(&self) -> &'static str {
        match self {
            Slot::Tile => "tile",
            Slot::Point => "point",
            Slot::GwlList => "gwl_list",
            Slot::Search => "search",
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload state of a slot. `NoData` is a terminal outcome in its own
/// right: the request succeeded and there is nothing to show at this
/// location/selection, which render targets must say explicitly rather
/// than drawing an empty chart.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SlotData<T> {
    #[default]
    Empty,
    Ready(T),
    NoData,
}

impl<T> SlotData<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, SlotData::Ready(_))
    }

    pub fn as_ready(&self) -> Option<&T> {
        match self {
            SlotData::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// What a render target sees for one slot.
///
/// On failure `error` is set and `data` keeps the previously rendered
/// payload; a failed refresh never wipes the screen.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotView<T> {
    pub loading: bool,
    pub data: SlotData<T>,
    pub error: Option<String>,
}

impl<T> Default for SlotView<T> {
    fn default() -> Self {
        Self {
            loading: false,
            data: SlotData::Empty,
            error: None,
        }
    }
}

/// Dispatch receipt. Holds the sequence number the response will be
/// checked against on arrival.
#[derive(Debug, Clone)]
pub struct Ticket {
    pub slot: Slot,
    pub seq: u64,
    pub cache_key: String,
}

#[derive(Debug, Default)]
struct LedgerEntry {
    seq: u64,
    cache_key: String,
}

/// Last-writer-wins dispatch ledger.
///
/// Closed on teardown, after which every outstanding ticket reads as stale
/// and late arrivals become no-ops.
#[derive(Debug, Default)]
pub struct Ledger {
    entries: Mutex<HashMap<Slot, LedgerEntry>>,
    closed: AtomicBool,
}

impl Ledger {
    /// Record a new dispatch, superseding any request still in flight for
    /// the slot.
    pub fn dispatch(&self, slot: Slot, cache_key: &str) -> Ticket {
        let mut entries = self.entries.lock().expect("ledger mutex poisoned");
        let entry = entries.entry(slot).or_default();
        entry.seq += 1;
        entry.cache_key = cache_key.to_string();
        Ticket {
            slot,
            seq: entry.seq,
            cache_key: cache_key.to_string(),
        }
    }

    /// Whether a ticket still names the latest dispatch for its slot.
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        if self.closed.load(Ordering::Acquire) {
            return false;
        }
        let entries = self.entries.lock().expect("ledger mutex poisoned");
        entries
            .get(&ticket.slot)
            .map(|entry| entry.seq == ticket.seq)
            .unwrap_or(false)
    }

    /// Cache key of the latest dispatch for a slot, for stale-mismatch logs.
    pub fn current_key(&self, slot: Slot) -> Option<String> {
        let entries = self.entries.lock().expect("ledger mutex poisoned");
        entries.get(&slot).map(|entry| entry.cache_key.clone())
    }

    /// Teardown: every outstanding ticket goes stale.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_dispatch_wins() {
        let ledger = Ledger::default();
        let first = ledger.dispatch(Slot::Tile, "tile:a");
        let second = ledger.dispatch(Slot::Tile, "tile:b");

        assert!(!ledger.is_current(&first));
        assert!(ledger.is_current(&second));
        assert_eq!(ledger.current_key(Slot::Tile).unwrap(), "tile:b");
    }

    #[test]
    fn test_slots_are_independent() {
        let ledger = Ledger::default();
        let tile = ledger.dispatch(Slot::Tile, "tile:a");
        let point = ledger.dispatch(Slot::Point, "point:a");
        ledger.dispatch(Slot::Tile, "tile:b");

        assert!(!ledger.is_current(&tile));
        assert!(ledger.is_current(&point));
    }

    #[test]
    fn test_close_invalidates_everything() {
        let ledger = Ledger::default();
        let ticket = ledger.dispatch(Slot::Search, "search:a");
        ledger.close();
        assert!(!ledger.is_current(&ticket));
    }

    #[test]
    fn test_default_view_is_idle_and_empty() {
        let view: SlotView<u32> = SlotView::default();
        assert!(!view.loading);
        assert_eq!(view.data, SlotData::Empty);
        assert!(view.error.is_none());
        assert!(!view.data.is_ready());
    }
}
