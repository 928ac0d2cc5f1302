//! Fetch orchestration for the climate-explorer dashboard.
//!
//! Issues the HTTP requests resolved by `explorer-resolver`, throttles
//! high-frequency point triggers, and enforces last-writer-wins per slot so
//! out-of-order responses never overwrite newer data.

pub mod api;
pub mod client;
pub mod orchestrator;
pub mod slot;
pub mod throttle;

pub use api::{
    Asset, AssetLink, FetchApi, InfoResponse, ModelAssets, PointResponse, PointValues,
    SearchFeature, SearchResponse, TileJson,
};
pub use client::{FetcherConfig, HttpFetcher};
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use slot::{Ledger, Slot, SlotData, SlotView, Ticket};
pub use throttle::{Decision, Throttle};
