//! The fetch orchestrator: dispatches resolved descriptors, shapes request
//! rates, and guarantees that only the response matching the latest
//! selection is allowed to update render state.
//!
//! The map sync is a sequential two-phase pipeline. The GWL enumeration for
//! the selected metric/value-type resolves first and re-anchors the
//! selection's warming-level index; only then is the tile request built, so
//! a tile can never be requested against a warming level the new metric
//! does not have.

use std::sync::Arc;

use metrics::counter;
use tokio::sync::{watch, Mutex};
use tokio::time::{sleep_until, Duration, Instant};
use tracing::{debug, info, warn};

use explorer_common::{ExplorerResult, GwlList};
use explorer_resolver::{
    EnumerationKey, Resolver, ResourceDescriptor, SelectionState, ValidationError,
};

use crate::api::{
    FetchApi, InfoResponse, ModelAssets, PointResponse, PointValues, SearchResponse, TileJson,
};
use crate::slot::{Ledger, Slot, SlotData, SlotView, Ticket};
use crate::throttle::{Decision, Throttle};

/// Orchestrator tuning knobs.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Coalescing window for point-query triggers (default 100ms).
    pub point_throttle: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            point_throttle: Duration::from_millis(100),
        }
    }
}

/// Cached dependent enumeration: which metric/value-type the current GWL
/// list belongs to.
#[derive(Debug, Default)]
struct GwlCache {
    key: Option<EnumerationKey>,
    list: GwlList,
}

/// Latest point trigger; throttled fires always use the newest one so the
/// final pointer position of a burst is never dropped.
#[derive(Debug, Clone)]
struct PointArgs {
    lon: f64,
    lat: f64,
    state: SelectionState,
}

/// Per-slot fetch coordination around a [`FetchApi`] transport.
pub struct Orchestrator {
    api: Arc<dyn FetchApi>,
    resolver: Resolver,
    ledger: Ledger,
    gwl_cache: Mutex<GwlCache>,
    throttle: Mutex<Throttle>,
    point_args: Mutex<Option<PointArgs>>,
    tile_tx: watch::Sender<SlotView<TileJson>>,
    gwl_tx: watch::Sender<SlotView<GwlList>>,
    point_tx: watch::Sender<SlotView<PointValues>>,
    search_tx: watch::Sender<SlotView<Vec<ModelAssets>>>,
}

impl Orchestrator {
    pub fn new(api: Arc<dyn FetchApi>, resolver: Resolver, config: OrchestratorConfig) -> Arc<Self> {
        let (tile_tx, _) = watch::channel(SlotView::default());
        let (gwl_tx, _) = watch::channel(SlotView::default());
        let (point_tx, _) = watch::channel(SlotView::default());
        let (search_tx, _) = watch::channel(SlotView::default());
        Arc::new(Self {
            api,
            resolver,
            ledger: Ledger::default(),
            gwl_cache: Mutex::new(GwlCache::default()),
            throttle: Mutex::new(Throttle::new(config.point_throttle)),
            point_args: Mutex::new(None),
            tile_tx,
            gwl_tx,
            point_tx,
            search_tx,
        })
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn tile_view(&self) -> watch::Receiver<SlotView<TileJson>> {
        self.tile_tx.subscribe()
    }

    pub fn gwl_view(&self) -> watch::Receiver<SlotView<GwlList>> {
        self.gwl_tx.subscribe()
    }

    pub fn point_view(&self) -> watch::Receiver<SlotView<PointValues>> {
        self.point_tx.subscribe()
    }

    pub fn search_view(&self) -> watch::Receiver<SlotView<Vec<ModelAssets>>> {
        self.search_tx.subscribe()
    }

    /// Bring the map slots in line with the selection.
    ///
    /// Phase one refreshes the GWL enumeration when the metric or value
    /// type changed, re-anchoring `state.gwl_index` to the previously
    /// selected literal level (or the default when it disappeared). Phase
    /// two dispatches the tile request. Called on every discrete selection
    /// change; superseded in-flight requests are discarded on arrival.
    pub async fn sync_map(&self, state: &mut SelectionState) {
        let key = Resolver::enumeration_key(state);
        let cached = {
            let cache = self.gwl_cache.lock().await;
            (cache.key == Some(key)).then(|| cache.list.clone())
        };
        let list = match cached {
            Some(list) => {
                // A refresh for a different selection may still be in
                // flight. Recording a fresh ledger entry here makes that
                // response stale on arrival, so it can never overwrite the
                // cached list the current selection resolves against.
                if let Some(descriptor) = self.resolver.gwl_descriptor(state) {
                    self.ledger.dispatch(Slot::GwlList, &descriptor.cache_key());
                }
                self.gwl_tx.send_modify(|view| {
                    view.loading = false;
                    view.data = SlotData::Ready(list.clone());
                    view.error = None;
                });
                list
            }
            None => {
                if !self.refresh_gwl_list(state, key).await {
                    return;
                }
                self.gwl_cache.lock().await.list.clone()
            }
        };
        let Some(descriptor) = self.resolver.tile_descriptor(state, &list) else {
            // Nothing renderable for this selection; clear the layer.
            self.tile_tx.send_modify(|view| {
                view.loading = false;
                view.data = SlotData::Empty;
                view.error = None;
            });
            return;
        };

        self.run_slot(Slot::Tile, &descriptor, &self.tile_tx, |value| {
            let tilejson: TileJson = serde_json::from_value(value)?;
            Ok(SlotData::Ready(tilejson))
        })
        .await;
    }

    /// Phase one of [`sync_map`](Self::sync_map): fetch the GWL list for
    /// the new metric/value-type. Returns false when the tile dispatch must
    /// not proceed (fetch failed, went stale, or the selection has no data).
    async fn refresh_gwl_list(&self, state: &mut SelectionState, key: EnumerationKey) -> bool {
        let Some(descriptor) = self.resolver.gwl_descriptor(state) else {
            self.gwl_tx.send_modify(|view| {
                view.loading = false;
                view.data = SlotData::Empty;
                view.error = None;
            });
            return false;
        };

        let ticket = self.begin(Slot::GwlList, &descriptor);
        self.gwl_tx.send_modify(|view| view.loading = true);

        let outcome = self.api.fetch_json(&descriptor).await.and_then(|value| {
            let info: InfoResponse = serde_json::from_value(value)?;
            Ok(info.gwl_list())
        });

        if !self.ledger.is_current(&ticket) {
            self.note_stale(&ticket);
            return false;
        }

        match outcome {
            Ok(list) => {
                let mut cache = self.gwl_cache.lock().await;
                let previous = if cache.key.is_some() {
                    cache.list.get(state.gwl_index).cloned()
                } else {
                    None
                };
                state.gwl_index = list.anchor_index(previous.as_ref());
                cache.key = Some(key);
                cache.list = list.clone();
                drop(cache);

                debug!(
                    levels = list.len(),
                    gwl_index = state.gwl_index,
                    "GWL enumeration refreshed"
                );
                self.gwl_tx.send_modify(|view| {
                    view.loading = false;
                    view.data = SlotData::Ready(list);
                    view.error = None;
                });
                true
            }
            Err(e) => {
                self.note_failure(Slot::GwlList, &e);
                self.gwl_tx.send_modify(|view| {
                    view.loading = false;
                    view.error = Some(e.to_string());
                });
                false
            }
        }
    }

    /// Point-query trigger, fired on pointer movement over the map.
    ///
    /// Bursts are coalesced by the throttle: the first trigger dispatches
    /// immediately and opens a window; triggers inside the window only
    /// update the buffered arguments, which the trailing edge then fires
    /// with. Teardown via [`shutdown`](Self::shutdown) cancels any pending
    /// trailing fire.
    pub async fn trigger_point(self: &Arc<Self>, lon: f64, lat: f64, state: &SelectionState) {
        *self.point_args.lock().await = Some(PointArgs {
            lon,
            lat,
            state: state.clone(),
        });

        let decision = self.throttle.lock().await.offer(Instant::now());
        match decision {
            Decision::FireLeading { window_end } => {
                self.fire_point().await;
                let orchestrator = Arc::clone(self);
                tokio::spawn(async move { orchestrator.drive_trailing(window_end).await });
            }
            Decision::Buffered => {}
        }
    }

    /// Trailing-edge driver spawned per throttle window.
    async fn drive_trailing(self: Arc<Self>, mut window_end: Instant) {
        loop {
            sleep_until(window_end).await;
            let next = self.throttle.lock().await.take_trailing(Instant::now());
            match next {
                Some(end) => {
                    self.fire_point().await;
                    window_end = end;
                }
                None => break,
            }
        }
    }

    /// Dispatch the point queries for the latest buffered trigger.
    async fn fire_point(&self) {
        let Some(args) = self.point_args.lock().await.clone() else {
            return;
        };
        let Some(plan) = self.resolver.point_plan(args.lon, args.lat, &args.state) else {
            self.point_tx.send_modify(|view| {
                view.loading = false;
                view.data = SlotData::Empty;
            });
            return;
        };

        // The rendered value depends on the warming-level position as well
        // as the query itself, so the position is part of the identity.
        let key = format!("{}@gwl={}", plan.mean.cache_key(), plan.gwl_index);
        let ticket = self.ledger.dispatch(Slot::Point, &key);
        counter!("explorer_dispatches_total", "slot" => Slot::Point.as_str()).increment(1);
        self.point_tx.send_modify(|view| view.loading = true);
        debug!(slot = %Slot::Point, key = %ticket.cache_key, "Dispatching request");

        let mean_fut = self.fetch_point_value(&plan.mean, plan.gwl_index);
        let min_fut = async {
            match &plan.min {
                Some(descriptor) => Some(self.fetch_point_value(descriptor, plan.gwl_index).await),
                None => None,
            }
        };
        let max_fut = async {
            match &plan.max {
                Some(descriptor) => Some(self.fetch_point_value(descriptor, plan.gwl_index).await),
                None => None,
            }
        };
        let (mean, min, max) = futures::join!(mean_fut, min_fut, max_fut);

        let outcome = mean.and_then(|mean| {
            let values = PointValues {
                mean,
                min: min.transpose()?.flatten(),
                max: max.transpose()?.flatten(),
            };
            Ok(if values.is_no_data() {
                SlotData::NoData
            } else {
                SlotData::Ready(values)
            })
        });
        self.finish_slot(ticket, &self.point_tx, outcome);
    }

    async fn fetch_point_value(
        &self,
        descriptor: &ResourceDescriptor,
        gwl_index: usize,
    ) -> ExplorerResult<Option<f64>> {
        let value = self.api.fetch_json(descriptor).await?;
        let response: PointResponse = serde_json::from_value(value)?;
        Ok(response.value_at(gwl_index))
    }

    /// Point query for the renewables drought data, dispatched on explicit
    /// click rather than pointer movement, so it bypasses the throttle.
    /// The popup shows the value at the currently selected warming level.
    pub async fn query_renewables_point(&self, lon: f64, lat: f64, state: &SelectionState) {
        let descriptor = self.resolver.renewables_point_descriptor(lon, lat, state);
        let gwl_index = state.gwl_index;
        self.run_slot(Slot::Point, &descriptor, &self.point_tx, move |value| {
            let response: PointResponse = serde_json::from_value(value)?;
            let values = PointValues {
                mean: response.value_at(gwl_index),
                min: None,
                max: None,
            };
            Ok(if values.is_no_data() {
                SlotData::NoData
            } else {
                SlotData::Ready(values)
            })
        })
        .await;
    }

    /// Catalog search, dispatched only on explicit form submit.
    ///
    /// Validation runs before anything touches the network: with required
    /// fields empty this returns the per-field error and no request is
    /// issued. Returns `Ok(true)` when a response was accepted and
    /// rendered.
    pub async fn submit_search(&self, state: &SelectionState) -> Result<bool, ValidationError> {
        let descriptor = self.resolver.search_descriptor(state)?;
        let variables = state.selected_variables.clone();
        let accepted = self
            .run_slot(Slot::Search, &descriptor, &self.search_tx, move |value| {
                let response: SearchResponse = serde_json::from_value(value)?;
                let assets = response.model_assets(&variables);
                Ok(if assets.is_empty() {
                    SlotData::NoData
                } else {
                    SlotData::Ready(assets)
                })
            })
            .await;
        Ok(accepted)
    }

    /// Teardown. Pending trailing fires are cancelled and any late-arriving
    /// response becomes a no-op.
    pub async fn shutdown(&self) {
        self.ledger.close();
        self.throttle.lock().await.cancel();
        info!("Fetch orchestrator shut down");
    }

    /// Dispatch one guarded request for a slot and publish the outcome.
    async fn run_slot<T, F>(
        &self,
        slot: Slot,
        descriptor: &ResourceDescriptor,
        tx: &watch::Sender<SlotView<T>>,
        decode: F,
    ) -> bool
    where
        F: FnOnce(serde_json::Value) -> ExplorerResult<SlotData<T>>,
    {
        let ticket = self.begin(slot, descriptor);
        tx.send_modify(|view| view.loading = true);
        let outcome = self.api.fetch_json(descriptor).await.and_then(decode);
        self.finish_slot(ticket, tx, outcome)
    }

    fn begin(&self, slot: Slot, descriptor: &ResourceDescriptor) -> Ticket {
        let ticket = self.ledger.dispatch(slot, &descriptor.cache_key());
        counter!("explorer_dispatches_total", "slot" => slot.as_str()).increment(1);
        debug!(slot = %slot, key = %ticket.cache_key, "Dispatching request");
        ticket
    }

    /// Accept or discard a response that has arrived for `ticket`.
    ///
    /// Stale responses are dropped silently: not rendered, not an error.
    /// Failures clear the loading flag but leave previously rendered data
    /// in place.
    fn finish_slot<T>(
        &self,
        ticket: Ticket,
        tx: &watch::Sender<SlotView<T>>,
        outcome: ExplorerResult<SlotData<T>>,
    ) -> bool {
        if !self.ledger.is_current(&ticket) {
            self.note_stale(&ticket);
            return false;
        }
        match outcome {
            Ok(data) => {
                tx.send_modify(|view| {
                    view.loading = false;
                    view.data = data;
                    view.error = None;
                });
                true
            }
            Err(e) => {
                self.note_failure(ticket.slot, &e);
                tx.send_modify(|view| {
                    view.loading = false;
                    view.error = Some(e.to_string());
                });
                false
            }
        }
    }

    fn note_stale(&self, ticket: &Ticket) {
        debug!(
            slot = %ticket.slot,
            dispatched = %ticket.cache_key,
            current = ?self.ledger.current_key(ticket.slot),
            "Discarding stale response"
        );
        counter!("explorer_stale_discards_total", "slot" => ticket.slot.as_str()).increment(1);
    }

    fn note_failure(&self, slot: Slot, error: &explorer_common::ExplorerError) {
        warn!(slot = %slot, error = %error, "Request failed");
        counter!("explorer_failures_total", "slot" => slot.as_str()).increment(1);
    }
}
