//! Orchestrator behavior under out-of-order arrivals, throttled bursts,
//! blocked dispatches and teardown, driven by a mock transport with a
//! paused clock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::{advance, Duration};

use explorer_common::{ExplorerError, ExplorerResult, ValueType};
use explorer_fetch::{FetchApi, Orchestrator, OrchestratorConfig, SlotData};
use explorer_resolver::{Field, ResourceDescriptor, SelectionState};
use test_utils::{
    info_json, null_point_json, point_json, sample_resolver, search_json, tilejson_json,
};

type Responder =
    dyn Fn(&ResourceDescriptor) -> (Duration, ExplorerResult<Value>) + Send + Sync + 'static;

/// Transport double: records every request and answers from a closure,
/// optionally after a simulated network delay.
struct MockApi {
    respond: Box<Responder>,
    calls: Mutex<Vec<String>>,
}

impl MockApi {
    fn new<F>(respond: F) -> Arc<Self>
    where
        F: Fn(&ResourceDescriptor) -> (Duration, ExplorerResult<Value>) + Send + Sync + 'static,
    {
        Arc::new(Self {
            respond: Box::new(respond),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn count_matching(&self, needle: &str) -> usize {
        self.calls()
            .iter()
            .filter(|key| key.contains(needle))
            .count()
    }
}

#[async_trait]
impl FetchApi for MockApi {
    async fn fetch_json(&self, descriptor: &ResourceDescriptor) -> ExplorerResult<Value> {
        self.calls.lock().unwrap().push(descriptor.cache_key());
        let (delay, result) = (self.respond)(descriptor);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

fn orchestrator(api: Arc<MockApi>) -> Arc<Orchestrator> {
    Orchestrator::new(api, sample_resolver(), OrchestratorConfig::default())
}

fn search_state(boundary: &str) -> SelectionState {
    let mut state = SelectionState::default();
    state.selected_models.insert("EC-Earth3".to_string());
    state.selected_variables.insert("tasmax".to_string());
    state.selected_boundaries.insert(boundary.to_string());
    state
}

/// Search payload whose single feature is tagged with the boundary that
/// produced it, so tests can tell responses apart.
fn tagged_search_json(tag: &str) -> Value {
    serde_json::json!({
        "features": [{
            "id": format!("model-{}", tag),
            "assets": { "tasmax": { "href": format!("s3://b/{}/tasmax.nc", tag) } }
        }]
    })
}

#[tokio::test(start_paused = true)]
async fn test_stale_responses_are_never_rendered() {
    // Three dispatches whose responses arrive in reverse order: the last
    // dispatch answers fastest. Only its payload may ever reach the view.
    let api = MockApi::new(|descriptor| {
        let filter = descriptor
            .params
            .iter()
            .find(|(k, _)| k == "filter")
            .map(|(_, v)| v.clone())
            .unwrap_or_default();
        for (tag, delay_ms) in [("C1", 300), ("C2", 200), ("C3", 100)] {
            if filter.contains(&format!("countyname='{}'", tag)) {
                return (
                    Duration::from_millis(delay_ms),
                    Ok(tagged_search_json(tag)),
                );
            }
        }
        panic!("unexpected search filter: {}", filter);
    });
    let orchestrator = orchestrator(api.clone());

    let rendered = Arc::new(Mutex::new(Vec::<String>::new()));
    let mut rx = orchestrator.search_view();
    let recorder = {
        let rendered = rendered.clone();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let view = rx.borrow_and_update().clone();
                if let SlotData::Ready(models) = view.data {
                    rendered.lock().unwrap().push(models[0].model.clone());
                }
            }
        })
    };

    let mut tasks = Vec::new();
    for tag in ["C1", "C2", "C3"] {
        let orchestrator = orchestrator.clone();
        let state = search_state(tag);
        tasks.push(tokio::spawn(async move {
            orchestrator.submit_search(&state).await
        }));
        // Let the task reach its network await so dispatch order is fixed.
        tokio::task::yield_now().await;
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let view = orchestrator.search_view().borrow().clone();
    let models = view.data.as_ready().expect("final view should be ready");
    assert_eq!(models[0].model, "model-C3");
    assert!(view.error.is_none());
    assert!(!view.loading);

    drop(orchestrator);
    recorder.await.unwrap();
    let rendered = rendered.lock().unwrap().clone();
    assert!(
        rendered.iter().all(|model| model == "model-C3"),
        "superseded payloads were rendered: {:?}",
        rendered
    );
    assert_eq!(api.count_matching("search:"), 3);
}

/// Mock for the map pipeline: metadata lists per variable, tilejson tagged
/// with the requested datetime.
fn map_api() -> Arc<MockApi> {
    MockApi::new(|descriptor| {
        let param = |key: &str| {
            descriptor
                .params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
                .unwrap_or_default()
        };
        let key = descriptor.cache_key();
        if key.starts_with("gwl_list:") {
            let levels: &[f64] = match param("variable").as_str() {
                "TX99p" => &[0.8, 1.5, 2.0, 3.0],
                "R99p" => &[1.5, 2.0, 2.5, 3.0],
                "ffwige50" => &[3.0, 2.0, 2.5],
                other => panic!("unexpected variable: {}", other),
            };
            (Duration::ZERO, Ok(info_json(levels)))
        } else if key.starts_with("tile:") {
            (Duration::ZERO, Ok(tilejson_json(&param("datetime"))))
        } else {
            panic!("unexpected request: {}", key);
        }
    })
}

#[tokio::test(start_paused = true)]
async fn test_enumeration_resolves_before_tile_dispatch() {
    let api = map_api();
    let orchestrator = orchestrator(api.clone());
    let mut state = SelectionState::default();

    orchestrator.sync_map(&mut state).await;

    // First load anchors to the level closest to 1.5.
    assert_eq!(state.gwl_index, 1);
    let calls = api.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].starts_with("gwl_list:"), "info must go first");
    assert!(calls[1].starts_with("tile:"));
    assert!(calls[1].contains("datetime=1.5"));

    let view = orchestrator.tile_view().borrow().clone();
    let tilejson = view.data.as_ready().expect("tile view should be ready");
    assert!(tilejson.tiles[0].contains("/1.5/"));
}

#[tokio::test(start_paused = true)]
async fn test_metric_switch_reanchors_by_literal_level() {
    let api = map_api();
    let orchestrator = orchestrator(api.clone());
    let mut state = SelectionState::default();

    orchestrator.sync_map(&mut state).await;
    assert_eq!(state.gwl_index, 1); // 1.5 in [0.8, 1.5, 2.0, 3.0]

    state.set_metric(1);
    orchestrator.sync_map(&mut state).await;

    // The literal 1.5 sits at index 0 of the new list.
    assert_eq!(state.gwl_index, 0);
    let calls = api.calls();
    assert!(calls.last().unwrap().contains("datetime=1.5"));
}

#[tokio::test(start_paused = true)]
async fn test_missing_level_falls_back_to_closest_default() {
    let api = map_api();
    let orchestrator = orchestrator(api.clone());
    let mut state = SelectionState::default();

    orchestrator.sync_map(&mut state).await;
    state.set_gwl_index(0); // 0.8

    // Fire weather only has delta paths and its list lacks 0.8.
    state.set_metric(2);
    state.set_value_type(ValueType::Del);
    orchestrator.sync_map(&mut state).await;

    // Closest to 1.5 in [3.0, 2.0, 2.5] is 2.0 at index 1.
    assert_eq!(state.gwl_index, 1);
    assert!(api.calls().last().unwrap().contains("datetime=2"));
}

#[tokio::test(start_paused = true)]
async fn test_cached_enumeration_supersedes_inflight_refresh() {
    // Metric 0's enumeration is cached; switch to metric 1 (whose /info is
    // slow) and back to metric 0 before it answers. The cache hit must
    // supersede the in-flight refresh so its late response can neither
    // overwrite the view nor repoint the cache at metric 1.
    let api = MockApi::new(|descriptor| {
        let param = |key: &str| {
            descriptor
                .params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
                .unwrap_or_default()
        };
        let key = descriptor.cache_key();
        if key.starts_with("gwl_list:") {
            match param("variable").as_str() {
                "TX99p" => (Duration::ZERO, Ok(info_json(&[0.8, 1.5, 2.0, 3.0]))),
                "R99p" => (
                    Duration::from_millis(200),
                    Ok(info_json(&[1.5, 2.0, 2.5, 3.0])),
                ),
                other => panic!("unexpected variable: {}", other),
            }
        } else if key.starts_with("tile:") {
            (Duration::ZERO, Ok(tilejson_json(&param("datetime"))))
        } else {
            panic!("unexpected request: {}", key);
        }
    });
    let orchestrator = orchestrator(api.clone());

    let mut state = SelectionState::default();
    orchestrator.sync_map(&mut state).await;

    let slow_sync = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move {
            let mut other = SelectionState::default();
            other.set_metric(1);
            orchestrator.sync_map(&mut other).await;
        })
    };
    // Let the metric-1 refresh reach its network await.
    tokio::task::yield_now().await;

    // Back on metric 0: served from the cache, no new /info request.
    orchestrator.sync_map(&mut state).await;

    advance(Duration::from_millis(300)).await;
    slow_sync.await.unwrap();

    let view = orchestrator.gwl_view().borrow().clone();
    let list = view.data.as_ready().expect("gwl view should be ready");
    assert_eq!(
        list.levels,
        explorer_common::GwlList::from_numbers(&[0.8, 1.5, 2.0, 3.0]).levels,
        "late metric-1 enumeration must not overwrite the current list"
    );
    assert!(!view.loading);

    // The cache still belongs to metric 0: another sync is a hit.
    orchestrator.sync_map(&mut state).await;
    assert_eq!(api.count_matching("gwl_list:"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_point_burst_coalesces_to_leading_and_trailing() {
    let api = MockApi::new(|_| (Duration::ZERO, Ok(point_json(&[Some(1.0), Some(2.0)]))));
    let orchestrator = orchestrator(api.clone());
    let mut state = SelectionState::default();
    state.set_metric(1); // single data path, one request per fire

    for i in 0..10u64 {
        let lon = -120.0 + (i as f64) * 0.01;
        orchestrator.trigger_point(lon, 37.4, &state).await;
        advance(Duration::from_millis(5)).await;
    }
    advance(Duration::from_millis(300)).await;
    tokio::task::yield_now().await;

    // Leading edge plus one trailing fire; intermediates dropped.
    assert_eq!(api.count_matching("point:"), 2);
    let calls = api.calls();
    assert!(calls[0].contains("/point/-120,"), "leading uses first position");
    assert!(
        calls[1].contains("/point/-119.91"),
        "trailing uses the final position, got {}",
        calls[1]
    );

    let view = orchestrator.point_view().borrow().clone();
    let values = view.data.as_ready().expect("point view should be ready");
    assert_eq!(values.mean, Some(1.0));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_pending_trailing_fire() {
    let api = MockApi::new(|_| (Duration::ZERO, Ok(point_json(&[Some(1.0)]))));
    let orchestrator = orchestrator(api.clone());
    let mut state = SelectionState::default();
    state.set_metric(1);

    orchestrator.trigger_point(-120.0, 37.4, &state).await;
    advance(Duration::from_millis(10)).await;
    orchestrator.trigger_point(-119.9, 37.4, &state).await; // buffered

    orchestrator.shutdown().await;
    advance(Duration::from_millis(500)).await;
    tokio::task::yield_now().await;

    assert_eq!(api.count_matching("point:"), 1, "trailing fire must be cancelled");
}

#[tokio::test(start_paused = true)]
async fn test_point_queries_ensemble_range_when_defined() {
    let api = MockApi::new(|descriptor| {
        let key = descriptor.cache_key();
        let value = if key.contains("/min/") {
            Some(-2.0)
        } else if key.contains("/max/") {
            Some(9.0)
        } else {
            Some(3.5)
        };
        (Duration::ZERO, Ok(point_json(&[value, None])))
    });
    let orchestrator = orchestrator(api.clone());
    let state = SelectionState::default(); // metric 0 carries min/max paths

    orchestrator.trigger_point(-120.0, 37.4, &state).await;

    assert_eq!(api.count_matching("point:"), 3);
    let view = orchestrator.point_view().borrow().clone();
    let values = view.data.as_ready().expect("point view should be ready");
    assert_eq!(values.mean, Some(3.5));
    assert_eq!(values.min, Some(-2.0));
    assert_eq!(values.max, Some(9.0));
}

#[tokio::test(start_paused = true)]
async fn test_all_null_point_is_explicit_no_data() {
    let api = MockApi::new(|_| (Duration::ZERO, Ok(null_point_json(4))));
    let orchestrator = orchestrator(api.clone());
    let mut state = SelectionState::default();
    state.set_metric(1);

    orchestrator.trigger_point(-130.0, 30.0, &state).await; // open ocean

    let view = orchestrator.point_view().borrow().clone();
    assert_eq!(view.data, SlotData::NoData);
    assert!(view.error.is_none(), "no data is not an error");
    assert!(!view.loading);
}

#[tokio::test(start_paused = true)]
async fn test_empty_models_blocks_dispatch_entirely() {
    let api = MockApi::new(|_| (Duration::ZERO, Ok(search_json())));
    let orchestrator = orchestrator(api.clone());
    let mut state = search_state("Fresno");
    state.selected_models.clear();

    let err = orchestrator.submit_search(&state).await.unwrap_err();
    assert!(err.has(Field::Models));
    assert!(!err.has(Field::Boundaries));
    assert!(api.calls().is_empty(), "validation failure must not hit the network");
}

#[tokio::test(start_paused = true)]
async fn test_failure_preserves_previously_rendered_data() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let api = {
        let attempts = attempts.clone();
        MockApi::new(move |descriptor| {
            if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                (Duration::ZERO, Ok(search_json()))
            } else {
                (
                    Duration::ZERO,
                    Err(ExplorerError::HttpStatus {
                        status: 500,
                        url: descriptor.base_url.clone(),
                    }),
                )
            }
        })
    };
    let orchestrator = orchestrator(api.clone());

    assert!(orchestrator
        .submit_search(&search_state("Fresno"))
        .await
        .unwrap());
    let first = orchestrator.search_view().borrow().clone();
    assert_eq!(first.data.as_ready().unwrap().len(), 2);

    assert!(!orchestrator
        .submit_search(&search_state("Alameda"))
        .await
        .unwrap());
    let second = orchestrator.search_view().borrow().clone();
    assert!(second.error.is_some());
    assert!(!second.loading);
    // The failed refresh did not wipe the table.
    assert_eq!(second.data.as_ready().unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_renewables_point_uses_configuration_path() {
    let api = MockApi::new(|_| (Duration::ZERO, Ok(point_json(&[Some(0.42)]))));
    let orchestrator = orchestrator(api.clone());
    let state = SelectionState::default(); // solar, srdu

    orchestrator
        .query_renewables_point(-121.5, 38.6, &state)
        .await;

    let calls = api.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].contains("srdu"));
    let view = orchestrator.point_view().borrow().clone();
    assert_eq!(view.data.as_ready().unwrap().mean, Some(0.42));
}
