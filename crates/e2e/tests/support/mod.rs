//! In-process stand-in for the CreatorPipeline API
//!
//! Serves the `{ "data": ... }` envelope, answers deletes with 204 and
//! cascades pipeline -> series -> episode deletes. The health endpoint
//! reports `DOWN` until a configurable number of hits.

#![allow(dead_code)]

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use creatorpipeline_e2e::config::ApiConfig;

#[derive(Default)]
struct Store {
    next_id: i64,
    pipelines: BTreeMap<i64, Value>,
    series: BTreeMap<i64, Value>,
    episodes: BTreeMap<i64, Value>,
}

impl Store {
    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn remove_series(&mut self, id: i64) {
        self.series.remove(&id);
        self.episodes.retain(|_, e| e["seriesId"] != id);
    }
}

struct Shared {
    store: Mutex<Store>,
    health_hits: AtomicUsize,
    up_after: AtomicUsize,
}

type AppState = Arc<Shared>;

/// A running fake API bound to an ephemeral port
pub struct FakeApi {
    pub origin: String,
    shared: AppState,
}

impl FakeApi {
    pub async fn start() -> Self {
        let shared = Arc::new(Shared {
            store: Mutex::new(Store::default()),
            health_hits: AtomicUsize::new(0),
            up_after: AtomicUsize::new(1),
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(shared.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            origin: format!("http://{}", addr),
            shared,
        }
    }

    pub fn base_url(&self) -> String {
        format!("{}/api/v1", self.origin)
    }

    pub fn health_url(&self) -> String {
        format!("{}/actuator/health", self.origin)
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.base_url(),
            ..Default::default()
        }
    }

    /// Report `UP` from the `n`th health hit on; `usize::MAX` never does
    pub fn up_after(&self, n: usize) {
        self.shared.up_after.store(n, Ordering::SeqCst);
    }

    pub fn health_hits(&self) -> usize {
        self.shared.health_hits.load(Ordering::SeqCst)
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/actuator/health", get(health))
        .route("/api/v1/pipelines", get(list_pipelines).post(create_pipeline))
        .route(
            "/api/v1/pipelines/:id",
            get(get_pipeline).put(update_pipeline).delete(delete_pipeline),
        )
        .route(
            "/api/v1/pipelines/:id/series",
            get(list_series).post(create_series),
        )
        .route(
            "/api/v1/series/:id",
            get(get_series).put(update_series).delete(delete_series),
        )
        .route(
            "/api/v1/series/:id/episodes",
            get(list_episodes).post(create_episode),
        )
        .route("/api/v1/series/:id/episodes/suggested-date", get(suggested_date))
        .route(
            "/api/v1/episodes/:id",
            get(get_episode).put(update_episode).delete(delete_episode),
        )
        .route("/api/v1/episodes/:id/status", patch(update_status))
        .with_state(state)
}

fn data(status: StatusCode, value: Value) -> Response {
    (status, Json(json!({ "data": value }))).into_response()
}

fn not_found(kind: &str, id: i64) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("{} {} not found", kind, id) })),
    )
        .into_response()
}

fn merge(target: &mut Value, patch: Value) {
    if let (Some(target), Value::Object(fields)) = (target.as_object_mut(), patch) {
        for (key, value) in fields {
            target.insert(key, value);
        }
    }
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let hit = state.health_hits.fetch_add(1, Ordering::SeqCst) + 1;
    let status = if hit >= state.up_after.load(Ordering::SeqCst) {
        "UP"
    } else {
        "DOWN"
    };
    Json(json!({ "status": status }))
}

async fn list_pipelines(State(state): State<AppState>) -> Response {
    let store = state.store.lock().unwrap();
    data(StatusCode::OK, Value::Array(store.pipelines.values().cloned().collect()))
}

async fn create_pipeline(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let mut store = state.store.lock().unwrap();
    let id = store.id();
    let pipeline = json!({
        "id": id,
        "name": body["name"],
        "description": body["description"],
        "createdAt": "2024-05-01T10:00:00Z",
    });
    store.pipelines.insert(id, pipeline.clone());
    data(StatusCode::CREATED, pipeline)
}

async fn get_pipeline(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let store = state.store.lock().unwrap();
    match store.pipelines.get(&id) {
        Some(p) => data(StatusCode::OK, p.clone()),
        None => not_found("Pipeline", id),
    }
}

async fn update_pipeline(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut store = state.store.lock().unwrap();
    match store.pipelines.get_mut(&id) {
        Some(p) => {
            merge(p, body);
            data(StatusCode::OK, p.clone())
        }
        None => not_found("Pipeline", id),
    }
}

async fn delete_pipeline(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let mut store = state.store.lock().unwrap();
    if store.pipelines.remove(&id).is_none() {
        return not_found("Pipeline", id);
    }
    let owned: Vec<i64> = store
        .series
        .iter()
        .filter(|(_, s)| s["pipelineId"] == id)
        .map(|(sid, _)| *sid)
        .collect();
    for sid in owned {
        store.remove_series(sid);
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn list_series(State(state): State<AppState>, Path(pipeline_id): Path<i64>) -> Response {
    let store = state.store.lock().unwrap();
    if !store.pipelines.contains_key(&pipeline_id) {
        return not_found("Pipeline", pipeline_id);
    }
    let series = store
        .series
        .values()
        .filter(|s| s["pipelineId"] == pipeline_id)
        .cloned()
        .collect();
    data(StatusCode::OK, Value::Array(series))
}

async fn create_series(
    State(state): State<AppState>,
    Path(pipeline_id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut store = state.store.lock().unwrap();
    if !store.pipelines.contains_key(&pipeline_id) {
        return not_found("Pipeline", pipeline_id);
    }
    let id = store.id();
    let series = json!({
        "id": id,
        "pipelineId": pipeline_id,
        "name": body["name"],
        "description": body["description"],
        "publishDays": body["publishDays"],
        "episodeCount": 0,
    });
    store.series.insert(id, series.clone());
    data(StatusCode::CREATED, series)
}

async fn get_series(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let store = state.store.lock().unwrap();
    match store.series.get(&id) {
        Some(s) => data(StatusCode::OK, s.clone()),
        None => not_found("Series", id),
    }
}

async fn update_series(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut store = state.store.lock().unwrap();
    match store.series.get_mut(&id) {
        Some(s) => {
            merge(s, body);
            data(StatusCode::OK, s.clone())
        }
        None => not_found("Series", id),
    }
}

async fn delete_series(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let mut store = state.store.lock().unwrap();
    if !store.series.contains_key(&id) {
        return not_found("Series", id);
    }
    store.remove_series(id);
    StatusCode::NO_CONTENT.into_response()
}

async fn list_episodes(State(state): State<AppState>, Path(series_id): Path<i64>) -> Response {
    let store = state.store.lock().unwrap();
    if !store.series.contains_key(&series_id) {
        return not_found("Series", series_id);
    }
    let episodes = store
        .episodes
        .values()
        .filter(|e| e["seriesId"] == series_id)
        .cloned()
        .collect();
    data(StatusCode::OK, Value::Array(episodes))
}

async fn create_episode(
    State(state): State<AppState>,
    Path(series_id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut store = state.store.lock().unwrap();
    if !store.series.contains_key(&series_id) {
        return not_found("Series", series_id);
    }
    let id = store.id();
    let episode = json!({
        "id": id,
        "seriesId": series_id,
        "title": body["title"],
        "description": body["description"],
        "status": "IDEA",
        "scheduledDate": body["scheduledDate"],
    });
    store.episodes.insert(id, episode.clone());
    data(StatusCode::CREATED, episode)
}

async fn suggested_date(State(state): State<AppState>, Path(series_id): Path<i64>) -> Response {
    let store = state.store.lock().unwrap();
    if !store.series.contains_key(&series_id) {
        return not_found("Series", series_id);
    }
    data(StatusCode::OK, json!("2024-05-06"))
}

async fn get_episode(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let store = state.store.lock().unwrap();
    match store.episodes.get(&id) {
        Some(e) => data(StatusCode::OK, e.clone()),
        None => not_found("Episode", id),
    }
}

async fn update_episode(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut store = state.store.lock().unwrap();
    match store.episodes.get_mut(&id) {
        Some(e) => {
            merge(e, body);
            data(StatusCode::OK, e.clone())
        }
        None => not_found("Episode", id),
    }
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut store = state.store.lock().unwrap();
    match store.episodes.get_mut(&id) {
        Some(e) => {
            e["status"] = body["status"].clone();
            data(StatusCode::OK, e.clone())
        }
        None => not_found("Episode", id),
    }
}

async fn delete_episode(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let mut store = state.store.lock().unwrap();
    if store.episodes.remove(&id).is_none() {
        return not_found("Episode", id);
    }
    StatusCode::NO_CONTENT.into_response()
}
