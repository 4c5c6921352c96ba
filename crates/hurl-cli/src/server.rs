//! Axum HTTP surface over a shared [`FeedSystem`].
//!
//! # Routes
//!
//! - `GET  /`                   service info
//! - `GET  /v1/healthz`         liveness plus feature flags
//! - `POST /v1/generate`        batch generation
//! - `GET  /v1/sample`          small batch from query parameters
//! - `GET  /v1/stream`          server-sent events, one post per interval
//! - `GET  /v1/posts/recent`    in-memory store, oldest first
//! - `GET  /v1/posts/{id}`
//! - `GET  /v1/personas`, `POST /v1/personas`, `GET /v1/personas/{id}`
//! - `GET  /v1/topics`, `GET /v1/topics/{id}`
//! - `POST /v1/admin/shock`, `GET /v1/admin/trends`, `POST /v1/admin/seed`

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderValue, Method, StatusCode},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use futures_util::Stream;
use hurl_core::time::now_millis;
use hurl_core::{FeedSystem, GenerateParams, HurlError, Mode, Persona, PersonaSpec, Post, Topic};
use hurl_store::PostArchive;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Settings;

const SAMPLE_MAX: usize = 100;
const STREAM_MIN_INTERVAL: f64 = 0.1;
const STREAM_MAX_INTERVAL: f64 = 10.0;

#[derive(Clone)]
pub struct AppState {
    pub system: Arc<FeedSystem>,
    /// Present when persistence is enabled.
    pub archive: Option<Arc<Mutex<PostArchive>>>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(system: Arc<FeedSystem>, archive: Option<PostArchive>, settings: Settings) -> Self {
        Self {
            system,
            archive: archive.map(|a| Arc::new(Mutex::new(a))),
            settings: Arc::new(settings),
        }
    }

    /// Write posts through to the archive. Failures are logged, not surfaced.
    async fn archive(&self, posts: &[Post]) {
        let Some(archive) = &self.archive else {
            return;
        };
        let archive = archive.lock().await;
        match archive.append_batch(posts) {
            Ok(n) => tracing::debug!(new = n, "archived posts"),
            Err(e) => tracing::warn!("failed to archive posts: {e}"),
        }
    }
}

pub fn app_router(state: AppState) -> Router {
    let cors = cors_layer(&state.settings.allow_origins);
    Router::new()
        .route("/", get(root_handler))
        .route("/v1/healthz", get(health_handler))
        .route("/v1/generate", post(generate_handler))
        .route("/v1/sample", get(sample_handler))
        .route("/v1/stream", get(stream_handler))
        .route("/v1/posts/recent", get(recent_posts_handler))
        .route("/v1/posts/{id}", get(get_post_handler))
        .route(
            "/v1/personas",
            get(list_personas_handler).post(create_persona_handler),
        )
        .route("/v1/personas/{id}", get(get_persona_handler))
        .route("/v1/topics", get(list_topics_handler))
        .route("/v1/topics/{id}", get(get_topic_handler))
        .route("/v1/admin/shock", post(shock_handler))
        .route("/v1/admin/trends", get(trends_handler))
        .route("/v1/admin/seed", post(seed_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);
    if origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }
    let values: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("ignoring invalid CORS origin: {o}");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(values))
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn unprocessable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: message.into(),
        }
    }
}

impl From<HurlError> for ApiError {
    fn from(err: HurlError) -> Self {
        let status = match &err {
            HurlError::NotFound { .. } => StatusCode::NOT_FOUND,
            HurlError::InvalidParameter(_) | HurlError::ToxicityUnsatisfiable { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            HurlError::NoPersonasAvailable => StatusCode::CONFLICT,
            HurlError::NonFiniteScore { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ---------------------------------------------------------------------------
// Service info
// ---------------------------------------------------------------------------

async fn root_handler() -> Json<Value> {
    Json(json!({
        "service": "Hurl REST API",
        "version": env!("CARGO_PKG_VERSION"),
        "health": "/v1/healthz",
    }))
}

async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "env": state.settings.env.as_str(),
        "llm_enabled": state.system.has_enhancer(),
        "persistence_enabled": state.archive.is_some(),
        "engine_running": state.system.is_running(),
    }))
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

async fn generate_handler(
    State(state): State<AppState>,
    Json(params): Json<GenerateParams>,
) -> ApiResult<Json<Value>> {
    let posts = state.system.generate(&params).await?;
    state.archive(&posts).await;
    let seed = params.seed.or_else(|| state.system.global_seed());
    Ok(Json(json!({
        "count": posts.len(),
        "seed": seed,
        "posts": posts,
    })))
}

#[derive(Debug, Deserialize)]
struct SampleQuery {
    #[serde(default = "default_sample_count")]
    count: usize,
    #[serde(default)]
    mode: Mode,
    seed: Option<u64>,
}

fn default_sample_count() -> usize {
    10
}

async fn sample_handler(
    State(state): State<AppState>,
    Query(query): Query<SampleQuery>,
) -> ApiResult<Json<Value>> {
    if query.count > SAMPLE_MAX {
        return Err(ApiError::unprocessable(format!(
            "sample count must be <= {SAMPLE_MAX}, got {}",
            query.count
        )));
    }
    let mut params = GenerateParams::new(query.count).with_mode(query.mode);
    params.seed = query.seed;
    let posts = state.system.generate(&params).await?;
    state.archive(&posts).await;
    Ok(Json(json!({ "count": posts.len(), "posts": posts })))
}

/// Query for `/v1/stream`. List filters are comma-separated.
#[derive(Debug, Deserialize)]
struct StreamQuery {
    #[serde(default)]
    mode: Mode,
    topics: Option<String>,
    persona_ids: Option<String>,
    language: Option<String>,
    toxicity_max: Option<f64>,
    seed: Option<u64>,
    #[serde(default = "default_stream_interval")]
    interval: f64,
}

fn default_stream_interval() -> f64 {
    1.0
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

impl StreamQuery {
    fn params(&self) -> GenerateParams {
        let mut params = GenerateParams::new(1).with_mode(self.mode);
        params.topics = split_list(self.topics.as_deref());
        params.persona_ids = split_list(self.persona_ids.as_deref());
        params.languages = split_list(self.language.as_deref());
        if let Some(max) = self.toxicity_max {
            params.toxicity_max = max;
        }
        params
    }
}

async fn stream_handler(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    if !(STREAM_MIN_INTERVAL..=STREAM_MAX_INTERVAL).contains(&query.interval) {
        return Err(ApiError::unprocessable(format!(
            "interval must be between {STREAM_MIN_INTERVAL} and {STREAM_MAX_INTERVAL} seconds"
        )));
    }
    let interval = Duration::from_secs_f64(query.interval);
    let base_seed = query.seed.unwrap_or_else(now_millis);
    let template = query.params();
    tracing::info!(base_seed, ?interval, "stream opened");

    let stream = async_stream::stream! {
        let mut n: u64 = 0;
        loop {
            let params = template.clone().with_seed(base_seed.wrapping_add(n));
            match state.system.sample_one(&params).await {
                Ok(post) => {
                    state.archive(std::slice::from_ref(&post)).await;
                    yield Ok(post_event(&post));
                }
                Err(e) => {
                    tracing::warn!("stream stopped: {e}");
                    yield Ok(Event::default()
                        .event("error")
                        .data(json!({ "error": e.to_string() }).to_string()));
                    break;
                }
            }
            n += 1;
            tokio::time::sleep(interval).await;
        }
    };
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn post_event(post: &Post) -> Event {
    let data = serde_json::to_string(post)
        .unwrap_or_else(|e| json!({ "error": e.to_string() }).to_string());
    Event::default().event("post").id(post.id.clone()).data(data)
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct LimitQuery {
    #[serde(default = "default_recent_limit")]
    limit: usize,
}

fn default_recent_limit() -> usize {
    50
}

async fn recent_posts_handler(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Json<Value> {
    let posts = state.system.recent_posts(query.limit);
    Json(json!({ "count": posts.len(), "posts": posts }))
}

async fn get_post_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Post>> {
    Ok(Json(state.system.get_post(&id)?))
}

// ---------------------------------------------------------------------------
// Personas
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PageQuery {
    #[serde(default = "default_page_limit")]
    limit: usize,
    #[serde(default)]
    offset: usize,
}

fn default_page_limit() -> usize {
    100
}

async fn list_personas_handler(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Json<Value> {
    let all = state.system.list_personas();
    let personas: Vec<&Persona> = all
        .iter()
        .skip(page.offset)
        .take(page.limit)
        .map(|p| p.as_ref())
        .collect();
    Json(json!({ "total": all.len(), "count": personas.len(), "personas": personas }))
}

async fn create_persona_handler(
    State(state): State<AppState>,
    Json(spec): Json<PersonaSpec>,
) -> ApiResult<(StatusCode, Json<Persona>)> {
    let persona = state.system.create_persona(spec)?;
    Ok((StatusCode::CREATED, Json(Persona::clone(&persona))))
}

async fn get_persona_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Persona>> {
    let persona = state.system.get_persona(&id)?;
    Ok(Json(Persona::clone(&persona)))
}

// ---------------------------------------------------------------------------
// Topics
// ---------------------------------------------------------------------------

async fn list_topics_handler(State(state): State<AppState>) -> Json<Value> {
    let topics = state.system.list_topics();
    Json(json!({ "count": topics.len(), "topics": topics }))
}

async fn get_topic_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Topic>> {
    Ok(Json(state.system.get_topic(&id)?))
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ShockRequest {
    topic_id: String,
    magnitude: f64,
    #[serde(default = "default_half_life", alias = "half_life_secs")]
    half_life_s: f64,
}

fn default_half_life() -> f64 {
    300.0
}

async fn shock_handler(
    State(state): State<AppState>,
    Json(req): Json<ShockRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    if !(0.0..=10.0).contains(&req.magnitude) {
        return Err(ApiError::unprocessable(format!(
            "magnitude must be between 0 and 10, got {}",
            req.magnitude
        )));
    }
    state
        .system
        .inject_shock(&req.topic_id, req.magnitude, req.half_life_s)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": format!("shock injected into {}", req.topic_id),
            "topic_id": req.topic_id,
            "magnitude": req.magnitude,
            "half_life_s": req.half_life_s,
        })),
    ))
}

async fn trends_handler(State(state): State<AppState>) -> Json<Value> {
    let trends = state.system.trend_snapshot();
    Json(json!({ "count": trends.len(), "trends": trends }))
}

#[derive(Debug, Deserialize)]
struct SeedRequest {
    seed: u64,
}

async fn seed_handler(State(state): State<AppState>, Json(req): Json<SeedRequest>) -> Json<Value> {
    state.system.reseed(req.seed);
    tracing::info!(seed = req.seed, "global seed reset");
    Json(json!({
        "seed": req.seed,
        "message": format!("global seed set to {}", req.seed),
    }))
}
