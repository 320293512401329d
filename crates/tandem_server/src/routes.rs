//! HTTP routes.

use crate::{ApiError, ServerSettings};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderValue, Method, StatusCode, header},
    response::{
        IntoResponse,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tandem_core::{ComparisonRun, Prompt, RunWithResults};
use tandem_error::{ConfigError, StorageError, StorageErrorKind, TandemError, TandemResult};
use tandem_interface::ResultStore;
use tandem_relay::StreamRelay;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    relay: StreamRelay,
}

impl AppState {
    /// Wrap a relay.
    pub fn new(relay: StreamRelay) -> Self {
        Self { relay }
    }

    /// The relay used for comparison runs.
    pub fn relay(&self) -> &StreamRelay {
        &self.relay
    }
}

/// Routes without middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/compare/stream", get(compare_stream))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session))
        .with_state(state)
}

/// Routes with CORS and request tracing.
///
/// # Errors
///
/// Returns a configuration error if the CORS origin is not a valid header value.
pub fn create_app(state: AppState, server: &ServerSettings) -> TandemResult<Router> {
    let origin = HeaderValue::from_str(&server.cors_origin).map_err(|e| {
        ConfigError::new(format!("Invalid CORS origin '{}': {}", server.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Ok(create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "ok": true })))
}

#[derive(Debug, Deserialize)]
struct CompareQuery {
    #[serde(default)]
    prompt: Option<String>,
}

/// Stream one comparison run as server-sent events.
async fn compare_stream(
    State(state): State<AppState>,
    Query(query): Query<CompareQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let prompt = query.prompt.unwrap_or_default();
    let events = state.relay.run(&prompt).await?;
    tracing::debug!(run_id = %events.run_id(), "Streaming comparison run");

    let frames = events.map(|event| Event::default().json_data(&event));
    Ok(Sse::new(frames).keep_alive(KeepAlive::default()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSession {
    #[serde(default)]
    prompt: String,
    #[serde(default)]
    user_id: Option<String>,
}

async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<CreateSession>,
) -> Result<impl IntoResponse, ApiError> {
    let prompt = Prompt::new(body.prompt).map_err(TandemError::from)?;
    let run: ComparisonRun = state
        .relay
        .store()
        .create_run(prompt.as_str(), body.user_id.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "sessionId": run.id,
            "prompt": run.prompt,
            "createdAt": run.created_at,
        })),
    ))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RunWithResults>, ApiError> {
    let not_found = || {
        TandemError::from(StorageError::new(StorageErrorKind::NotFound(format!(
            "session {}",
            id
        ))))
    };
    let id = Uuid::parse_str(&id).map_err(|_| not_found())?;
    let run = state
        .relay
        .store()
        .find_run_with_results(id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(run))
}
