//! Route handlers for the crew HTTP API.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use nodes::{catalogue, CrewKind, CrewRunner, DEFAULT_TOPIC};
use pipeline::ResultEnvelope;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

/// Static facts about the running service, reported by the health endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    pub service: String,
    pub version: String,
    pub environment: String,
    pub model: String,
    pub llm_configured: bool,
}

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    runner: CrewRunner,
    info: Arc<ServiceInfo>,
    run_timeout: Duration,
}

impl AppState {
    /// `run_timeout` bounds a whole crew run; a run that exceeds it is
    /// abandoned and reported as an internal error.
    pub fn new(runner: CrewRunner, info: ServiceInfo, run_timeout: Duration) -> Self {
        Self {
            runner,
            info: Arc::new(info),
            run_timeout,
        }
    }
}

/// Builds the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/api/crew", get(crew_info).post(trigger_crew))
        .fallback(not_found)
        .with_state(state)
        .layer(CorsLayer::permissive())
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A JSON error response: `{"success": false, "error": <message>}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(detail: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("Internal server error: {detail}"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({ "success": false, "error": self.message })),
        )
            .into_response()
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn home(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": state.info.service,
        "version": state.info.version,
    }))
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "environment": state.info.environment,
        "groq_configured": state.info.llm_configured,
        "model": state.info.model,
    }))
}

async fn crew_info() -> Json<serde_json::Value> {
    Json(json!({
        "available_crews": catalogue(),
        "default_topic": DEFAULT_TOPIC,
    }))
}

/// Body of `POST /api/crew`.
#[derive(Debug, Deserialize)]
pub struct CrewRequest {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub mode: Option<CrewKind>,
}

async fn trigger_crew(
    State(state): State<AppState>,
    payload: Result<Json<CrewRequest>, JsonRejection>,
) -> Result<Json<ResultEnvelope>, ApiError> {
    let Json(request) = payload.map_err(|rejection| match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::bad_request("Content-Type must be application/json")
        }
        other => ApiError::bad_request(format!("Invalid request body: {}", other.body_text())),
    })?;

    let topic = request
        .topic
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Topic is required"))?;
    let kind = request.mode.unwrap_or_else(|| state.runner.default_kind());

    info!(%topic, crew = %kind, "processing crew request");

    let runner = state.runner.clone();
    let run_topic = topic.clone();
    let mut handle = tokio::spawn(async move { runner.run_kind(&run_topic, kind).await });

    let envelope = match tokio::time::timeout(state.run_timeout, &mut handle).await {
        Ok(Ok(envelope)) => envelope,
        Ok(Err(join_error)) => {
            error!(%topic, error = %join_error, "crew run aborted");
            return Err(ApiError::internal(join_error));
        }
        Err(_) => {
            handle.abort();
            error!(%topic, timeout_secs = state.run_timeout.as_secs_f64(), "crew run timed out");
            return Err(ApiError::internal(format!(
                "crew run timed out after {:?}",
                state.run_timeout
            )));
        }
    };

    if envelope.success {
        info!(%topic, "crew workflow completed successfully");
    } else {
        warn!(%topic, error = envelope.error.as_deref().unwrap_or_default(), "crew workflow failed");
    }
    Ok(Json(envelope))
}

async fn not_found() -> ApiError {
    ApiError {
        status: StatusCode::NOT_FOUND,
        message: "Endpoint not found".to_string(),
    }
}
