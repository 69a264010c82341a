//! Gateway routes:
//! - POST /api/generate
//! - GET /health
//! - everything else: static files, when a directory is configured

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::orchestrator::{Generation, Orchestrator};
use crate::relay;
use crate::validator::validate_value;
use crate::{GenerationResult, RequestDefaults};

/// Application state shared across handlers.
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub defaults: RequestDefaults,
}

/// Build the axum router with all routes.
pub fn build_router(state: Arc<AppState>, static_dir: Option<PathBuf>) -> Router {
    let router = Router::new()
        .route("/api/generate", post(generate))
        .route("/health", get(health))
        .with_state(state);

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(GenerationResult::failure(message))).into_response()
}

async fn generate(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let raw = match body {
        Ok(Json(raw)) => raw,
        Err(rejection) => {
            info!(reason = %rejection.body_text(), "Rejected undecodable request body");
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    let request = match validate_value(&raw, &state.defaults) {
        Ok(request) => request,
        Err(e) => {
            info!(error = %e, "Rejected invalid generation request");
            return error_response(StatusCode::BAD_REQUEST, e.to_string());
        }
    };

    match state.orchestrator.handle(request).await {
        Generation::Buffered(result) => {
            let status = if result.is_failure() {
                StatusCode::INTERNAL_SERVER_ERROR
            } else {
                StatusCode::OK
            };
            (status, Json(result)).into_response()
        }
        Generation::Streamed(events) => (
            [
                (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            Body::from_stream(relay::encode(events)),
        )
            .into_response(),
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
