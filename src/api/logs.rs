//! Log and guide endpoints
//!
//! GET /logs?limit=N - last N activity lines (default 50, 0 = all)
//! GET /guide        - usage guide markdown

use crate::server::AppState;
use axum::extract::{Query, State};
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub logs: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct GuideResponse {
    pub content: String,
}

async fn get_logs(State(state): State<AppState>, Query(query): Query<LogsQuery>) -> Json<LogsResponse> {
    let limit = match query.limit.unwrap_or(DEFAULT_LIMIT) {
        0 => None,
        n => Some(n),
    };
    Json(LogsResponse {
        logs: state.engine.logs(limit),
    })
}

async fn get_guide(State(state): State<AppState>) -> Json<GuideResponse> {
    let path = &state.config.guide.path;
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) => {
            debug!(path = %path, error = %e, "Guide not readable");
            format!("# Guide not found at {path}")
        }
    };
    Json(GuideResponse { content })
}

/// Log routes
pub fn log_routes() -> Router<AppState> {
    Router::new()
        .route("/logs", get(get_logs))
        .route("/guide", get(get_guide))
}
