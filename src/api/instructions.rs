//! Instruction endpoints
//!
//! POST /submit   - route one line of input (shell escape or chat)
//! POST /chat     - natural-language instruction
//! POST /terminal - raw shell command

use super::error::{ApiError, ApiJson};
use crate::server::AppState;
use axum::extract::State;
use axum::response::Json;
use axum::routing::post;
use axum::Router;
use marionette_core::{ChatResult, SubmitResponse, TerminalOutput};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct TerminalRequest {
    pub cmd: String,
}

async fn submit(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SubmitRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    Ok(Json(state.engine.submit(&request.text).await?))
}

async fn chat(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ChatRequest>,
) -> Result<Json<ChatResult>, ApiError> {
    Ok(Json(state.engine.chat(&request.prompt).await?))
}

async fn terminal(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<TerminalRequest>,
) -> Result<Json<TerminalOutput>, ApiError> {
    Ok(Json(state.engine.terminal(&request.cmd).await?))
}

/// Instruction routes
pub fn instruction_routes() -> Router<AppState> {
    Router::new()
        .route("/submit", post(submit))
        .route("/chat", post(chat))
        .route("/terminal", post(terminal))
}
