//! Action endpoints
//!
//! POST /action  - execute one action, bypassing the model
//! GET  /actions - list the catalog

use super::error::ApiJson;
use crate::server::AppState;
use axum::extract::State;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use marionette_tools::{ActionDefinition, ActionResult, Intent};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ActionsResponse {
    pub count: usize,
    pub actions: Vec<ActionDefinition>,
}

async fn execute_action(
    State(state): State<AppState>,
    ApiJson(intent): ApiJson<Intent>,
) -> Json<ActionResult> {
    Json(state.engine.execute_action(&intent).await)
}

async fn list_actions(State(state): State<AppState>) -> Json<ActionsResponse> {
    let actions: Vec<ActionDefinition> = state
        .engine
        .registry()
        .list_definitions()
        .into_iter()
        .cloned()
        .collect();
    Json(ActionsResponse {
        count: actions.len(),
        actions,
    })
}

/// Action routes
pub fn action_routes() -> Router<AppState> {
    Router::new()
        .route("/action", post(execute_action))
        .route("/actions", get(list_actions))
}
