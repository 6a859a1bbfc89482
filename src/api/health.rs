//! Liveness endpoints

use crate::server::AppState;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::Serialize;

/// `/status` response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub version: &'static str,
}

async fn status() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ready",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Health routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { "Marionette" }))
        .route("/status", get(status))
}
