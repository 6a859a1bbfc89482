//! Provider configuration endpoints
//!
//! GET  /config - live provider configuration (API key masked)
//! POST /config - replace it

use super::error::{ApiError, ApiJson};
use crate::server::config::mask_api_key;
use crate::server::AppState;
use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use marionette_llm::{ProviderConfig, ProviderSettings};
use serde::Serialize;

/// Provider configuration as shown to clients
#[derive(Debug, Serialize)]
pub struct ProviderView {
    pub provider: String,
    pub api_key: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub resolved_base_url: Option<String>,
}

impl From<&ProviderConfig> for ProviderView {
    fn from(config: &ProviderConfig) -> Self {
        Self {
            provider: config.provider.to_string(),
            api_key: mask_api_key(&config.api_key),
            model: config.model.clone(),
            base_url: config.base_url.clone(),
            resolved_base_url: config.resolved_base_url(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConfiguredResponse {
    pub status: &'static str,
    pub provider: String,
    pub model: String,
}

async fn get_config(State(state): State<AppState>) -> Json<ProviderView> {
    Json(ProviderView::from(state.engine.provider_config().as_ref()))
}

async fn update_config(
    State(state): State<AppState>,
    ApiJson(settings): ApiJson<ProviderSettings>,
) -> Result<Json<ConfiguredResponse>, ApiError> {
    let config = state.engine.update_config(settings).await?;
    Ok(Json(ConfiguredResponse {
        status: "configured",
        provider: config.provider.to_string(),
        model: config.model.clone(),
    }))
}

/// Config routes
pub fn config_routes() -> Router<AppState> {
    Router::new().route("/config", get(get_config).post(update_config))
}
