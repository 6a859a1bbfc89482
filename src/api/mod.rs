//! Web API module for Marionette
//!
//! Provides REST API endpoints for:
//! - Instructions (submit, chat, terminal)
//! - Direct action execution and the catalog
//! - Activity log and guide
//! - Provider configuration
//! - Liveness

pub mod actions;
pub mod config;
pub mod error;
pub mod health;
pub mod instructions;
pub mod logs;

use crate::server::AppState;
use axum::Router;

pub use actions::action_routes;
pub use config::config_routes;
pub use health::health_routes;
pub use instructions::instruction_routes;
pub use logs::log_routes;

/// Create the API router with all endpoints
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(instruction_routes())
        .merge(action_routes())
        .merge(log_routes())
        .merge(config_routes())
        .with_state(state)
}
