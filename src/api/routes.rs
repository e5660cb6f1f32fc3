//! Route Definitions
//!
//! Maps URLs to handlers with type-safe routing.

use super::handlers::*;
use axum::{routing::get, Router};
use std::sync::Arc;

/// Build the API router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/version", get(version_handler))
        .route("/stats", get(stats_handler))

        // Bare paths exist only to answer 400 for a missing account
        .route("/balance", get(balance_handler))
        .route("/balance/", get(balance_handler))
        .route("/balance/:account", get(balance_handler))

        .route("/supply", get(supply_handler))
        .with_state(state)
}
