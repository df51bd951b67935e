//! HTTP surface of the authority

pub mod error;
pub mod handlers;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ping", get(handlers::ping))
        // Doorman
        .route("/truststore", get(handlers::truststore))
        .route("/trustStore", get(handlers::truststore))
        .route("/certificate", post(handlers::submit_csr))
        .route("/certificate/{id}", get(handlers::get_certificate))
        // Network map
        .route("/network-map", get(handlers::get_network_map))
        .route("/network-map/map-stats", get(handlers::map_stats))
        .route(
            "/network-map/reset-persisted-nodes",
            get(handlers::reset_persisted_nodes),
        )
        .route(
            "/network-map/network-parameters/{hash}",
            get(handlers::get_network_parameters),
        )
        .route("/network-map/node-info/{hash}", get(handlers::get_node_info))
        .route("/network-map/publish", post(handlers::publish))
        .route("/network-map/bumpEpoch", get(handlers::bump_epoch))
        .route(
            "/network-map/bumpMPV",
            get(handlers::bump_minimum_platform_version),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
