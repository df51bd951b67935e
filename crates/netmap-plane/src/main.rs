//! Network Map Authority Binary
//!
//! Runs the doorman and network map HTTP server.

use std::env;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use netmap_plane::{bootstrap, create_router, ServiceConfig};

#[tokio::main]
async fn main() {
    // Initialize logging
    let log_level = env::var("NETMAP_LOG_LEVEL")
        .unwrap_or_else(|_| "info".into())
        .parse()
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    let config = ServiceConfig::from_env().expect("Invalid configuration");

    info!(
        version = netmap_core::VERSION,
        port = config.port,
        doorman = %config.doorman_name,
        network_map = %config.network_map_name,
        notaries = ?config.notaries_path,
        "Starting network map authority"
    );

    let service = bootstrap(&config)
        .await
        .expect("Failed to start the authority");

    let app = create_router(service.state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    info!(addr = %addr, "Network map authority listening");

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
