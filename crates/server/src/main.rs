//! Shop backend server binary.
//!
//! Serves the customer/item catalog, the order fulfillment API, and the CSV
//! order report.
//!
//! # Architecture
//!
//! - Axum web framework
//! - `PostgreSQL` for durable storage (in-memory fallback for development)
//! - Local filesystem for uploaded customer pictures

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use shopd_server::config::{LogFormat, ServerConfig};
use shopd_server::routes;
use shopd_server::services::{CatalogService, FsMediaStorage, FulfillmentService};
use shopd_server::state::AppState;
use shopd_server::store::{DynStore, MemoryStore, PgStore, create_pool};

#[tokio::main]
async fn main() {
    let config = ServerConfig::from_env().expect("Failed to load configuration");

    // Initialize tracing with EnvFilter.
    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shopd_server=info,tower_http=debug".into());

    let json = config.log_format == LogFormat::Json;
    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();

    let store: DynStore = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await.expect("Failed to create database pool");
            tracing::info!("Database pool created");
            // NOTE: Migrations are NOT run automatically on startup.
            // Run them explicitly via: cargo run -p shopd-cli -- migrate
            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!(
                "no SHOPD_DATABASE_URL or DATABASE_URL set; using the in-memory store (data is lost on restart)"
            );
            Arc::new(MemoryStore::new())
        }
    };

    let media = Arc::new(FsMediaStorage::new(config.media_root.clone()));
    let state = AppState::new(
        CatalogService::new(Arc::clone(&store), media),
        FulfillmentService::new(store),
    );

    let app = routes::router(state);

    let addr = config.socket_addr();
    tracing::info!("shopd listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
