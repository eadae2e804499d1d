//! Application builder: wires router, middleware, state and the worker.

use std::net::SocketAddr;

use axum::Router;
use tracing::{error, info};

use stowage_core::config::AppConfig;
use stowage_core::error::AppError;
use stowage_worker::WorkerRunner;

use crate::middleware::cors::build_cors_layer;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors);
    build_router(state).layer(cors)
}

/// Runs the Stowage server until a shutdown signal arrives.
pub async fn run_server(config: AppConfig) -> Result<(), AppError> {
    info!("Starting Stowage server...");

    // ── Step 1: Stores, cache, storage, auth, services ───────────
    let state = AppState::from_config(config).await?;

    // ── Step 2: Background worker ────────────────────────────────
    let mut worker = WorkerRunner::new(
        state.config.worker.clone(),
        &state.stores,
        state.lock_service.clone(),
        state.storage.clone(),
    );
    worker.start().await?;

    // ── Step 3: HTTP server ──────────────────────────────────────
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    info!(address = %addr, "Stowage server listening");

    let app = build_app(state.clone());
    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| AppError::internal(format!("Server error: {e}")));

    // ── Step 4: Drain ────────────────────────────────────────────
    if let Err(e) = worker.shutdown().await {
        error!(error = %e, "Worker shutdown failed");
    }
    state.stores.close().await;
    info!("Stowage server stopped");

    served
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received");
}
