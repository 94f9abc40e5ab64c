//! Thin HTTP front end.
//!
//! Exposes the orchestrator over `GET /like` plus the `/servers`, `/health`,
//! and `/` helpers. The [`LikeClient`] and its connection pool are created
//! once by the caller and shared by every request.

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use chrono::{DateTime, Utc};

pub use error::AppError;

use crate::client::LikeClient;

#[derive(Clone)]
pub struct AppState {
    pub client: Arc<LikeClient>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(client: Arc<LikeClient>) -> Self {
        Self {
            client,
            started_at: Utc::now(),
        }
    }
}

/// Build the axum Router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::home))
        .route("/like", get(routes::like))
        .route("/servers", get(routes::servers))
        .route("/health", get(routes::health))
        .with_state(state)
}

/// Serves the router on `listener` until Ctrl-C, then releases the client.
pub async fn serve(listener: tokio::net::TcpListener, client: LikeClient) -> std::io::Result<()> {
    let client = Arc::new(client);
    let app = build_router(AppState::new(client.clone()));

    if let Ok(addr) = listener.local_addr() {
        log::info!("like relay listening on http://{addr}");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    drop(client);
    log::info!("server stopped; http client released");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
}
