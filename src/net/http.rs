use crate::Registry;
use crate::error::{AppResult, InfraError};
use axum::Router;
use axum::routing::{get, patch};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

mod admin;
mod auth;
mod blueprints;
mod error;
mod requisitions;

pub use auth::AuthUser;
pub use error::HttpError;

pub fn router(registry: Arc<Registry>) -> Router {
    Router::new()
        .route("/health", get(admin::health))
        .route("/api/blueprints", get(blueprints::list))
        .route("/api/requisition", get(requisitions::list).post(requisitions::create))
        .route("/api/requisition/{id}", get(requisitions::get))
        .route("/api/requisition/{id}/{action}", patch(requisitions::act))
        .route("/api/refresh/admin", get(admin::refresh_token))
        .route("/api/config", get(admin::get_config).post(admin::save_config))
        .route("/api/status", get(admin::status))
        .with_state(registry)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
}

/// Runs the HTTP API until `shutdown` is cancelled
pub async fn serve(addr: SocketAddr, registry: Arc<Registry>, shutdown: CancellationToken) -> AppResult<()> {
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(InfraError::from)?;
    tracing::info!(%addr, "http api listening");

    axum::serve(listener, router(registry))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(InfraError::from)?;

    tracing::info!("http api stopped");
    Ok(())
}
