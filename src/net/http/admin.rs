use crate::Registry;
use crate::inventory::SchedulerState;
use crate::models::account::AuthLevel;
use crate::models::app_config::AppConfig;
use crate::net::http::auth::AuthUser;
use crate::net::http::error::HttpError;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct RefreshRequested {
    pub accepted: bool,
}

#[derive(Debug, Serialize)]
pub struct StatusView {
    pub scheduler: SchedulerState,
    pub generation: u64,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub has_identity: bool,
    pub cached_names: usize,
}

pub async fn health() -> &'static str {
    "ok"
}

/// Asks the scheduler to derive a fresh access token, e.g. after the admin logged in again.
pub async fn refresh_token(
    State(registry): State<Arc<Registry>>,
    auth: AuthUser,
) -> Result<(StatusCode, Json<RefreshRequested>), HttpError> {
    let user = auth.require(AuthLevel::Admin)?;
    let accepted = registry.services.app_config.request_token_refresh();
    tracing::info!(character_id = %user.character_id, accepted, "token refresh requested");

    let status = if accepted {
        StatusCode::ACCEPTED
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    Ok((status, Json(RefreshRequested { accepted })))
}

pub async fn get_config(
    State(registry): State<Arc<Registry>>,
    auth: AuthUser,
) -> Result<Json<AppConfig>, HttpError> {
    auth.require(AuthLevel::Worker)?;
    Ok(Json(registry.services.app_config.get().await?))
}

pub async fn save_config(
    State(registry): State<Arc<Registry>>,
    auth: AuthUser,
    Json(config): Json<AppConfig>,
) -> Result<Json<AppConfig>, HttpError> {
    let user = auth.require(AuthLevel::Worker)?;
    let saved = registry.services.app_config.update(config).await?;
    tracing::info!(character_id = %user.character_id, "app config updated");
    Ok(Json(saved))
}

pub async fn status(State(registry): State<Arc<Registry>>, auth: AuthUser) -> Result<Json<StatusView>, HttpError> {
    auth.require(AuthLevel::Admin)?;
    let snap = registry.store.read();

    Ok(Json(StatusView {
        scheduler: registry.refresh.state(),
        generation: snap.generation,
        refreshed_at: snap.refreshed_at,
        has_identity: registry.tokens.identity().is_some(),
        cached_names: registry.cache.len(),
    }))
}
