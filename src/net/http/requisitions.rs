use crate::Registry;
use crate::models::account::AuthLevel;
use crate::models::requisition::{RequestedBlueprint, RequisitionOrder, RequisitionStatus};
use crate::models::types::{CharacterId, RequisitionId};
use crate::net::http::auth::AuthUser;
use crate::net::http::error::HttpError;
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    pub blueprints: Vec<RequestedBlueprint>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub character_id: Option<CharacterId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Cancel,
    Lock,
    Unlock,
    Complete,
    Reject,
}

#[derive(Debug, Default, Deserialize)]
struct ActionBody {
    notes: Option<String>,
}

/// Empty bodies are fine, the notes are optional
fn action_notes(body: &[u8]) -> Result<Option<String>, HttpError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let body: ActionBody = serde_json::from_slice(body).map_err(|e| HttpError::bad_request(e.to_string()))?;
    Ok(body.notes.filter(|n| !n.trim().is_empty()))
}

pub async fn create(
    State(registry): State<Arc<Registry>>,
    auth: AuthUser,
    Json(req): Json<CreateRequest>,
) -> Result<(StatusCode, Json<RequisitionOrder>), HttpError> {
    let order = registry.services.requisition.create(&auth.0, req.blueprints).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn list(
    State(registry): State<Arc<Registry>>,
    auth: AuthUser,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<RequisitionOrder>>, HttpError> {
    let status = q
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<RequisitionStatus>)
        .transpose()
        .map_err(HttpError::bad_request)?;

    let orders = registry.services.requisition.list(&auth.0, status, q.character_id).await?;
    Ok(Json(orders))
}

pub async fn get(
    State(registry): State<Arc<Registry>>,
    auth: AuthUser,
    Path(id): Path<RequisitionId>,
) -> Result<Json<RequisitionOrder>, HttpError> {
    let order = registry.services.requisition.get(id).await?;
    if order.character_id != auth.0.character_id {
        auth.require(AuthLevel::Worker)?;
    }
    Ok(Json(order))
}

pub async fn act(
    State(registry): State<Arc<Registry>>,
    auth: AuthUser,
    Path((id, action)): Path<(RequisitionId, Action)>,
    body: Bytes,
) -> Result<Response, HttpError> {
    let requisitions = &registry.services.requisition;
    let response = match action {
        Action::Cancel => Json(requisitions.cancel(&auth.0, id).await?).into_response(),
        Action::Lock => {
            let user = auth.require(AuthLevel::Worker)?;
            Json(requisitions.lock(user, id).await?).into_response()
        }
        Action::Unlock => {
            requisitions.unlock(auth.require(AuthLevel::Worker)?, id)?;
            StatusCode::NO_CONTENT.into_response()
        }
        Action::Complete => {
            let user = auth.require(AuthLevel::Worker)?;
            Json(requisitions.complete(user, id, action_notes(&body)?).await?).into_response()
        }
        Action::Reject => {
            let user = auth.require(AuthLevel::Worker)?;
            Json(requisitions.reject(user, id, action_notes(&body)?).await?).into_response()
        }
    };
    Ok(response)
}
