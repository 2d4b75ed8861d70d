use crate::Registry;
use crate::net::http::auth::AuthUser;
use crate::services::{BlueprintKindFilter, BlueprintView};
use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub kind: BlueprintKindFilter,
}

pub async fn list(
    State(registry): State<Arc<Registry>>,
    _user: AuthUser,
    Query(q): Query<ListQuery>,
) -> Json<BlueprintView> {
    Json(registry.services.blueprint.list(q.kind))
}
