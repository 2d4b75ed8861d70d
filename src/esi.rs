//! Client side of the EVE Swagger Interface and its SSO.
//!
//! [`InventoryApi`] is the narrow surface the refresh engine needs from the upstream provider.
//! [`EsiClient`] is the production implementation, tests substitute an in-memory fake.

pub mod client;
pub mod sso;
pub mod types;

pub use client::EsiClient;
pub use sso::SsoTokenExchange;

use crate::inventory::token::AuthContext;
use crate::models::types::{CorporationId, ItemId, LocationId, TypeId};
use reqwest::StatusCode;
use thiserror::Error;
use types::{AssetName, DivisionsResponse, NameEntry, RawAsset, RawBlueprint, StationRecord, StructureRecord};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Connection failures and timeouts
    #[error("transport error: {0}")]
    Transport(String),

    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("cannot decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// 420 is the provider's own "error limited" status.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ApiError::Status { status: 420 | 429, .. })
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => StatusCode::from_u16(*status).ok(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            return ApiError::Decode(e.to_string());
        }
        ApiError::Transport(e.to_string())
    }
}

/// One page of a paginated listing together with the page count the provider reported for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_pages: u32,
}

#[async_trait::async_trait]
pub trait InventoryApi: Send + Sync {
    async fn assets_page(&self, ctx: &AuthContext, corp: CorporationId, page: u32) -> ApiResult<Page<RawAsset>>;
    async fn blueprints_page(&self, ctx: &AuthContext, corp: CorporationId, page: u32) -> ApiResult<Page<RawBlueprint>>;

    /// Resolves ids of any category. Unauthenticated.
    async fn universe_names(&self, ids: &[TypeId]) -> ApiResult<Vec<NameEntry>>;
    /// Names given by players to corporation owned containers and ships
    async fn asset_names(&self, ctx: &AuthContext, corp: CorporationId, ids: &[ItemId]) -> ApiResult<Vec<AssetName>>;

    async fn divisions(&self, ctx: &AuthContext, corp: CorporationId) -> ApiResult<DivisionsResponse>;
    async fn station(&self, id: LocationId) -> ApiResult<StationRecord>;
    async fn structure(&self, ctx: &AuthContext, id: LocationId) -> ApiResult<StructureRecord>;
}
