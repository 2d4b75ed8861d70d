use super::types::{AssetName, DivisionsResponse, NameEntry, RawAsset, RawBlueprint, StationRecord, StructureRecord};
use super::{ApiError, ApiResult, InventoryApi, Page};
use crate::inventory::token::AuthContext;
use crate::models::types::{CorporationId, ItemId, LocationId, TypeId};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

const HEADER_PAGES: &str = "x-pages";
const DATASOURCE: &str = "tranquility";

/// Thin reqwest wrapper around the ESI routes the refresh engine uses.
#[derive(Debug, Clone)]
pub struct EsiClient {
    http: Client,
    base_url: String,
}

impl EsiClient {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> ApiResult<Self> {
        let http = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, req: RequestBuilder) -> ApiResult<Response> {
        let resp = req.query(&[("datasource", DATASOURCE)]).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }

    async fn get_page<T: DeserializeOwned>(&self, ctx: &AuthContext, path: &str, page: u32) -> ApiResult<Page<T>> {
        let req = self
            .http
            .get(self.url(path))
            .bearer_auth(ctx.access_token())
            .query(&[("page", page)]);
        let resp = self.send(req).await?;

        // A missing or garbled header means the listing fits on one page
        let total_pages = resp
            .headers()
            .get(HEADER_PAGES)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(1);

        let items = resp.json::<Vec<T>>().await?;
        Ok(Page { items, total_pages })
    }

    async fn get_json<T: DeserializeOwned>(&self, ctx: Option<&AuthContext>, path: &str) -> ApiResult<T> {
        let mut req = self.http.get(self.url(path));
        if let Some(ctx) = ctx {
            req = req.bearer_auth(ctx.access_token());
        }
        Ok(self.send(req).await?.json::<T>().await?)
    }
}

#[async_trait::async_trait]
impl InventoryApi for EsiClient {
    async fn assets_page(&self, ctx: &AuthContext, corp: CorporationId, page: u32) -> ApiResult<Page<RawAsset>> {
        self.get_page(ctx, &format!("/corporations/{corp}/assets/"), page).await
    }

    async fn blueprints_page(&self, ctx: &AuthContext, corp: CorporationId, page: u32) -> ApiResult<Page<RawBlueprint>> {
        self.get_page(ctx, &format!("/corporations/{corp}/blueprints/"), page).await
    }

    async fn universe_names(&self, ids: &[TypeId]) -> ApiResult<Vec<NameEntry>> {
        let req = self.http.post(self.url("/universe/names/")).json(ids);
        Ok(self.send(req).await?.json().await?)
    }

    async fn asset_names(&self, ctx: &AuthContext, corp: CorporationId, ids: &[ItemId]) -> ApiResult<Vec<AssetName>> {
        let req = self
            .http
            .post(self.url(&format!("/corporations/{corp}/assets/names/")))
            .bearer_auth(ctx.access_token())
            .json(ids);
        Ok(self.send(req).await?.json().await?)
    }

    async fn divisions(&self, ctx: &AuthContext, corp: CorporationId) -> ApiResult<DivisionsResponse> {
        self.get_json(Some(ctx), &format!("/corporations/{corp}/divisions/")).await
    }

    async fn station(&self, id: LocationId) -> ApiResult<StationRecord> {
        self.get_json(None, &format!("/universe/stations/{id}/")).await
    }

    async fn structure(&self, ctx: &AuthContext, id: LocationId) -> ApiResult<StructureRecord> {
        self.get_json(Some(ctx), &format!("/universe/structures/{id}/")).await
    }
}
