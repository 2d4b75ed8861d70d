//! In-memory collaborators for refresh engine tests.

use crate::esi::types::{
    AssetName, DivisionEntry, DivisionsResponse, NameEntry, RawAsset, RawBlueprint, StationRecord, StructureRecord,
    CATEGORY_INVENTORY_TYPE, HANGAR_DIVISIONS,
};
use crate::esi::{ApiError, ApiResult, InventoryApi, Page};
use crate::inventory::token::{AuthContext, CredentialStore, TokenError, TokenExchange};
use crate::models::inventory::AdminIdentity;
use crate::models::types::{CharacterId, CorporationId, ItemId, LocationId, TypeId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

pub fn admin() -> AdminIdentity {
    AdminIdentity::new(CharacterId(2112000001), CorporationId(98000001))
}

pub fn raw_asset(item_id: i64, type_id: i32, location_id: i64, flag: &str, location_type: &str) -> RawAsset {
    RawAsset {
        item_id: ItemId(item_id),
        type_id: TypeId(type_id),
        location_id: LocationId(location_id),
        location_flag: flag.to_string(),
        location_type: location_type.to_string(),
        quantity: 1,
    }
}

pub fn raw_blueprint(item_id: i64, type_id: i32, location_id: i64, quantity: i32, runs: i32, me: i32, te: i32) -> RawBlueprint {
    RawBlueprint {
        item_id: ItemId(item_id),
        type_id: TypeId(type_id),
        location_id: LocationId(location_id),
        location_flag: "CorpSAG1".to_string(),
        quantity,
        runs,
        material_efficiency: me,
        time_efficiency: te,
    }
}

fn unavailable() -> ApiError {
    ApiError::Status {
        status: 503,
        body: "service unavailable".into(),
    }
}

fn paginate<T: Clone>(all: &[T], page_size: usize, page: u32) -> ApiResult<Page<T>> {
    let page_size = page_size.max(1);
    let total_pages = u32::try_from(all.len().div_ceil(page_size).max(1)).unwrap_or(u32::MAX);
    let start = (page as usize - 1) * page_size;
    let items = all.iter().skip(start).take(page_size).cloned().collect();
    Ok(Page { items, total_pages })
}

/// Serves a fixed inventory. Every type, station and structure id resolves to a generated name.
#[derive(Default)]
pub struct FakeApi {
    assets: Mutex<Vec<RawAsset>>,
    blueprints: Mutex<Vec<RawBlueprint>>,
    container_names: Mutex<HashMap<ItemId, String>>,
    page_size: Mutex<Option<usize>>,
    fail_assets: AtomicBool,
    fail_divisions: AtomicBool,
    failing_type: Mutex<Option<TypeId>>,
    type_name_calls: Mutex<Vec<Vec<TypeId>>>,
    station_calls: Mutex<Vec<LocationId>>,
    structure_calls: Mutex<Vec<LocationId>>,
    asset_page_calls: AtomicU32,
}

impl FakeApi {
    pub fn set_assets(&self, assets: Vec<RawAsset>) {
        *self.assets.lock() = assets;
    }

    pub fn set_blueprints(&self, blueprints: Vec<RawBlueprint>) {
        *self.blueprints.lock() = blueprints;
    }

    pub fn set_page_size(&self, size: usize) {
        *self.page_size.lock() = Some(size);
    }

    pub fn set_container_name(&self, id: ItemId, name: &str) {
        self.container_names.lock().insert(id, name.to_string());
    }

    pub fn set_fail_assets(&self, fail: bool) {
        self.fail_assets.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_divisions(&self, fail: bool) {
        self.fail_divisions.store(fail, Ordering::SeqCst);
    }

    /// Any name chunk containing `id` fails
    pub fn fail_type_names_for(&self, id: TypeId) {
        *self.failing_type.lock() = Some(id);
    }

    pub fn type_name_calls(&self) -> Vec<Vec<TypeId>> {
        self.type_name_calls.lock().clone()
    }

    pub fn station_calls(&self) -> Vec<LocationId> {
        self.station_calls.lock().clone()
    }

    pub fn structure_calls(&self) -> Vec<LocationId> {
        self.structure_calls.lock().clone()
    }

    pub fn asset_page_calls(&self) -> u32 {
        self.asset_page_calls.load(Ordering::SeqCst)
    }

    fn page_size(&self) -> usize {
        self.page_size.lock().unwrap_or(1000)
    }
}

#[async_trait::async_trait]
impl InventoryApi for FakeApi {
    async fn assets_page(&self, _ctx: &AuthContext, _corp: CorporationId, page: u32) -> ApiResult<Page<RawAsset>> {
        self.asset_page_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_assets.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        paginate(&self.assets.lock(), self.page_size(), page)
    }

    async fn blueprints_page(&self, _ctx: &AuthContext, _corp: CorporationId, page: u32) -> ApiResult<Page<RawBlueprint>> {
        paginate(&self.blueprints.lock(), self.page_size(), page)
    }

    async fn universe_names(&self, ids: &[TypeId]) -> ApiResult<Vec<NameEntry>> {
        self.type_name_calls.lock().push(ids.to_vec());
        if let Some(failing) = *self.failing_type.lock() {
            if ids.contains(&failing) {
                return Err(unavailable());
            }
        }
        Ok(ids
            .iter()
            .map(|id| NameEntry {
                id: i64::from(id.get()),
                name: format!("Type {id}"),
                category: CATEGORY_INVENTORY_TYPE.to_string(),
            })
            .collect())
    }

    async fn asset_names(&self, _ctx: &AuthContext, _corp: CorporationId, ids: &[ItemId]) -> ApiResult<Vec<AssetName>> {
        let names = self.container_names.lock();
        Ok(ids
            .iter()
            .map(|id| AssetName {
                item_id: *id,
                name: names.get(id).cloned().unwrap_or_else(|| "None".to_string()),
            })
            .collect())
    }

    async fn divisions(&self, _ctx: &AuthContext, _corp: CorporationId) -> ApiResult<DivisionsResponse> {
        if self.fail_divisions.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(DivisionsResponse {
            hangar: (1..=HANGAR_DIVISIONS as i32)
                .map(|division| DivisionEntry {
                    division,
                    name: Some(format!("Division {division}")),
                })
                .collect(),
        })
    }

    async fn station(&self, id: LocationId) -> ApiResult<StationRecord> {
        self.station_calls.lock().push(id);
        Ok(StationRecord {
            name: format!("Station {id}"),
            owner: Some(1000035),
            system_id: 30000142,
            type_id: TypeId(52678),
        })
    }

    async fn structure(&self, _ctx: &AuthContext, id: LocationId) -> ApiResult<StructureRecord> {
        self.structure_calls.lock().push(id);
        Ok(StructureRecord {
            name: format!("Structure {id}"),
            owner_id: 98000001,
            solar_system_id: 30000142,
            type_id: Some(TypeId(35832)),
        })
    }
}

#[derive(Default)]
pub struct FakeCredentials {
    token: Mutex<Option<String>>,
}

impl FakeCredentials {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }

    pub fn set_token(&self, token: Option<&str>) {
        *self.token.lock() = token.map(str::to_string);
    }
}

#[async_trait::async_trait]
impl CredentialStore for FakeCredentials {
    async fn refresh_credential(&self, _identity: &AdminIdentity) -> Result<Option<String>, TokenError> {
        Ok(self.token.lock().clone())
    }
}

pub struct FakeExchange {
    lifetime: Duration,
    calls: AtomicU32,
}

impl FakeExchange {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            lifetime,
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TokenExchange for FakeExchange {
    async fn exchange(&self, refresh_token: &str) -> Result<AuthContext, TokenError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(AuthContext::new(format!("{refresh_token}-access-{n}"), self.lifetime))
    }
}
