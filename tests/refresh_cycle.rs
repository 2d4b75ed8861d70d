use async_trait::async_trait;
use bpc_desk::esi::types::{
    AssetName, DivisionEntry, DivisionsResponse, NameEntry, RawAsset, RawBlueprint, StationRecord, StructureRecord,
};
use bpc_desk::esi::{ApiError, ApiResult, InventoryApi, Page};
use bpc_desk::inventory::{
    AuthContext, CredentialStore, RefreshEngine, RefreshMode, RefreshScheduler, ReferenceCache, RetryPolicy,
    SchedulerConfig, SchedulerState, SnapshotStore, TokenError, TokenExchange, TokenProvider,
};
use bpc_desk::models::inventory::AdminIdentity;
use bpc_desk::models::types::{CharacterId, CorporationId, ItemId, LocationId, TypeId};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const STATION: i64 = 60_003_760;
const CORP: i32 = 98_000_001;

/// One station, one hangar asset, one blueprint copy. The name endpoint can be switched off.
#[derive(Default)]
struct Provider {
    names_down: AtomicBool,
    name_calls: AtomicU32,
}

#[async_trait]
impl InventoryApi for Provider {
    async fn assets_page(&self, _ctx: &AuthContext, _corp: CorporationId, _page: u32) -> ApiResult<Page<RawAsset>> {
        Ok(Page {
            items: vec![RawAsset {
                item_id: ItemId(1_000_000_000_001),
                type_id: TypeId(100),
                location_id: LocationId(STATION),
                location_flag: "CorpSAG1".into(),
                location_type: "station".into(),
                quantity: 1,
            }],
            total_pages: 1,
        })
    }

    async fn blueprints_page(&self, _ctx: &AuthContext, _corp: CorporationId, _page: u32) -> ApiResult<Page<RawBlueprint>> {
        Ok(Page {
            items: vec![RawBlueprint {
                item_id: ItemId(1_000_000_000_001),
                type_id: TypeId(100),
                location_id: LocationId(STATION),
                location_flag: "CorpSAG1".into(),
                quantity: -2,
                runs: 1,
                material_efficiency: 10,
                time_efficiency: 20,
            }],
            total_pages: 1,
        })
    }

    async fn universe_names(&self, ids: &[TypeId]) -> ApiResult<Vec<NameEntry>> {
        self.name_calls.fetch_add(1, Ordering::SeqCst);
        if self.names_down.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                status: 502,
                body: "bad gateway".into(),
            });
        }
        Ok(ids
            .iter()
            .map(|id| NameEntry {
                id: i64::from(id.get()),
                name: format!("Blueprint {id}"),
                category: "inventory_type".into(),
            })
            .collect())
    }

    async fn asset_names(&self, _ctx: &AuthContext, _corp: CorporationId, _ids: &[ItemId]) -> ApiResult<Vec<AssetName>> {
        Ok(Vec::new())
    }

    async fn divisions(&self, _ctx: &AuthContext, _corp: CorporationId) -> ApiResult<DivisionsResponse> {
        Ok(DivisionsResponse {
            hangar: vec![DivisionEntry {
                division: 1,
                name: Some("Research".into()),
            }],
        })
    }

    async fn station(&self, _id: LocationId) -> ApiResult<StationRecord> {
        Ok(StationRecord {
            name: "Jita IV - Moon 4 - Caldari Navy Assembly Plant".into(),
            owner: Some(1_000_035),
            system_id: 30_000_142,
            type_id: TypeId(1_531),
        })
    }

    async fn structure(&self, _ctx: &AuthContext, id: LocationId) -> ApiResult<StructureRecord> {
        Err(ApiError::Status {
            status: 403,
            body: format!("no access to {id}"),
        })
    }
}

struct StoredToken;

#[async_trait]
impl CredentialStore for StoredToken {
    async fn refresh_credential(&self, _identity: &AdminIdentity) -> Result<Option<String>, TokenError> {
        Ok(Some("refresh-token".into()))
    }
}

struct Sso;

#[async_trait]
impl TokenExchange for Sso {
    async fn exchange(&self, _refresh_token: &str) -> Result<AuthContext, TokenError> {
        Ok(AuthContext::new("access-token", Duration::from_secs(20 * 60)))
    }
}

fn identity() -> AdminIdentity {
    AdminIdentity::new(CharacterId(2_112_000_001), CorporationId(CORP))
}

#[tokio::test(start_paused = true)]
async fn cycle_publishes_stacks_even_when_names_fail() {
    let api = Arc::new(Provider::default());
    api.names_down.store(true, Ordering::SeqCst);

    let cache = Arc::new(ReferenceCache::new());
    let store = Arc::new(SnapshotStore::new());
    let engine = RefreshEngine::new(api.clone(), cache.clone(), store.clone(), RetryPolicy::default());

    let ctx = AuthContext::new("access-token", Duration::from_secs(600));
    let report = engine.run_cycle(&ctx, &identity(), RefreshMode::Full).await.unwrap();

    assert_eq!(report.generation, 1);
    assert_eq!(report.copy_stacks, 1);
    assert_eq!(report.original_stacks, 0);
    assert_eq!(report.unresolved_types, 1);
    assert_eq!(report.unresolved_structures, 0);
    assert_eq!(api.name_calls.load(Ordering::SeqCst), RetryPolicy::default().max_attempts);

    let snap = store.read();
    let copies = &snap.copies[&TypeId(100)];
    assert_eq!(copies.len(), 1);
    assert_eq!(copies[0].quantity, 1);
    assert_eq!((copies[0].material_efficiency, copies[0].time_efficiency, copies[0].runs), (10, 20, 1));
    assert!(snap.originals.is_empty());

    assert_eq!(snap.tree.roots.len(), 1);
    assert!(snap.tree.roots.contains(&LocationId(STATION)));
    assert_eq!(snap.type_name(TypeId(100)), "");
    assert!(snap.location_name(LocationId(STATION)).starts_with("Jita IV"));
    assert_eq!(snap.hangar_names[0], "Research");

    // names come back, the next incremental cycle fills the gap
    api.names_down.store(false, Ordering::SeqCst);
    let report = engine.run_cycle(&ctx, &identity(), RefreshMode::Incremental).await.unwrap();
    assert_eq!(report.generation, 2);
    assert_eq!(report.unresolved_types, 0);
    assert_eq!(store.read().type_name(TypeId(100)), "Blueprint 100");
}

#[tokio::test(start_paused = true)]
async fn scheduler_refreshes_as_soon_as_a_token_is_available() {
    let api = Arc::new(Provider::default());
    let store = Arc::new(SnapshotStore::new());
    let engine = Arc::new(RefreshEngine::new(
        api,
        Arc::new(ReferenceCache::new()),
        store.clone(),
        RetryPolicy::default(),
    ));
    let tokens = Arc::new(TokenProvider::new(Arc::new(StoredToken), Arc::new(Sso), Some(identity())));

    let shutdown = CancellationToken::new();
    let (scheduler, handle) = RefreshScheduler::new(engine, tokens, SchedulerConfig::default(), shutdown.clone());
    let task = tokio::spawn(scheduler.run());

    let mut states = handle.subscribe();
    states
        .wait_for(|s| *s == SchedulerState::Idle && store.generation() == 1)
        .await
        .unwrap();
    assert_eq!(store.read().copies.len(), 1);

    shutdown.cancel();
    task.await.unwrap();
    assert_eq!(handle.state(), SchedulerState::Stopped);
}
