use crate::esi::InventoryApi;
use crate::esi::types::CATEGORY_INVENTORY_TYPE;
use crate::inventory::fetcher::{RetryPolicy, with_retry};
use crate::inventory::reference::ReferenceCache;
use crate::inventory::token::AuthContext;
use crate::models::inventory::{LocationKind, StructureInfo};
use crate::models::types::{CorporationId, ItemId, LocationId, TypeId};
use futures::StreamExt;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Upper bound on ids per bulk name request
pub const NAME_CHUNK_SIZE: usize = 1000;

/// Station and structure lookups are one request per id
const STRUCTURE_CONCURRENCY: usize = 8;

/// Resolves names for ids the [`ReferenceCache`] does not know yet and records them there.
///
/// Failures never propagate: a failed chunk or lookup is logged and its ids stay unresolved until
/// a later refresh picks them up again.
pub struct NameResolver {
    api: Arc<dyn InventoryApi>,
    cache: Arc<ReferenceCache>,
    retry: RetryPolicy,
}

impl NameResolver {
    pub fn new(api: Arc<dyn InventoryApi>, cache: Arc<ReferenceCache>, retry: RetryPolicy) -> Self {
        Self { api, cache, retry }
    }

    pub fn cache(&self) -> &Arc<ReferenceCache> {
        &self.cache
    }

    pub async fn resolve_type_names(&self, ids: impl IntoIterator<Item = TypeId>) -> HashMap<TypeId, String> {
        let ids: Vec<TypeId> = sorted_unique(ids).into_iter().filter(|id| !self.cache.has_type(*id)).collect();
        let mut resolved = HashMap::with_capacity(ids.len());

        for (chunk_no, chunk) in ids.chunks(NAME_CHUNK_SIZE).enumerate() {
            let page = chunk_page(chunk_no);
            match with_retry("type_names", page, &self.retry, || self.api.universe_names(chunk)).await {
                Ok(entries) => {
                    for entry in entries.into_iter().filter(|e| e.category == CATEGORY_INVENTORY_TYPE) {
                        let Ok(id) = i32::try_from(entry.id) else {
                            continue;
                        };
                        resolved.insert(TypeId(id), entry.name);
                    }
                }
                Err(e) => tracing::error!(chunk = page, ids = chunk.len(), error = %e, "skipping type name chunk"),
            }
        }

        self.cache.insert_types(resolved.iter().map(|(k, v)| (*k, v.clone())));
        resolved
    }

    pub async fn resolve_container_names(
        &self,
        ctx: &AuthContext,
        corp: CorporationId,
        ids: impl IntoIterator<Item = ItemId>,
    ) -> HashMap<ItemId, String> {
        let ids: Vec<ItemId> = sorted_unique(ids)
            .into_iter()
            .filter(|id| !self.cache.has_container(*id))
            .collect();
        let mut resolved = HashMap::with_capacity(ids.len());

        for (chunk_no, chunk) in ids.chunks(NAME_CHUNK_SIZE).enumerate() {
            let page = chunk_page(chunk_no);
            match with_retry("container_names", page, &self.retry, || self.api.asset_names(ctx, corp, chunk)).await {
                Ok(entries) => {
                    // Unnamed containers come back with the literal "None"
                    resolved.extend(
                        entries
                            .into_iter()
                            .filter(|e| !e.name.is_empty() && e.name != "None")
                            .map(|e| (e.item_id, e.name)),
                    );
                }
                Err(e) => tracing::error!(chunk = page, ids = chunk.len(), error = %e, "skipping container name chunk"),
            }
        }

        self.cache.insert_containers(resolved.iter().map(|(k, v)| (*k, v.clone())));
        resolved
    }

    pub async fn resolve_structure_names(
        &self,
        ctx: &AuthContext,
        ids: impl IntoIterator<Item = LocationId>,
    ) -> HashMap<LocationId, StructureInfo> {
        let ids: Vec<LocationId> = sorted_unique(ids)
            .into_iter()
            .filter(|id| !self.cache.has_structure(*id))
            .collect();

        let resolved: HashMap<LocationId, StructureInfo> = futures::stream::iter(ids)
            .map(|id| async move { self.lookup_structure(ctx, id).await.map(|info| (id, info)) })
            .buffer_unordered(STRUCTURE_CONCURRENCY)
            .filter_map(|r| async move { r })
            .collect()
            .await;

        self.cache.insert_structures(resolved.iter().map(|(k, v)| (*k, v.clone())));
        resolved
    }

    async fn lookup_structure(&self, ctx: &AuthContext, id: LocationId) -> Option<StructureInfo> {
        let result = match LocationKind::classify(id) {
            LocationKind::Station => with_retry("stations", 1, &self.retry, || self.api.station(id))
                .await
                .map(StructureInfo::from),
            LocationKind::StructureOrItem => with_retry("structures", 1, &self.retry, || self.api.structure(ctx, id))
                .await
                .map(StructureInfo::from),
            LocationKind::SolarSystem => return None,
            LocationKind::Other => {
                tracing::warn!(%id, "location id outside known ranges, not resolving");
                return None;
            }
        };

        match result {
            Ok(info) => Some(info),
            Err(e) => {
                tracing::warn!(%id, error = %e, "structure lookup failed");
                None
            }
        }
    }
}

fn sorted_unique<T: Ord>(ids: impl IntoIterator<Item = T>) -> BTreeSet<T> {
    ids.into_iter().collect()
}

fn chunk_page(chunk_no: usize) -> u32 {
    u32::try_from(chunk_no + 1).unwrap_or(u32::MAX)
}
