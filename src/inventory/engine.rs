use crate::esi::InventoryApi;
use crate::esi::types::{RawAsset, RawBlueprint};
use crate::inventory::fetcher::{FetchError, RetryPolicy, fetch_all_pages, with_retry};
use crate::inventory::reconcile::{RefreshMode, reconcile};
use crate::inventory::reference::ReferenceCache;
use crate::inventory::resolver::NameResolver;
use crate::inventory::snapshot::{InventorySnapshot, SnapshotStore};
use crate::inventory::token::AuthContext;
use crate::models::inventory::{AdminIdentity, InventoryItem};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

#[derive(Debug, Clone, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("no admin identity configured")]
    NoIdentity,
}

impl RefreshError {
    pub fn is_retries_exceeded(&self) -> bool {
        matches!(self, RefreshError::Fetch(FetchError::RetriesExceeded { .. }))
    }
}

/// Summary of one successful cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub generation: u64,
    pub assets: usize,
    pub blueprints: usize,
    /// Blueprint records with an undocumented quantity
    pub dropped_blueprints: usize,
    pub original_stacks: usize,
    pub copy_stacks: usize,
    pub unresolved_types: usize,
    pub unresolved_containers: usize,
    pub unresolved_structures: usize,
    pub duration: Duration,
}

/// Fetches, reconciles and names one inventory snapshot, then publishes it.
pub struct RefreshEngine {
    api: Arc<dyn InventoryApi>,
    resolver: NameResolver,
    cache: Arc<ReferenceCache>,
    store: Arc<SnapshotStore>,
    retry: RetryPolicy,
}

impl RefreshEngine {
    pub fn new(
        api: Arc<dyn InventoryApi>,
        cache: Arc<ReferenceCache>,
        store: Arc<SnapshotStore>,
        retry: RetryPolicy,
    ) -> Self {
        let resolver = NameResolver::new(api.clone(), cache.clone(), retry.clone());
        Self {
            api,
            resolver,
            cache,
            store,
            retry,
        }
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    /// Runs one cycle. On error nothing is published and the previous snapshot stays current.
    #[tracing::instrument(skip_all, fields(corp = %identity.corporation_id, mode = ?mode))]
    pub async fn run_cycle(
        &self,
        ctx: &AuthContext,
        identity: &AdminIdentity,
        mode: RefreshMode,
    ) -> Result<RefreshReport, RefreshError> {
        let started = Instant::now();
        let corp = identity.corporation_id;

        let (assets, blueprints, divisions) = tokio::join!(
            fetch_all_pages("assets", &self.retry, |page| self.api.assets_page(ctx, corp, page)),
            fetch_all_pages("blueprints", &self.retry, |page| self.api.blueprints_page(ctx, corp, page)),
            with_retry("divisions", 1, &self.retry, || self.api.divisions(ctx, corp)),
        );
        let (assets, blueprints) = (assets?, blueprints?);

        let hangar_names = match divisions {
            Ok(d) => d.hangar_names(),
            Err(e) => {
                tracing::warn!(error = %e, "keeping previous hangar names");
                self.store.read().hangar_names.clone()
            }
        };

        let assets: Vec<InventoryItem> = assets.into_iter().map(RawAsset::into_item).collect();
        let (blueprints, dropped_blueprints) = ingest_blueprints(blueprints);

        let rec = reconcile(&assets, &blueprints, &self.cache, mode);
        tracing::debug!(
            types = rec.unknown.types.len(),
            containers = rec.unknown.containers.len(),
            structures = rec.unknown.structures.len(),
            "resolving unknown ids"
        );

        let (_, _, _) = tokio::join!(
            self.resolver.resolve_type_names(rec.unknown.types.iter().copied()),
            self.resolver.resolve_container_names(ctx, corp, rec.unknown.containers.iter().copied()),
            self.resolver.resolve_structure_names(ctx, rec.unknown.structures.iter().copied()),
        );

        let unresolved_types = rec.unknown.types.iter().filter(|id| !self.cache.has_type(**id)).count();
        let unresolved_containers = rec.unknown.containers.iter().filter(|id| !self.cache.has_container(**id)).count();
        let unresolved_structures = rec.unknown.structures.iter().filter(|id| !self.cache.has_structure(**id)).count();

        let mut report = RefreshReport {
            assets: assets.len(),
            blueprints: blueprints.len(),
            dropped_blueprints,
            original_stacks: rec.originals.values().map(Vec::len).sum(),
            copy_stacks: rec.copies.values().map(Vec::len).sum(),
            unresolved_types,
            unresolved_containers,
            unresolved_structures,
            ..Default::default()
        };

        let snapshot = InventorySnapshot {
            generation: 0,
            refreshed_at: Some(Utc::now()),
            originals: rec.originals,
            copies: rec.copies,
            tree: rec.tree,
            type_names: self.cache.type_names(),
            container_names: self.cache.container_names(),
            structures: self.cache.structures(),
            hangar_names,
        };

        report.generation = self.store.publish(snapshot);
        report.duration = started.elapsed();

        tracing::info!(
            generation = report.generation,
            assets = report.assets,
            blueprints = report.blueprints,
            dropped = report.dropped_blueprints,
            original_stacks = report.original_stacks,
            copy_stacks = report.copy_stacks,
            unresolved_types = report.unresolved_types,
            unresolved_containers = report.unresolved_containers,
            unresolved_structures = report.unresolved_structures,
            duration_ms = u64::try_from(report.duration.as_millis()).unwrap_or(u64::MAX),
            "published inventory snapshot"
        );

        Ok(report)
    }
}

fn ingest_blueprints(raw: Vec<RawBlueprint>) -> (Vec<InventoryItem>, usize) {
    let mut dropped = 0;
    let items = raw
        .into_iter()
        .filter_map(|bp| {
            let (item_id, quantity) = (bp.item_id, bp.quantity);
            let item = bp.into_item();
            if item.is_none() {
                tracing::error!(%item_id, quantity, "dropping blueprint with undocumented quantity");
                dropped += 1;
            }
            item
        })
        .collect();
    (items, dropped)
}
