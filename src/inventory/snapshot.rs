use crate::inventory::reconcile::{AssetTree, StackMap};
use crate::models::inventory::StructureInfo;
use crate::models::types::{ItemId, LocationId, TypeId};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// One complete, immutable view of the corporation inventory.
#[derive(Debug, Clone, Default)]
pub struct InventorySnapshot {
    /// 0 until the first refresh has been published
    pub generation: u64,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub originals: StackMap,
    pub copies: StackMap,
    pub tree: AssetTree,
    pub type_names: HashMap<TypeId, String>,
    pub container_names: HashMap<ItemId, String>,
    pub structures: HashMap<LocationId, StructureInfo>,
    /// Corporation hangar names, indexed by division
    pub hangar_names: Vec<String>,
}

impl InventorySnapshot {
    pub fn type_name(&self, id: TypeId) -> &str {
        self.type_names.get(&id).map(String::as_str).unwrap_or_default()
    }

    /// Display name for a location: a named container, a station or structure, or blank.
    pub fn location_name(&self, id: LocationId) -> &str {
        if let Some(name) = self.container_names.get(&id.as_item()) {
            return name;
        }
        self.structures.get(&id).map(|s| s.name.as_str()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.generation == 0
    }
}

/// Holds the published snapshot. Readers clone an `Arc` under a short read lock, the single
/// writer swaps the whole handle under the write lock.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    current: RwLock<Arc<InventorySnapshot>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self) -> Arc<InventorySnapshot> {
        self.current.read().clone()
    }

    pub fn generation(&self) -> u64 {
        self.current.read().generation
    }

    /// Publishes `snapshot` as the next generation and returns that generation. Concurrent
    /// publishes are serialized, the last one wins.
    pub fn publish(&self, mut snapshot: InventorySnapshot) -> u64 {
        let mut current = self.current.write();
        snapshot.generation = current.generation + 1;
        let generation = snapshot.generation;
        *current = Arc::new(snapshot);
        generation
    }
}
