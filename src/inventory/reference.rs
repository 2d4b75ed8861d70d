use crate::models::inventory::StructureInfo;
use crate::models::types::{ItemId, LocationId, TypeId};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::collections::HashMap;
use std::hash::Hash;

/// Process wide id to name caches shared by the resolver and HTTP handlers.
///
/// Entries are only ever added. Names for a given id are assumed stable for the lifetime of the
/// process, so a racing second insert for the same id is simply ignored.
#[derive(Debug, Default)]
pub struct ReferenceCache {
    types: DashMap<TypeId, String>,
    containers: DashMap<ItemId, String>,
    structures: DashMap<LocationId, StructureInfo>,
}

fn insert_new<K: Eq + Hash, V>(map: &DashMap<K, V>, entries: impl IntoIterator<Item = (K, V)>) -> usize {
    let mut added = 0;
    for (k, v) in entries {
        if let Entry::Vacant(slot) = map.entry(k) {
            slot.insert(v);
            added += 1;
        }
    }
    added
}

fn copy_out<K: Eq + Hash + Copy, V: Clone>(map: &DashMap<K, V>) -> HashMap<K, V> {
    map.iter().map(|e| (*e.key(), e.value().clone())).collect()
}

impl ReferenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn type_name(&self, id: TypeId) -> Option<String> {
        self.types.get(&id).map(|n| n.value().clone())
    }

    pub fn has_type(&self, id: TypeId) -> bool {
        self.types.contains_key(&id)
    }

    pub fn has_container(&self, id: ItemId) -> bool {
        self.containers.contains_key(&id)
    }

    pub fn has_structure(&self, id: LocationId) -> bool {
        self.structures.contains_key(&id)
    }

    /// Returns how many of the entries were new
    pub fn insert_types(&self, entries: impl IntoIterator<Item = (TypeId, String)>) -> usize {
        insert_new(&self.types, entries)
    }

    pub fn insert_containers(&self, entries: impl IntoIterator<Item = (ItemId, String)>) -> usize {
        insert_new(&self.containers, entries)
    }

    pub fn insert_structures(&self, entries: impl IntoIterator<Item = (LocationId, StructureInfo)>) -> usize {
        insert_new(&self.structures, entries)
    }

    pub fn type_names(&self) -> HashMap<TypeId, String> {
        copy_out(&self.types)
    }

    pub fn container_names(&self) -> HashMap<ItemId, String> {
        copy_out(&self.containers)
    }

    pub fn structures(&self) -> HashMap<LocationId, StructureInfo> {
        copy_out(&self.structures)
    }

    pub fn len(&self) -> usize {
        self.types.len() + self.containers.len() + self.structures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
