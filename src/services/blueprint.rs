use crate::inventory::SnapshotStore;
use crate::models::inventory::BlueprintStack;
use crate::models::types::TypeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlueprintKindFilter {
    #[default]
    Copies,
    Originals,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlueprintGroup {
    pub type_id: TypeId,
    pub name: String,
    pub stacks: Vec<BlueprintStack>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlueprintView {
    pub generation: u64,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub blueprints: Vec<BlueprintGroup>,
}

/// Read side of the inventory snapshot for the blueprint listing.
pub struct BlueprintService {
    store: Arc<SnapshotStore>,
}

impl BlueprintService {
    pub fn new(store: Arc<SnapshotStore>) -> Self {
        Self { store }
    }

    pub fn list(&self, kind: BlueprintKindFilter) -> BlueprintView {
        let snap = self.store.read();
        let stacks = match kind {
            BlueprintKindFilter::Copies => &snap.copies,
            BlueprintKindFilter::Originals => &snap.originals,
        };

        let blueprints = stacks
            .iter()
            .map(|(type_id, stacks)| BlueprintGroup {
                type_id: *type_id,
                name: snap.type_name(*type_id).to_string(),
                stacks: stacks.clone(),
            })
            .collect();

        BlueprintView {
            generation: snap.generation,
            refreshed_at: snap.refreshed_at,
            blueprints,
        }
    }
}
