use crate::inventory::reference::ReferenceCache;
use crate::models::inventory::{BlueprintDetails, BlueprintStack, InventoryItem, LocationFlag};
use crate::models::types::{ItemId, LocationId, TypeId};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Blueprint stacks per type id, each type's stacks sorted by quality.
pub type StackMap = BTreeMap<TypeId, Vec<BlueprintStack>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Every id counts as unknown
    Full,
    /// Only ids missing from the reference cache count as unknown
    Incremental,
}

/// A node of the containment tree. Locations that are not owned items (stations, structures,
/// solar systems) appear as nodes without an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssetNode {
    pub item: Option<InventoryItem>,
    pub children: BTreeSet<ItemId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssetTree {
    pub nodes: HashMap<LocationId, AssetNode>,
    pub roots: BTreeSet<LocationId>,
}

impl AssetTree {
    pub fn node(&self, id: LocationId) -> Option<&AssetNode> {
        self.nodes.get(&id)
    }

    /// Number of owned items in the tree
    pub fn item_count(&self) -> usize {
        self.nodes.values().filter(|n| n.item.is_some()).count()
    }

    /// Builds the tree. Every asset becomes exactly one node, hung under the node of its location.
    pub fn build(assets: &[InventoryItem]) -> Self {
        // Last record wins if pagination shifted an item across pages
        let mut by_id: HashMap<ItemId, &InventoryItem> = HashMap::with_capacity(assets.len());
        for asset in assets {
            by_id.insert(asset.item_id, asset);
        }

        let mut nodes: HashMap<LocationId, AssetNode> = HashMap::with_capacity(by_id.len() * 2);
        for (id, asset) in &by_id {
            nodes.entry(LocationId::from(*id)).or_default().item = Some((*asset).clone());
            if asset.location_id == LocationId::from(*id) {
                continue;
            }
            nodes.entry(asset.location_id).or_default().children.insert(*id);
        }

        let roots = nodes
            .iter()
            .filter(|(_, node)| node.item.is_none())
            .map(|(id, _)| *id)
            .collect();

        Self { nodes, roots }
    }
}

/// Ids the resolver should look up after a reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnknownIds {
    pub types: BTreeSet<TypeId>,
    pub containers: BTreeSet<ItemId>,
    pub structures: BTreeSet<LocationId>,
}

impl UnknownIds {
    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.containers.is_empty() && self.structures.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    pub originals: StackMap,
    pub copies: StackMap,
    pub tree: AssetTree,
    pub unknown: UnknownIds,
}

/// Merges blueprint records into stacks of identical quality, split into originals and copies.
pub fn coalesce<'a>(blueprints: impl IntoIterator<Item = &'a InventoryItem>) -> (StackMap, StackMap) {
    let mut originals = StackMap::new();
    let mut copies = StackMap::new();

    for item in blueprints {
        let Some(bp) = item.blueprint.as_ref() else {
            continue;
        };

        let bucket = if bp.kind.is_copy() { &mut copies } else { &mut originals };
        let stacks = bucket.entry(item.type_id).or_default();
        add_to_stacks(stacks, item.type_id, bp);
    }

    for stacks in originals.values_mut().chain(copies.values_mut()) {
        stacks.sort_by_key(|s| (s.material_efficiency, s.time_efficiency, s.runs));
    }

    (originals, copies)
}

fn add_to_stacks(stacks: &mut Vec<BlueprintStack>, type_id: TypeId, bp: &BlueprintDetails) {
    match stacks.iter_mut().find(|s| s.same_quality(bp)) {
        Some(stack) => stack.quantity += bp.kind.count(),
        None => stacks.push(BlueprintStack {
            type_id,
            material_efficiency: bp.material_efficiency,
            time_efficiency: bp.time_efficiency,
            runs: bp.runs,
            quantity: bp.kind.count(),
        }),
    }
}

/// Works out which ids still need a name.
///
/// Containers are owned items holding other items, except the asset safety and office wrappers
/// the name endpoint refuses. Structures are the non-owned locations assets sit in directly,
/// skipping assets that are themselves in asset safety.
fn unknown_ids(assets: &[InventoryItem], blueprints: &[InventoryItem], tree: &AssetTree, cache: &ReferenceCache, mode: RefreshMode) -> UnknownIds {
    let full = mode == RefreshMode::Full;
    let mut unknown = UnknownIds::default();

    for bp in blueprints {
        if full || !cache.has_type(bp.type_id) {
            unknown.types.insert(bp.type_id);
        }
    }

    for asset in assets {
        match tree.node(asset.location_id).and_then(|n| n.item.as_ref()) {
            Some(parent) => {
                if parent.location_flag.is_unnamed_wrapper() {
                    continue;
                }
                let container = asset.location_id.as_item();
                if full || !cache.has_container(container) {
                    unknown.containers.insert(container);
                }
            }
            None => {
                if asset.location_flag == LocationFlag::AssetSafety {
                    continue;
                }
                if full || !cache.has_structure(asset.location_id) {
                    unknown.structures.insert(asset.location_id);
                }
            }
        }
    }

    unknown
}

/// Builds stacks, containment tree and the unknown id sets for one refresh. Pure, performs no I/O.
pub fn reconcile(assets: &[InventoryItem], blueprints: &[InventoryItem], cache: &ReferenceCache, mode: RefreshMode) -> Reconciliation {
    let (originals, copies) = coalesce(blueprints);
    let tree = AssetTree::build(assets);
    let unknown = unknown_ids(assets, blueprints, &tree, cache, mode);

    Reconciliation {
        originals,
        copies,
        tree,
        unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::testing::{raw_asset, raw_blueprint};
    use crate::models::inventory::StructureInfo;

    fn blueprint(item: i64, type_id: i32, quantity: i32, runs: i32, me: i32, te: i32) -> InventoryItem {
        raw_blueprint(item, type_id, 60003760, quantity, runs, me, te).into_item().unwrap()
    }

    #[test]
    fn copies_and_originals_land_in_separate_buckets() {
        let bps = vec![
            blueprint(1, 100, -2, 10, 10, 20),
            blueprint(2, 100, -2, 10, 10, 20),
            blueprint(3, 100, -1, -1, 10, 20),
            blueprint(4, 100, 7, -1, 0, 0),
            blueprint(5, 100, 3, -1, 0, 0),
            blueprint(6, 200, -2, 1, 0, 0),
        ];
        let (originals, copies) = coalesce(&bps);

        assert_eq!(copies[&TypeId(100)].len(), 1);
        assert_eq!(copies[&TypeId(100)][0].quantity, 2);
        assert_eq!(copies[&TypeId(200)][0].quantity, 1);

        let bpo = &originals[&TypeId(100)];
        assert_eq!(bpo.len(), 2);
        assert_eq!(bpo[0].material_efficiency, 0);
        assert_eq!(bpo[0].quantity, 10);
        assert_eq!(bpo[1].quantity, 1);
        assert!(!originals.contains_key(&TypeId(200)));
    }

    #[test]
    fn coalescing_ignores_input_order() {
        let mut bps = vec![
            blueprint(1, 100, -2, 10, 10, 20),
            blueprint(2, 100, -2, 5, 10, 20),
            blueprint(3, 100, -2, 10, 10, 20),
            blueprint(4, 100, 2, -1, 0, 0),
            blueprint(5, 300, -1, -1, 8, 16),
            blueprint(6, 100, 5, -1, 0, 0),
        ];
        let forward = coalesce(&bps);
        bps.reverse();
        let backward = coalesce(&bps);
        assert_eq!(forward, backward);
        assert_eq!(coalesce(&bps), backward);
    }

    #[test]
    fn every_asset_is_one_node_under_its_location() {
        let assets: Vec<InventoryItem> = vec![
            raw_asset(1_000_000_001, 27, 60003760, "OfficeFolder", "station"),
            raw_asset(1_000_000_002, 17366, 1_000_000_001, "CorpSAG1", "item"),
            raw_asset(1_000_000_003, 34, 1_000_000_002, "Unlocked", "item"),
            raw_asset(1_000_000_004, 34, 1_000_000_002, "Unlocked", "item"),
            raw_asset(1_000_000_005, 587, 30000142, "AssetSafety", "solar_system"),
        ]
        .into_iter()
        .map(|a| a.into_item())
        .collect();

        let tree = AssetTree::build(&assets);
        assert_eq!(tree.item_count(), assets.len());

        for asset in &assets {
            let parent = tree.node(asset.location_id).unwrap();
            assert!(parent.children.contains(&asset.item_id));
            let holders = tree.nodes.values().filter(|n| n.children.contains(&asset.item_id)).count();
            assert_eq!(holders, 1);
        }

        let roots: Vec<_> = tree.roots.iter().copied().collect();
        assert_eq!(roots, vec![LocationId(30000142), LocationId(60003760)]);
        let mut top: Vec<_> = tree.roots.iter().flat_map(|r| tree.node(*r).unwrap().children.iter().copied()).collect();
        top.sort();
        assert_eq!(top, vec![ItemId(1_000_000_001), ItemId(1_000_000_005)]);
    }

    #[test]
    fn unknown_ids_skip_cached_and_wrapped_locations() {
        let assets: Vec<InventoryItem> = vec![
            raw_asset(1_000_000_001, 27, 60003760, "OfficeFolder", "station"),
            raw_asset(1_000_000_002, 17366, 1_000_000_001, "CorpSAG1", "item"),
            raw_asset(1_000_000_003, 34, 1_000_000_002, "Unlocked", "item"),
            raw_asset(1_000_000_005, 587, 30000142, "AssetSafety", "solar_system"),
            raw_asset(1_000_000_006, 587, 1_035_466_617_946, "CorpSAG2", "item"),
        ]
        .into_iter()
        .map(|a| a.into_item())
        .collect();
        let bps = vec![blueprint(9, 100, -2, 1, 0, 0), blueprint(10, 200, -2, 1, 0, 0)];

        let cache = ReferenceCache::new();
        cache.insert_types([(TypeId(200), "Cached Blueprint".to_string())]);
        cache.insert_structures([(
            LocationId(60003760),
            StructureInfo {
                name: "Jita IV - Moon 4".into(),
                owner_id: None,
                solar_system_id: 30000142,
                type_id: None,
            },
        )]);

        let inc = reconcile(&assets, &bps, &cache, RefreshMode::Incremental);
        assert_eq!(inc.unknown.types.iter().copied().collect::<Vec<_>>(), vec![TypeId(100)]);
        // office folder wraps the hangar, so only the container inside it gets a name lookup
        assert_eq!(inc.unknown.containers.iter().copied().collect::<Vec<_>>(), vec![ItemId(1_000_000_002)]);
        assert_eq!(
            inc.unknown.structures.iter().copied().collect::<Vec<_>>(),
            vec![LocationId(1_035_466_617_946)]
        );

        let full = reconcile(&assets, &bps, &cache, RefreshMode::Full);
        assert_eq!(full.unknown.types.len(), 2);
        assert!(full.unknown.structures.contains(&LocationId(60003760)));
        assert!(!full.unknown.structures.contains(&LocationId(30000142)));
    }
}
