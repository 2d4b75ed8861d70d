use crate::models::inventory::{
    BlueprintDetails, BlueprintKind, InventoryItem, LocationFlag, LocationKind, LocationType, StructureInfo,
};
use crate::models::types::{ItemId, LocationId, TypeId};
use serde::Deserialize;

pub const HANGAR_DIVISIONS: usize = 7;

/// Category the name endpoint uses for item types
pub const CATEGORY_INVENTORY_TYPE: &str = "inventory_type";

#[derive(Debug, Clone, Deserialize)]
pub struct RawAsset {
    pub item_id: ItemId,
    pub type_id: TypeId,
    pub location_id: LocationId,
    pub location_flag: String,
    pub location_type: String,
    pub quantity: i32,
}

impl RawAsset {
    pub fn into_item(self) -> InventoryItem {
        InventoryItem {
            item_id: self.item_id,
            type_id: self.type_id,
            location_id: self.location_id,
            location_flag: LocationFlag::from(self.location_flag),
            location_type: LocationType::from(self.location_type.as_str()),
            quantity: self.quantity,
            blueprint: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawBlueprint {
    pub item_id: ItemId,
    pub type_id: TypeId,
    pub location_id: LocationId,
    pub location_flag: String,
    pub quantity: i32,
    pub runs: i32,
    pub material_efficiency: i32,
    pub time_efficiency: i32,
}

impl RawBlueprint {
    /// Decodes the quantity sentinel into a [`BlueprintKind`]. Returns `None` for quantities
    /// the provider never documents (`0` or below `-2`).
    pub fn into_item(self) -> Option<InventoryItem> {
        let kind = BlueprintKind::from_quantity(self.quantity)?;

        // Blueprint listings carry no location type, derive it from the id range
        let location_type = match LocationKind::classify(self.location_id) {
            LocationKind::Station => LocationType::Station,
            LocationKind::SolarSystem => LocationType::SolarSystem,
            LocationKind::StructureOrItem => LocationType::Item,
            LocationKind::Other => LocationType::Other,
        };

        Some(InventoryItem {
            item_id: self.item_id,
            type_id: self.type_id,
            location_id: self.location_id,
            location_flag: LocationFlag::from(self.location_flag),
            location_type,
            quantity: self.quantity,
            blueprint: Some(BlueprintDetails {
                kind,
                runs: self.runs,
                material_efficiency: self.material_efficiency,
                time_efficiency: self.time_efficiency,
            }),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NameEntry {
    pub id: i64,
    pub name: String,
    pub category: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetName {
    pub item_id: ItemId,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DivisionEntry {
    pub division: i32,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DivisionsResponse {
    #[serde(default)]
    pub hangar: Vec<DivisionEntry>,
}

impl DivisionsResponse {
    /// Hangar names indexed by division (0-based). Unnamed or out of range divisions stay blank.
    pub fn hangar_names(&self) -> Vec<String> {
        let mut out = vec![String::new(); HANGAR_DIVISIONS];
        for entry in &self.hangar {
            let Some(slot) = usize::try_from(entry.division - 1).ok().and_then(|i| out.get_mut(i)) else {
                continue;
            };
            if let Some(name) = &entry.name {
                slot.clone_from(name);
            }
        }
        out
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationRecord {
    pub name: String,
    #[serde(default)]
    pub owner: Option<i32>,
    pub system_id: i32,
    pub type_id: TypeId,
}

impl From<StationRecord> for StructureInfo {
    fn from(s: StationRecord) -> Self {
        StructureInfo {
            name: s.name,
            owner_id: s.owner,
            solar_system_id: s.system_id,
            type_id: Some(s.type_id),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StructureRecord {
    pub name: String,
    pub owner_id: i32,
    pub solar_system_id: i32,
    #[serde(default)]
    pub type_id: Option<TypeId>,
}

impl From<StructureRecord> for StructureInfo {
    fn from(s: StructureRecord) -> Self {
        StructureInfo {
            name: s.name,
            owner_id: Some(s.owner_id),
            solar_system_id: s.solar_system_id,
            type_id: s.type_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blueprint_ingestion_drops_undocumented_quantities() {
        let raw: RawBlueprint = serde_json::from_str(
            r#"{"item_id": 1, "type_id": 100, "location_id": 60003760, "location_flag": "CorpSAG2",
                "quantity": 0, "runs": -1, "material_efficiency": 0, "time_efficiency": 0}"#,
        )
        .unwrap();
        assert!(raw.clone().into_item().is_none());

        let copy = RawBlueprint { quantity: -2, runs: 5, ..raw }.into_item().unwrap();
        assert_eq!(copy.blueprint.unwrap().kind, BlueprintKind::Copy);
        assert_eq!(copy.location_type, LocationType::Station);
        assert_eq!(copy.location_flag, LocationFlag::CorpSag(2));
    }

    #[test]
    fn hangar_names_are_indexed_by_division() {
        let resp: DivisionsResponse = serde_json::from_str(
            r#"{"hangar": [{"division": 2, "name": "Blueprints"}, {"division": 1, "name": "Main"},
                           {"division": 7}, {"division": 9, "name": "bogus"}]}"#,
        )
        .unwrap();
        let names = resp.hangar_names();
        assert_eq!(names.len(), HANGAR_DIVISIONS);
        assert_eq!(names[0], "Main");
        assert_eq!(names[1], "Blueprints");
        assert_eq!(names[6], "");
    }

    #[test]
    fn stations_and_structures_normalize_into_one_shape() {
        let station = StationRecord {
            name: "Jita IV - Moon 4".into(),
            owner: Some(1000035),
            system_id: 30000142,
            type_id: TypeId(52678),
        };
        let info = StructureInfo::from(station);
        assert_eq!(info.solar_system_id, 30000142);
        assert_eq!(info.owner_id, Some(1000035));
    }
}
