use crate::models::types::{CharacterId, CorporationId, ItemId, LocationId, TypeId};
use serde::{Deserialize, Serialize};

/// Semantic slot an item occupies inside its location.
///
/// Only the flags the refresh engine reasons about get their own variant, everything else is
/// carried verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LocationFlag {
    AssetSafety,
    OfficeFolder,
    Hangar,
    /// Corporation hangar division (1-7)
    CorpSag(u8),
    CorpDeliveries,
    Cargo,
    Other(String),
}

impl LocationFlag {
    pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
        match self {
            LocationFlag::AssetSafety => "AssetSafety".into(),
            LocationFlag::OfficeFolder => "OfficeFolder".into(),
            LocationFlag::Hangar => "Hangar".into(),
            LocationFlag::CorpSag(n) => format!("CorpSAG{n}").into(),
            LocationFlag::CorpDeliveries => "CorpDeliveries".into(),
            LocationFlag::Cargo => "Cargo".into(),
            LocationFlag::Other(s) => s.as_str().into(),
        }
    }

    /// Wrappers the upstream name endpoint refuses to resolve.
    pub fn is_unnamed_wrapper(&self) -> bool {
        matches!(self, LocationFlag::AssetSafety | LocationFlag::OfficeFolder)
    }
}

impl From<&str> for LocationFlag {
    fn from(s: &str) -> Self {
        match s {
            "AssetSafety" => LocationFlag::AssetSafety,
            "OfficeFolder" => LocationFlag::OfficeFolder,
            "Hangar" => LocationFlag::Hangar,
            "CorpDeliveries" => LocationFlag::CorpDeliveries,
            "Cargo" => LocationFlag::Cargo,
            other => match other.strip_prefix("CorpSAG").and_then(|n| n.parse::<u8>().ok()) {
                Some(n @ 1..=7) => LocationFlag::CorpSag(n),
                _ => LocationFlag::Other(other.to_string()),
            },
        }
    }
}

impl From<String> for LocationFlag {
    fn from(s: String) -> Self {
        LocationFlag::from(s.as_str())
    }
}

impl From<LocationFlag> for String {
    fn from(f: LocationFlag) -> Self {
        f.as_str().into_owned()
    }
}

impl std::fmt::Display for LocationFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_str())
    }
}

/// What the asset record itself says its location is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    Station,
    SolarSystem,
    Item,
    Other,
}

impl From<&str> for LocationType {
    fn from(s: &str) -> Self {
        match s {
            "station" => LocationType::Station,
            "solar_system" => LocationType::SolarSystem,
            "item" => LocationType::Item,
            _ => LocationType::Other,
        }
    }
}

/// Classification of a location id purely from its numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationKind {
    SolarSystem,
    Station,
    /// Player structures and items share the same id space.
    StructureOrItem,
    Other,
}

impl LocationKind {
    pub fn classify(id: LocationId) -> Self {
        match id.get() {
            30_000_000..40_000_000 => LocationKind::SolarSystem,
            60_000_000..64_000_000 => LocationKind::Station,
            n if n >= 100_000_000 => LocationKind::StructureOrItem,
            _ => LocationKind::Other,
        }
    }
}

/// Original vs copy, decided once when a blueprint record is ingested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlueprintKind {
    Copy,
    Original { quantity: u32 },
}

impl BlueprintKind {
    /// Decodes the upstream quantity sentinel: `-2` copy, `-1` researched original,
    /// `>0` a stack of unresearched originals. Anything else is malformed.
    pub fn from_quantity(quantity: i32) -> Option<Self> {
        match quantity {
            -2 => Some(BlueprintKind::Copy),
            -1 => Some(BlueprintKind::Original { quantity: 1 }),
            n if n > 0 => Some(BlueprintKind::Original { quantity: n as u32 }),
            _ => None,
        }
    }

    pub fn is_copy(&self) -> bool {
        matches!(self, BlueprintKind::Copy)
    }

    /// How much this record contributes to its stack.
    pub fn count(&self) -> u32 {
        match self {
            BlueprintKind::Copy => 1,
            BlueprintKind::Original { quantity } => *quantity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlueprintDetails {
    pub kind: BlueprintKind,
    /// Runs left on a copy, -1 for originals
    pub runs: i32,
    pub material_efficiency: i32,
    pub time_efficiency: i32,
}

/// A single corporation owned asset or blueprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub item_id: ItemId,
    pub type_id: TypeId,
    pub location_id: LocationId,
    pub location_flag: LocationFlag,
    pub location_type: LocationType,
    pub quantity: i32,
    /// Only present for records coming from the blueprint listing
    pub blueprint: Option<BlueprintDetails>,
}

/// Blueprints of one type sharing efficiency levels and run count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueprintStack {
    pub type_id: TypeId,
    pub material_efficiency: i32,
    pub time_efficiency: i32,
    pub runs: i32,
    pub quantity: u32,
}

impl BlueprintStack {
    pub fn same_quality(&self, bp: &BlueprintDetails) -> bool {
        self.material_efficiency == bp.material_efficiency
            && self.time_efficiency == bp.time_efficiency
            && self.runs == bp.runs
    }
}

/// Name and whereabouts of a station or player structure, normalized into one shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureInfo {
    pub name: String,
    pub owner_id: Option<i32>,
    pub solar_system_id: i32,
    pub type_id: Option<TypeId>,
}

/// The admin character whose refresh token drives the inventory refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity {
    pub character_id: CharacterId,
    pub corporation_id: CorporationId,
    pub scopes: Vec<String>,
}

pub const REQUIRED_SCOPES: &[&str] = &[
    "esi-assets.read_corporation_assets.v1",
    "esi-corporations.read_blueprints.v1",
    "esi-corporations.read_divisions.v1",
    "esi-universe.read_structures.v1",
];

impl AdminIdentity {
    pub fn new(character_id: CharacterId, corporation_id: CorporationId) -> Self {
        Self {
            character_id,
            corporation_id,
            scopes: REQUIRED_SCOPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}
