use crate::models::inventory::AdminIdentity;
use crate::models::types::{AllianceId, CharacterId, CorporationId};
use serde::{Deserialize, Serialize};

/// Operator editable settings, persisted as a single JSON document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub alliance_whitelist: Vec<AllianceId>,
    pub corporation_whitelist: Vec<CorporationId>,
    pub admin_corp: CorporationId,
    pub admin_character: CharacterId,
    pub max_contracts: i32,
}

impl AppConfig {
    /// Identity used for the inventory refresh, if one has been configured.
    pub fn admin_identity(&self) -> Option<AdminIdentity> {
        if self.admin_character.get() <= 0 || self.admin_corp.get() <= 0 {
            return None;
        }
        Some(AdminIdentity::new(self.admin_character, self.admin_corp))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_contracts < 0 {
            return Err("max_contracts cannot be negative".into());
        }
        if self.admin_identity().is_none() {
            return Err("admin_character and admin_corp must be set".into());
        }
        Ok(())
    }
}
