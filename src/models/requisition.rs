use crate::db::DbResult;
use crate::db::error::DbError;
use crate::models::types::{CharacterId, RequisitionId, TypeId};
use chrono::{DateTime, Utc};
use postgres_types::private::BytesMut;
use postgres_types::{FromSql, IsNull, ToSql, Type};
use serde::{Deserialize, Serialize};
use std::error::Error;
use tokio_postgres::Row;

/// One line of a requisition: which blueprint copy is wanted and in what quality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedBlueprint {
    pub type_id: TypeId,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub runs: i16,
    #[serde(default, rename = "me")]
    pub material_efficiency: i8,
    #[serde(default, rename = "te")]
    pub time_efficiency: i8,
    /// Requester accepts any quality
    #[serde(default)]
    pub any: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequisitionStatus {
    Open,
    Canceled,
    Completed,
    Rejected,
}

impl RequisitionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequisitionStatus::Open => "open",
            RequisitionStatus::Canceled => "canceled",
            RequisitionStatus::Completed => "completed",
            RequisitionStatus::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for RequisitionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "open" => Ok(RequisitionStatus::Open),
            "canceled" | "cancelled" => Ok(RequisitionStatus::Canceled),
            "completed" => Ok(RequisitionStatus::Completed),
            "rejected" => Ok(RequisitionStatus::Rejected),
            other => Err(format!("unknown requisition status: {other}")),
        }
    }
}

impl ToSql for RequisitionStatus {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        self.as_str().to_sql(ty, out)
    }

    fn accepts(ty: &Type) -> bool {
        ty == &Type::TEXT
    }

    fn to_sql_checked(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        self.to_sql(ty, out)
    }
}

impl FromSql<'_> for RequisitionStatus {
    fn from_sql(ty: &Type, raw: &[u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        let s = String::from_sql(ty, raw)?;
        Ok(s.parse::<RequisitionStatus>()?)
    }

    fn accepts(ty: &Type) -> bool {
        ty == &Type::TEXT
    }
}

impl std::fmt::Display for RequisitionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who is working on a requisition right now. Locks are held in memory only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequisitionLock {
    pub character_id: CharacterId,
    pub character_name: String,
    pub locked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequisitionOrder {
    pub id: RequisitionId,
    /// Character who filed the order
    pub character_id: CharacterId,
    pub character_name: String,
    pub status: RequisitionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub blueprints: Vec<RequestedBlueprint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock: Option<RequisitionLock>,
}

impl RequisitionOrder {
    pub fn try_from_row(row: &Row) -> DbResult<Self> {
        let blueprints: serde_json::Value = row.try_get("blueprints")?;
        let blueprints: Vec<RequestedBlueprint> =
            serde_json::from_value(blueprints).map_err(|e| DbError::Decode(format!("blueprints: {e}")))?;

        Ok(Self {
            id: row.try_get("id")?,
            character_id: row.try_get("character_id")?,
            character_name: row.try_get("character_name")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            blueprints,
            updated_by: row.try_get("updated_by")?,
            public_notes: row.try_get("public_notes")?,
            lock: None,
        })
    }

    pub fn is_open(&self) -> bool {
        self.status == RequisitionStatus::Open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requested_blueprint_uses_short_efficiency_keys() {
        let bp: RequestedBlueprint =
            serde_json::from_str(r#"{"type_id": 1001, "runs": 10, "me": 10, "te": 20}"#).unwrap();
        assert_eq!(bp.type_id, TypeId(1001));
        assert_eq!(bp.material_efficiency, 10);
        assert_eq!(bp.time_efficiency, 20);
        assert!(!bp.any);
        assert!(bp.name.is_empty());
    }

    #[test]
    fn status_parses_both_spellings_of_canceled() {
        assert_eq!("cancelled".parse::<RequisitionStatus>(), Ok(RequisitionStatus::Canceled));
        assert_eq!("canceled".parse::<RequisitionStatus>(), Ok(RequisitionStatus::Canceled));
        assert!("closed".parse::<RequisitionStatus>().is_err());
    }
}
