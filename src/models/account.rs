use crate::db::DbResult;
use crate::models::types::CharacterId;
use postgres_types::private::BytesMut;
use postgres_types::{FromSql, IsNull, ToSql, Type};
use serde::{Deserialize, Serialize};
use std::error::Error;
use tokio_postgres::Row;

/// Access levels, ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthLevel {
    Unauthorized, // Not logged in, or not whitelisted
    Authorized,   // Can browse blueprints and file requisitions
    Worker,       // Can lock and fulfil requisitions
    Admin,        // Can do everything
}

impl AuthLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthLevel::Unauthorized => "unauthorized",
            AuthLevel::Authorized => "authorized",
            AuthLevel::Worker => "worker",
            AuthLevel::Admin => "admin",
        }
    }
}

impl ToSql for AuthLevel {
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

impl FromSql<'_> for AuthLevel {
    fn from_sql(ty: &Type, raw: &[u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        let s = String::from_sql(ty, raw)?;
        match s.as_str() {
            "unauthorized" => Ok(AuthLevel::Unauthorized),
            "authorized" => Ok(AuthLevel::Authorized),
            "worker" => Ok(AuthLevel::Worker),
            "admin" => Ok(AuthLevel::Admin),
            _ => Err(format!("Unknown auth level: {}", s).into()),
        }
    }

    fn accepts(ty: &Type) -> bool {
        ty == &Type::TEXT
    }
}

impl std::fmt::Display for AuthLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The logged in character behind a session.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub character_id: CharacterId,
    pub character_name: String,
    pub level: AuthLevel,
}

impl User {
    pub fn try_from_row(row: &Row) -> DbResult<Self> {
        Ok(Self {
            character_id: row.try_get("character_id")?,
            character_name: row.try_get("character_name")?,
            level: row.try_get("auth_level")?,
        })
    }

    pub fn has_level(&self, level: AuthLevel) -> bool {
        self.level >= level
    }
}
