use serde::{Deserialize, Serialize};

/// Numeric identifiers handed out by the game API. They are plain integers on the wire
/// and in the database, but we never want to mix up a type id with an item id.
#[macro_export]
macro_rules! define_numeric_id {
    ($name:ident, $inner:ty) => {
        #[derive(
            Copy,
            Clone,
            Debug,
            Default,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            postgres_types::ToSql,
            postgres_types::FromSql,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[repr(transparent)]
        #[postgres(transparent)]
        #[serde(transparent)] // JSON = plain number
        pub struct $name(pub $inner);

        impl $name {
            #[inline]
            pub const fn new(v: $inner) -> Self {
                Self(v)
            }
            #[inline]
            pub const fn get(self) -> $inner {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl core::str::FromStr for $name {
            type Err = core::num::ParseIntError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<$inner>().map(Self)
            }
        }

        impl From<$inner> for $name {
            fn from(v: $inner) -> Self {
                Self(v)
            }
        }
        impl From<$name> for $inner {
            fn from(v: $name) -> $inner {
                v.0
            }
        }
    };
}

define_numeric_id!(CharacterId, i32);
define_numeric_id!(CorporationId, i32);
define_numeric_id!(AllianceId, i32);
define_numeric_id!(TypeId, i32);
define_numeric_id!(ItemId, i64);
define_numeric_id!(LocationId, i64);
define_numeric_id!(RequisitionId, i64);

/// Every owned item can itself act as a location for other items.
impl From<ItemId> for LocationId {
    fn from(v: ItemId) -> Self {
        Self(v.0)
    }
}

impl LocationId {
    /// Interprets this location as an item id (valid when the location is an owned container).
    pub const fn as_item(self) -> ItemId {
        ItemId(self.0)
    }
}

/// Session tokens are opaque uuids handed to the browser after login.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    postgres_types::ToSql,
    postgres_types::FromSql,
    Serialize,
    Deserialize,
)]
#[repr(transparent)]
#[postgres(transparent)]
#[serde(transparent)]
pub struct SessionToken(pub uuid::Uuid);

impl SessionToken {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SessionToken {
    fn default() -> Self {
        Self::new()
    }
}

impl core::str::FromStr for SessionToken {
    type Err = uuid::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s.trim()).map(Self)
    }
}
