//! Type-safe disaster identifier.
//!
//! [`DisasterId`] wraps a [`uuid::Uuid`] (v4) so disaster identifiers cannot
//! be confused with subscriber or other UUIDs. It keys the aggregate store,
//! hub rooms and monitoring sessions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Opaque, globally unique identifier of a disaster aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct DisasterId(uuid::Uuid);

impl DisasterId {
    /// Creates a new random `DisasterId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Creates a `DisasterId` from an existing [`uuid::Uuid`].
    #[must_use]
    pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner [`uuid::Uuid`].
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for DisasterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DisasterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DisasterId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<uuid::Uuid>().map(Self)
    }
}

impl From<uuid::Uuid> for DisasterId {
    fn from(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }
}

impl From<DisasterId> for uuid::Uuid {
    fn from(id: DisasterId) -> Self {
        id.0
    }
}
