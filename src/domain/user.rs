//! Acting users and their roles.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Role granted to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// May mutate any disaster.
    Admin,
    /// May create disasters and mutate the ones they own.
    Contributor,
}

/// A resolved caller identity. Immutable for the lifetime of a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// Stable user identifier, compared against `Disaster::owner_id`.
    pub id: String,
    /// Role of the user.
    pub role: Role,
}

impl User {
    /// Creates a user with the given id and role.
    #[must_use]
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    /// Returns `true` if the user has the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Ownership rule: the owner or any admin may mutate an aggregate.
    #[must_use]
    pub fn can_modify(&self, owner_id: &str) -> bool {
        self.is_admin() || self.id == owner_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_may_modify() {
        let user = User::new("citizen1", Role::Contributor);
        assert!(user.can_modify("citizen1"));
    }

    #[test]
    fn non_owner_contributor_may_not_modify() {
        let user = User::new("firefighter_jane", Role::Contributor);
        assert!(!user.can_modify("citizen1"));
    }

    #[test]
    fn admin_bypasses_ownership() {
        let user = User::new("reliefAdmin", Role::Admin);
        assert!(user.can_modify("citizen1"));
    }
}
