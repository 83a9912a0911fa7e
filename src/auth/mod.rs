//! Identity resolution.
//!
//! Authentication proper is a transport concern; the core only needs a
//! mapping from a caller-supplied token to a [`User`]. [`StaticIdentities`]
//! is the fixed table used by the service.

use std::collections::HashMap;
use std::fmt::Debug;

use crate::domain::{Role, User};
use crate::error::HubError;

/// Resolves a caller token to a [`User`].
pub trait IdentityResolver: Debug + Send + Sync {
    /// Returns the user bound to `token`.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Unauthorized`] if the token is unknown.
    fn resolve(&self, token: &str) -> Result<User, HubError>;
}

/// Fixed, in-process identity table.
#[derive(Debug, Clone)]
pub struct StaticIdentities {
    users: HashMap<String, User>,
}

impl StaticIdentities {
    /// Builds a table from the given users, keyed by user id.
    #[must_use]
    pub fn new(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: users.into_iter().map(|u| (u.id.clone(), u)).collect(),
        }
    }

    /// The built-in coordination team.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new([
            User::new("netrunnerX", Role::Admin),
            User::new("reliefAdmin", Role::Admin),
            User::new("citizen1", Role::Contributor),
            User::new("firefighter_jane", Role::Contributor),
        ])
    }
}

impl Default for StaticIdentities {
    fn default() -> Self {
        Self::builtin()
    }
}

impl IdentityResolver for StaticIdentities {
    fn resolve(&self, token: &str) -> Result<User, HubError> {
        self.users
            .get(token.trim())
            .cloned()
            .ok_or_else(|| HubError::Unauthorized(format!("unknown user token `{token}`")))
    }
}
