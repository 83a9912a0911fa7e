//! Append-only audit trail attached to each disaster aggregate.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Kind of state-changing action recorded in the trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// The aggregate was created.
    Create,
    /// One or more fields were changed.
    Update,
    /// The aggregate was removed. Always the last entry.
    Delete,
}

/// Immutable record of one action taken on a disaster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AuditEntry {
    /// What happened.
    pub action: AuditAction,
    /// Who did it.
    pub user_id: String,
    /// When it happened.
    pub timestamp: DateTime<Utc>,
    /// Action-specific details (field names, extraction flags, ...).
    #[schema(value_type = Object)]
    pub details: BTreeMap<String, serde_json::Value>,
}

impl AuditEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn new(
        action: AuditAction,
        user_id: impl Into<String>,
        details: BTreeMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            action,
            user_id: user_id.into(),
            timestamp: Utc::now(),
            details,
        }
    }

    /// Returns a detail value by key.
    #[must_use]
    pub fn detail(&self, key: &str) -> Option<&serde_json::Value> {
        self.details.get(key)
    }
}

/// Ordered, append-only sequence of [`AuditEntry`] values.
///
/// There is no way to remove or edit an entry once appended; entries keep
/// the order in which they were appended.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct AuditTrail(Vec<AuditEntry>);

impl AuditTrail {
    /// Creates an empty trail.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends an entry at the end of the trail.
    pub fn append(&mut self, entry: AuditEntry) {
        self.0.push(entry);
    }

    /// Returns all entries in occurrence order.
    #[must_use]
    pub fn entries(&self) -> &[AuditEntry] {
        &self.0
    }

    /// Returns the first entry, normally the `create` record.
    #[must_use]
    pub fn first(&self) -> Option<&AuditEntry> {
        self.0.first()
    }

    /// Returns the most recent entry.
    #[must_use]
    pub fn last(&self) -> Option<&AuditEntry> {
        self.0.last()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if the trail ends with a `delete` entry.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.last().is_some_and(|e| e.action == AuditAction::Delete)
    }
}

impl From<Vec<AuditEntry>> for AuditTrail {
    fn from(entries: Vec<AuditEntry>) -> Self {
        Self(entries)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn entry(action: AuditAction) -> AuditEntry {
        AuditEntry::new(action, "citizen1", BTreeMap::new())
    }

    #[test]
    fn append_preserves_order() {
        let mut trail = AuditTrail::new();
        trail.append(entry(AuditAction::Create));
        trail.append(entry(AuditAction::Update));
        trail.append(entry(AuditAction::Update));

        let actions: Vec<AuditAction> = trail.entries().iter().map(|e| e.action).collect();
        assert_eq!(
            actions,
            vec![AuditAction::Create, AuditAction::Update, AuditAction::Update]
        );
        assert!(!trail.is_terminated());
    }

    #[test]
    fn delete_terminates_trail() {
        let mut trail = AuditTrail::new();
        trail.append(entry(AuditAction::Create));
        trail.append(entry(AuditAction::Delete));
        assert!(trail.is_terminated());
        assert_eq!(trail.len(), 2);
    }

    #[test]
    fn serializes_as_plain_array() {
        let mut trail = AuditTrail::new();
        trail.append(entry(AuditAction::Create));
        let json = serde_json::to_value(&trail).unwrap_or_default();
        let Some(items) = json.as_array() else {
            panic!("trail should serialize as an array");
        };
        assert_eq!(items.len(), 1);
        assert_eq!(
            items.first().and_then(|e| e.get("action")),
            Some(&serde_json::json!("create"))
        );
    }
}
