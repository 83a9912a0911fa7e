//! In-process storage backend.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{DisasterStorage, StorageError, apply_filter};
use crate::domain::{Disaster, DisasterFilter, DisasterId, DisasterListing};

/// `HashMap`-backed [`DisasterStorage`]. State is lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    rows: RwLock<HashMap<DisasterId, Disaster>>,
}

impl InMemoryStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Returns `true` if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl DisasterStorage for InMemoryStorage {
    async fn select(&self, filter: &DisasterFilter) -> Result<Vec<DisasterListing>, StorageError> {
        let rows: Vec<Disaster> = self.rows.read().await.values().cloned().collect();
        Ok(apply_filter(rows, filter))
    }

    async fn get(&self, id: DisasterId) -> Result<Option<Disaster>, StorageError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn insert(&self, disaster: &Disaster) -> Result<Disaster, StorageError> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(&disaster.id) {
            return Err(StorageError::Conflict(disaster.id));
        }
        rows.insert(disaster.id, disaster.clone());
        Ok(disaster.clone())
    }

    async fn update(&self, disaster: &Disaster) -> Result<Disaster, StorageError> {
        let mut rows = self.rows.write().await;
        let slot = rows
            .get_mut(&disaster.id)
            .ok_or(StorageError::Missing(disaster.id))?;
        *slot = disaster.clone();
        Ok(disaster.clone())
    }

    async fn delete(&self, id: DisasterId) -> Result<bool, StorageError> {
        Ok(self.rows.write().await.remove(&id).is_some())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::AuditTrail;
    use chrono::Utc;
    use std::collections::BTreeSet;

    fn disaster() -> Disaster {
        Disaster {
            id: DisasterId::new(),
            title: "Flood".to_string(),
            description: "Water rising".to_string(),
            location_name: None,
            resolved_coordinates: None,
            tags: BTreeSet::new(),
            owner_id: "citizen1".to_string(),
            created_at: Utc::now(),
            updated_at: None,
            audit_trail: AuditTrail::new(),
        }
    }

    #[tokio::test]
    async fn insert_then_get() {
        let store = InMemoryStorage::new();
        let d = disaster();
        assert!(store.insert(&d).await.is_ok());
        let Ok(Some(found)) = store.get(d.id).await else {
            panic!("record should be stored");
        };
        assert_eq!(found, d);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn duplicate_insert_conflicts() {
        let store = InMemoryStorage::new();
        let d = disaster();
        let _ = store.insert(&d).await;
        assert_eq!(store.insert(&d).await, Err(StorageError::Conflict(d.id)));
    }

    #[tokio::test]
    async fn update_missing_record_fails() {
        let store = InMemoryStorage::new();
        let d = disaster();
        assert_eq!(store.update(&d).await, Err(StorageError::Missing(d.id)));
    }

    #[tokio::test]
    async fn delete_reports_presence() {
        let store = InMemoryStorage::new();
        let d = disaster();
        let _ = store.insert(&d).await;
        assert_eq!(store.delete(d.id).await, Ok(true));
        assert_eq!(store.delete(d.id).await, Ok(false));
        assert!(store.is_empty().await);
    }
}
