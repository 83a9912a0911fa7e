//! Persistence layer: the narrow storage contract for disaster records.
//!
//! The aggregate service depends only on [`DisasterStorage`]. Two backends
//! implement it: [`InMemoryStorage`] (default, tests) and
//! [`PostgresStorage`] (`sqlx::PgPool`, selected when `DATABASE_URL` is
//! configured).

pub mod memory;
pub mod models;
pub mod postgres;

use std::cmp::Ordering;
use std::fmt::Debug;

use async_trait::async_trait;

pub use memory::InMemoryStorage;
pub use postgres::PostgresStorage;

use crate::domain::{Disaster, DisasterFilter, DisasterId, DisasterListing};

/// Failure reported by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// The backend could not complete the request.
    #[error("backend failure: {0}")]
    Backend(String),
    /// A record with the same id already exists.
    #[error("record {0} already exists")]
    Conflict(DisasterId),
    /// The record to update does not exist.
    #[error("record {0} does not exist")]
    Missing(DisasterId),
    /// A stored row could not be decoded.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Row store for disasters: `select`, `get`, `insert`, `update`, `delete`.
#[async_trait]
pub trait DisasterStorage: Debug + Send + Sync {
    /// Returns the records matching `filter`, ordered by ascending
    /// distance when `filter.near` is set (ties: newest first), otherwise
    /// newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] on backend failure.
    async fn select(&self, filter: &DisasterFilter) -> Result<Vec<DisasterListing>, StorageError>;

    /// Returns one record.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] on backend failure.
    async fn get(&self, id: DisasterId) -> Result<Option<Disaster>, StorageError>;

    /// Inserts a new record and returns it as stored.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Conflict`] if the id is taken, or another
    /// [`StorageError`] on backend failure.
    async fn insert(&self, disaster: &Disaster) -> Result<Disaster, StorageError>;

    /// Replaces an existing record and returns it as stored.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Missing`] if there is no such record, or
    /// another [`StorageError`] on backend failure.
    async fn update(&self, disaster: &Disaster) -> Result<Disaster, StorageError>;

    /// Removes a record. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] on backend failure.
    async fn delete(&self, id: DisasterId) -> Result<bool, StorageError>;
}

/// Applies `filter` to `rows` and orders the result.
///
/// Shared by backends that cannot push proximity filtering down to the
/// database. Records without coordinates never match a proximity filter.
#[must_use]
pub fn apply_filter<I>(rows: I, filter: &DisasterFilter) -> Vec<DisasterListing>
where
    I: IntoIterator<Item = Disaster>,
{
    let mut listings: Vec<DisasterListing> = rows
        .into_iter()
        .filter(|d| filter.tag.as_deref().is_none_or(|tag| d.has_tag(tag)))
        .filter_map(|disaster| match filter.near {
            None => Some(DisasterListing {
                disaster,
                distance_km: None,
            }),
            Some(near) => {
                let distance = disaster.resolved_coordinates?.distance_to(&near.center);
                (distance <= near.radius_km).then_some(DisasterListing {
                    disaster,
                    distance_km: Some(distance),
                })
            }
        })
        .collect();

    listings.sort_by(|a, b| {
        let by_distance = match (a.distance_km, b.distance_km) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => Ordering::Equal,
        };
        by_distance.then_with(|| b.disaster.created_at.cmp(&a.disaster.created_at))
    });
    listings
}
