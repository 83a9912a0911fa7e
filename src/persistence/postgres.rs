//! PostgreSQL implementation of the storage contract.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::models::DisasterRow;
use super::{DisasterStorage, StorageError, apply_filter};
use crate::domain::{Disaster, DisasterFilter, DisasterId, DisasterListing};

const COLUMNS: &str = "id, title, description, location_name, latitude, longitude, tags, \
                       owner_id, created_at, updated_at, audit_trail";

/// PostgreSQL-backed [`DisasterStorage`] using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Creates a storage backend over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to `database_url` and runs the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Backend`] if the connection or a migration
    /// fails.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        connect_timeout: Duration,
    ) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(connect_timeout)
            .connect(database_url)
            .await
            .map_err(backend)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StorageError::Backend(format!("migration failed: {e}")))?;

        tracing::info!(max_connections, "connected to postgres");
        Ok(Self::new(pool))
    }
}

fn backend(e: sqlx::Error) -> StorageError {
    StorageError::Backend(e.to_string())
}

#[async_trait]
impl DisasterStorage for PostgresStorage {
    async fn select(&self, filter: &DisasterFilter) -> Result<Vec<DisasterListing>, StorageError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM disasters \
             WHERE ($1::text IS NULL OR $1 = ANY(tags)) \
             ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, DisasterRow>(&sql)
            .bind(filter.tag.as_deref())
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;

        let disasters = rows
            .into_iter()
            .map(Disaster::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(apply_filter(disasters, filter))
    }

    async fn get(&self, id: DisasterId) -> Result<Option<Disaster>, StorageError> {
        let sql = format!("SELECT {COLUMNS} FROM disasters WHERE id = $1");
        let row = sqlx::query_as::<_, DisasterRow>(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.map(Disaster::try_from).transpose()
    }

    async fn insert(&self, disaster: &Disaster) -> Result<Disaster, StorageError> {
        let row = DisasterRow::from(disaster);
        let sql = format!(
            "INSERT INTO disasters ({COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {COLUMNS}"
        );
        let stored = sqlx::query_as::<_, DisasterRow>(&sql)
            .bind(row.id)
            .bind(row.title)
            .bind(row.description)
            .bind(row.location_name)
            .bind(row.latitude)
            .bind(row.longitude)
            .bind(row.tags)
            .bind(row.owner_id)
            .bind(row.created_at)
            .bind(row.updated_at)
            .bind(row.audit_trail)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                let duplicate = e
                    .as_database_error()
                    .is_some_and(|db| db.is_unique_violation());
                if duplicate {
                    StorageError::Conflict(disaster.id)
                } else {
                    backend(e)
                }
            })?;
        Disaster::try_from(stored)
    }

    async fn update(&self, disaster: &Disaster) -> Result<Disaster, StorageError> {
        let row = DisasterRow::from(disaster);
        let sql = format!(
            "UPDATE disasters SET title = $2, description = $3, location_name = $4, \
             latitude = $5, longitude = $6, tags = $7, updated_at = $8, audit_trail = $9 \
             WHERE id = $1 RETURNING {COLUMNS}"
        );
        let stored = sqlx::query_as::<_, DisasterRow>(&sql)
            .bind(row.id)
            .bind(row.title)
            .bind(row.description)
            .bind(row.location_name)
            .bind(row.latitude)
            .bind(row.longitude)
            .bind(row.tags)
            .bind(row.updated_at)
            .bind(row.audit_trail)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        stored
            .ok_or(StorageError::Missing(disaster.id))
            .and_then(Disaster::try_from)
    }

    async fn delete(&self, id: DisasterId) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM disasters WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected() > 0)
    }
}
