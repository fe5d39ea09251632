//! Contact persistence.
//!
//! Saved contacts go through the [`ContactStore`] trait: SQLite via sqlx in
//! production, [`NullContactStore`] when the database is unreachable at
//! startup. Writes are direct pool queries; contact batches are
//! low-frequency (one per archive call).

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::trace;

/// A saved contact, created once at archive time and immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRecord {
    /// Phone number (JID user part).
    pub number: String,
    /// Display name at archive time.
    pub name: String,
    /// Name of the group the contact was archived from.
    pub group: String,
    /// Timestamp of the archive call.
    pub saved_at: DateTime<Utc>,
}

/// Errors from the contact store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Bulk persistence for contact batches.
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Persist a batch of contact records in one call.
    async fn insert_many(&self, records: &[ContactRecord]) -> Result<(), StoreError>;
}

/// SQLite-backed contact store.
pub struct SqliteContactStore {
    db: SqlitePool,
}

impl SqliteContactStore {
    /// Open (creating if missing) the database at `database_url` and apply
    /// the contacts schema.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the URL is invalid, the pool
    /// cannot connect, or the schema cannot be applied.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let opts = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let db = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await?;
        sqlx::raw_sql(include_str!("../migrations/001_contacts.sql"))
            .execute(&db)
            .await?;
        Ok(Self { db })
    }

    /// The underlying connection pool, for inspection in tests and tooling.
    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }
}

#[async_trait]
impl ContactStore for SqliteContactStore {
    async fn insert_many(&self, records: &[ContactRecord]) -> Result<(), StoreError> {
        let mut tx = self.db.begin().await?;
        for record in records {
            sqlx::query(
                "INSERT INTO contacts (number, name, group_name, saved_at) \
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(&record.number)
            .bind(&record.name)
            .bind(&record.group)
            .bind(record.saved_at.to_rfc3339())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        trace!(count = records.len(), "contact batch persisted");
        Ok(())
    }
}

/// No-op store used when the database is unavailable. Batches are dropped;
/// archive calls still succeed with their in-memory records.
pub struct NullContactStore;

#[async_trait]
impl ContactStore for NullContactStore {
    async fn insert_many(&self, records: &[ContactRecord]) -> Result<(), StoreError> {
        trace!(count = records.len(), "contact store disabled, dropping batch");
        Ok(())
    }
}
