//! Access to the managed backend.
//!
//! Everything the service reads or writes goes through the [`Store`] trait.
//! Three backends implement it:
//!
//! - [`RestStore`]: the backend's PostgREST API over HTTPS
//! - [`PgStore`]: a direct Postgres connection pool
//! - [`MemoryStore`]: in-process tables for local development and tests

pub mod memory;
pub mod pool;
pub mod postgres;
pub mod rest;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::StoreBackend;
use crate::constants::UNIQUE_VIOLATION_CODE;
use crate::models::{DeliveryPatch, DeliveryRecord, NewDeliveryRecord, NewUserProfile, UserProfile};

pub use memory::MemoryStore;
pub use pool::create_pool;
pub use postgres::PgStore;
pub use rest::RestStore;

/// Store handle type (Arc-wrapped for sharing across handlers)
pub type Db = Arc<dyn Store>;

/// Errors raised by a store backend
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP request to the REST backend failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Postgres driver error.
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// REST backend returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// Unique constraint violated.
    #[error("Duplicate key: {0}")]
    Duplicate(String),

    /// No row matched.
    #[error("Record not found")]
    NotFound,

    /// Response could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl StoreError {
    /// True for unique-key violations from any backend
    pub fn is_duplicate(&self) -> bool {
        match self {
            StoreError::Duplicate(_) => true,
            StoreError::Api { code, .. } => code.as_deref() == Some(UNIQUE_VIOLATION_CODE),
            _ => false,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db_err)
                if db_err.code().as_deref() == Some(UNIQUE_VIOLATION_CODE) =>
            {
                StoreError::Duplicate(db_err.message().to_string())
            }
            _ => StoreError::Database(err),
        }
    }
}

/// Operations the service needs from the managed backend
#[async_trait]
pub trait Store: Send + Sync {
    /// Short backend name for logs and health output
    fn backend(&self) -> &'static str;

    /// Cheap connectivity check
    async fn ping(&self) -> Result<(), StoreError>;

    /// Profile by auth subject id; `None` when no row exists yet
    async fn find_profile(&self, id: &str) -> Result<Option<UserProfile>, StoreError>;

    /// Insert a profile row and return it as stored
    async fn insert_profile(&self, profile: NewUserProfile) -> Result<UserProfile, StoreError>;

    /// Insert delivery rows in one request, returning them as stored
    async fn insert_deliveries(
        &self,
        records: Vec<NewDeliveryRecord>,
    ) -> Result<Vec<DeliveryRecord>, StoreError>;

    /// All deliveries of an owner, newest first
    async fn list_deliveries(&self, owner_id: &str) -> Result<Vec<DeliveryRecord>, StoreError>;

    /// Apply a patch to one delivery and return the updated row
    async fn update_delivery(
        &self,
        id: &str,
        patch: DeliveryPatch,
    ) -> Result<DeliveryRecord, StoreError>;

    async fn delete_delivery(&self, id: &str) -> Result<(), StoreError>;
}

/// Build the store selected by configuration
pub async fn open_store(backend: &StoreBackend) -> Result<Db, StoreError> {
    let db: Db = match backend {
        StoreBackend::Rest {
            url,
            api_key,
            timeout,
        } => Arc::new(RestStore::new(url, api_key, *timeout)?),
        StoreBackend::Postgres {
            database_url,
            max_connections,
        } => {
            let pool = create_pool(database_url, *max_connections).await?;
            Arc::new(PgStore::new(pool))
        }
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
    };

    tracing::info!("Using {} store backend", db.backend());

    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_duplicate() {
        assert!(StoreError::Duplicate("users_pkey".to_string()).is_duplicate());
        assert!(StoreError::Api {
            status: 409,
            code: Some("23505".to_string()),
            message: "duplicate key value violates unique constraint".to_string(),
        }
        .is_duplicate());
        assert!(!StoreError::Api {
            status: 400,
            code: Some("22P02".to_string()),
            message: "invalid input syntax".to_string(),
        }
        .is_duplicate());
        assert!(!StoreError::NotFound.is_duplicate());
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert!(matches!(
            StoreError::from(sqlx::Error::RowNotFound),
            StoreError::NotFound
        ));
    }
}
