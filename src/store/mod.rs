use async_trait::async_trait;

use crate::models::{Event, SeatCategory};

pub mod memory;
pub mod pg;

pub use memory::MemoryCatalogStore;
pub use pg::PgCatalogStore;

/// Catalog store failures, split by whether a retry can help.
///
/// The read gateway retries `Transient` failures only; `Permanent` failures
/// (bad queries, constraint violations) fail fast.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("transient store failure: {0}")]
    Transient(String),
    #[error("store failure: {0}")]
    Permanent(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }

    pub fn from_sqlx(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Transient(err.to_string()),
            other => StoreError::Permanent(other.to_string()),
        }
    }
}

/// Point lookups, paginated scans and upserts/deletes over the two catalog
/// collections. Absence on reads is modelled as `None`/empty, never an error.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_event(&self, id: &str) -> Result<Option<Event>, StoreError>;

    /// Returns one page of events in stable `(start_time, id)` order plus the
    /// total event count.
    async fn list_events(&self, offset: i64, limit: i64) -> Result<(Vec<Event>, i64), StoreError>;

    async fn upsert_event(&self, event: &Event) -> Result<Event, StoreError>;

    async fn delete_event(&self, id: &str) -> Result<(), StoreError>;

    async fn categories_by_event(&self, event_id: &str) -> Result<Vec<SeatCategory>, StoreError>;

    async fn upsert_categories(&self, categories: &[SeatCategory]) -> Result<(), StoreError>;

    async fn delete_categories(&self, categories: &[SeatCategory]) -> Result<(), StoreError>;
}
