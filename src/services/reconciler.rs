//! Replace-all reconciliation of an event's seat-category set.
//!
//! Deletes every previously stored category, then inserts every requested
//! one. Requested categories keep a caller-supplied identifier or get a
//! fresh UUID. Write failures propagate unmodified; writes are never
//! auto-retried.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::models::{SeatCategory, SeatCategoryRequest};
use crate::store::{CatalogStore, StoreError};

/// Build the replacement category rows for an event. Pure; no store access.
pub fn plan_replacement(event_id: &str, requested: &[SeatCategoryRequest]) -> Vec<SeatCategory> {
    requested
        .iter()
        .map(|req| SeatCategory {
            event_id: event_id.to_string(),
            id: req
                .id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: req.name.clone(),
            price: req.price,
            available_count: req.available_count,
        })
        .collect()
}

#[derive(Clone)]
pub struct SeatCategoryReconciler {
    store: Arc<dyn CatalogStore>,
}

impl SeatCategoryReconciler {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Replace `previous` with `requested` for the given event. Must only be
    /// called after the event itself has been durably upserted. An empty
    /// `requested` deletes everything and inserts nothing; callers reject
    /// that earlier when at least one category is mandatory.
    pub async fn reconcile(
        &self,
        event_id: &str,
        previous: Vec<SeatCategory>,
        requested: &[SeatCategoryRequest],
    ) -> Result<Vec<SeatCategory>, StoreError> {
        if !previous.is_empty() {
            debug!(
                event_id,
                count = previous.len(),
                "deleting existing seat categories"
            );
            self.store.delete_categories(&previous).await?;
        }

        let replacement = plan_replacement(event_id, requested);
        if !replacement.is_empty() {
            debug!(
                event_id,
                count = replacement.len(),
                "inserting requested seat categories"
            );
            self.store.upsert_categories(&replacement).await?;
        }

        Ok(replacement)
    }
}
