//! Resilient read gateway over the catalog store.
//!
//! Every read goes through retry (transient failures only) and a
//! per-operation circuit breaker. When the policy is exhausted the gateway
//! degrades instead of erroring: listings fall back to an empty page,
//! lookups to absence. Store errors never reach read-path callers.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{error, warn};

use crate::config::ResilienceConfig;
use crate::models::{Event, SeatCategory};
use crate::resilience::{BreakerRegistry, RetryPolicy};
use crate::store::{CatalogStore, StoreError};

/// One page of events plus the total count.
#[derive(Debug, Clone, Serialize)]
pub struct EventPage {
    pub items: Vec<Event>,
    pub total: i64,
    pub page: u32,
    #[serde(rename = "pageSize")]
    pub page_size: u32,
}

impl EventPage {
    pub fn empty(page: u32, page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page,
            page_size,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum ReadError {
    #[error("circuit breaker is open")]
    CircuitOpen,
    #[error(transparent)]
    Store(StoreError),
}

#[derive(Clone)]
pub struct ReadGateway {
    store: Arc<dyn CatalogStore>,
    breakers: Arc<BreakerRegistry>,
    retry: RetryPolicy,
    attempt_timeout: Duration,
}

impl ReadGateway {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        breakers: Arc<BreakerRegistry>,
        config: &ResilienceConfig,
    ) -> Self {
        Self {
            store,
            breakers,
            retry: RetryPolicy::from_config(config),
            attempt_timeout: Duration::from_millis(config.read_timeout_ms),
        }
    }

    /// Paginated listing in stable store order. Degrades to an empty page,
    /// never an error.
    pub async fn list_events(&self, page: u32, page_size: u32) -> EventPage {
        let page = page.max(1);
        let offset = ((page - 1) as i64) * page_size as i64;
        let limit = page_size as i64;

        match self
            .guarded("list_events", || self.store.list_events(offset, limit))
            .await
        {
            Ok((items, total)) => EventPage {
                items,
                total,
                page,
                page_size,
            },
            Err(err) => {
                error!(error = %err, "listing degraded to empty page");
                EventPage::empty(page, page_size)
            }
        }
    }

    /// Point lookup. Absence is a normal outcome; store failures degrade to
    /// absence after the retry budget.
    pub async fn get_event(&self, id: &str) -> Option<Event> {
        match self
            .guarded("get_event", || self.store.get_event(id))
            .await
        {
            Ok(found) => found,
            Err(err) => {
                error!(event_id = id, error = %err, "lookup degraded to absence");
                None
            }
        }
    }

    /// Companion read for event detail responses. Degrades to an empty list.
    pub async fn categories_for_event(&self, event_id: &str) -> Vec<SeatCategory> {
        match self
            .guarded("get_categories", || {
                self.store.categories_by_event(event_id)
            })
            .await
        {
            Ok(categories) => categories,
            Err(err) => {
                error!(event_id, error = %err, "category read degraded to empty");
                Vec::new()
            }
        }
    }

    async fn guarded<T, F, Fut>(&self, operation: &str, call: F) -> Result<T, ReadError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let breaker = self.breakers.breaker(operation);
        let mut attempt = 1;

        loop {
            if !breaker.can_execute() {
                warn!(operation, "circuit breaker is open, blocking read");
                return Err(ReadError::CircuitOpen);
            }

            let outcome = match tokio::time::timeout(self.attempt_timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(StoreError::Transient(format!(
                    "{operation} timed out after {:?}",
                    self.attempt_timeout
                ))),
            };

            match outcome {
                Ok(value) => {
                    breaker.record_success();
                    return Ok(value);
                }
                Err(err) => {
                    breaker.record_failure();
                    if err.is_transient() && attempt < self.retry.max_attempts {
                        warn!(operation, attempt, error = %err, "transient read failure, retrying");
                        tokio::time::sleep(self.retry.delay(attempt)).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(ReadError::Store(err));
                }
            }
        }
    }
}
