use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::{Event, SeatCategory};
use crate::store::{CatalogStore, StoreError};

/// In-memory catalog store. Backs the resilience and workflow tests, where
/// failures are injected through the `fail_next_*` queues.
#[derive(Clone, Default)]
pub struct MemoryCatalogStore {
    events: Arc<RwLock<HashMap<String, Event>>>,
    categories: Arc<RwLock<Vec<SeatCategory>>>,
    read_failures: Arc<Mutex<Vec<StoreError>>>,
    write_failures: Arc<Mutex<Vec<StoreError>>>,
    reads: Arc<AtomicU32>,
    writes: Arc<AtomicU32>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an error to be returned by the next read instead of data.
    pub fn fail_next_read(&self, err: StoreError) {
        self.read_failures.lock().unwrap().insert(0, err);
    }

    pub fn fail_next_reads(&self, n: u32) {
        for _ in 0..n {
            self.fail_next_read(StoreError::Transient("injected read failure".into()));
        }
    }

    pub fn fail_next_write(&self, err: StoreError) {
        self.write_failures.lock().unwrap().insert(0, err);
    }

    /// Reads attempted so far, including failed ones.
    pub fn read_count(&self) -> u32 {
        self.reads.load(Ordering::Relaxed)
    }

    pub fn write_count(&self) -> u32 {
        self.writes.load(Ordering::Relaxed)
    }

    pub async fn seed_event(&self, event: Event) {
        self.events.write().await.insert(event.id.clone(), event);
    }

    pub async fn seed_categories(&self, categories: Vec<SeatCategory>) {
        self.categories.write().await.extend(categories);
    }

    fn check_read(&self) -> Result<(), StoreError> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        match self.read_failures.lock().unwrap().pop() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn check_write(&self) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        match self.write_failures.lock().unwrap().pop() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn get_event(&self, id: &str) -> Result<Option<Event>, StoreError> {
        self.check_read()?;
        Ok(self.events.read().await.get(id).cloned())
    }

    async fn list_events(&self, offset: i64, limit: i64) -> Result<(Vec<Event>, i64), StoreError> {
        self.check_read()?;
        let mut items: Vec<Event> = self.events.read().await.values().cloned().collect();
        items.sort_by(|a, b| (a.start_time, &a.id).cmp(&(b.start_time, &b.id)));
        let total = items.len() as i64;
        let items = items
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((items, total))
    }

    async fn upsert_event(&self, event: &Event) -> Result<Event, StoreError> {
        self.check_write()?;
        self.events
            .write()
            .await
            .insert(event.id.clone(), event.clone());
        Ok(event.clone())
    }

    async fn delete_event(&self, id: &str) -> Result<(), StoreError> {
        self.check_write()?;
        self.events.write().await.remove(id);
        Ok(())
    }

    async fn categories_by_event(&self, event_id: &str) -> Result<Vec<SeatCategory>, StoreError> {
        self.check_read()?;
        let mut found: Vec<SeatCategory> = self
            .categories
            .read()
            .await
            .iter()
            .filter(|cat| cat.event_id == event_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(found)
    }

    async fn upsert_categories(&self, categories: &[SeatCategory]) -> Result<(), StoreError> {
        self.check_write()?;
        let mut stored = self.categories.write().await;
        for category in categories {
            stored.retain(|c| !(c.event_id == category.event_id && c.id == category.id));
            stored.push(category.clone());
        }
        Ok(())
    }

    async fn delete_categories(&self, categories: &[SeatCategory]) -> Result<(), StoreError> {
        self.check_write()?;
        let mut stored = self.categories.write().await;
        for category in categories {
            stored.retain(|c| !(c.event_id == category.event_id && c.id == category.id));
        }
        Ok(())
    }
}
