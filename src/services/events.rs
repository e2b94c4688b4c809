//! Event update orchestration.
//!
//! Drives the create-or-update workflow as a linear sequence: validate,
//! resolve the target event, apply field updates, optionally upload the
//! image, persist the event, reconcile seat categories. The event upsert is
//! the commit point; the image goes to the blob store first so a committed
//! event never points at a missing blob, and categories are written last
//! because they are meaningless without a committed parent.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::blob::BlobStore;
use crate::errors::ServiceError;
use crate::models::{Event, EventUpdateRequest, ImageUpload, SeatCategory};
use crate::services::reconciler::SeatCategoryReconciler;
use crate::store::CatalogStore;

#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn CatalogStore>,
    blob: Arc<dyn BlobStore>,
    reconciler: SeatCategoryReconciler,
}

impl EventService {
    pub fn new(store: Arc<dyn CatalogStore>, blob: Arc<dyn BlobStore>) -> Self {
        let reconciler = SeatCategoryReconciler::new(store.clone());
        Self {
            store,
            blob,
            reconciler,
        }
    }

    /// Create or update an event and its seat-category set.
    ///
    /// Nothing is durably changed before the event upsert; a validation,
    /// resolution or image failure leaves the prior state untouched. There is
    /// no optimistic-concurrency token: concurrent updates to the same event
    /// are last-writer-wins, including the category set.
    pub async fn create_or_update(
        &self,
        request: EventUpdateRequest,
        image: Option<ImageUpload>,
    ) -> Result<Event, ServiceError> {
        self.validate(&request)?;

        let target_id = request
            .id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());

        let mut event = match target_id {
            Some(id) => {
                info!(event_id = id, "updating existing event");
                self.store
                    .get_event(id)
                    .await
                    .map_err(|e| ServiceError::store("resolve event", e))?
                    .ok_or_else(|| {
                        warn!(event_id = id, "attempted to update non-existent event");
                        ServiceError::not_found(format!("Event not found with id: {id}"))
                    })?
            }
            None => {
                info!(name = %request.name, "creating new event");
                Event {
                    id: Uuid::new_v4().to_string(),
                    name: String::new(),
                    description: None,
                    start_time: request.start_time,
                    venue: String::new(),
                    image_url: None,
                }
            }
        };

        event.name = request.name.clone();
        event.description = request.description.clone();
        event.start_time = request.start_time;
        event.venue = request.venue.clone();

        // Upload before the commit point so a persisted event never
        // references a missing blob. A kept `image_url` from the fetched
        // event survives unchanged when no new image arrives.
        let mut uploaded_location = None;
        if let Some(image) = image {
            let key = format!(
                "event_images/{}/{}_{}",
                event.id,
                Utc::now().timestamp_millis(),
                image.file_name
            );
            let location = self
                .blob
                .put(&key, image.bytes, &image.content_type)
                .await
                .map_err(ServiceError::BlobUpload)?;
            event.image_url = Some(location.clone());
            uploaded_location = Some(location);
        }

        // Commit point.
        let saved = match self.store.upsert_event(&event).await {
            Ok(saved) => saved,
            Err(err) => {
                if let Some(location) = uploaded_location {
                    // Not cleaned up automatically; flagged for operators.
                    warn!(%location, "event commit failed, uploaded image is orphaned");
                }
                return Err(ServiceError::store("persist event", err));
            }
        };
        info!(event_id = %saved.id, "event persisted");

        let previous = self
            .store
            .categories_by_event(&saved.id)
            .await
            .map_err(|e| ServiceError::store("load seat categories", e))?;
        self.reconciler
            .reconcile(&saved.id, previous, &request.seat_categories)
            .await
            .map_err(|e| ServiceError::store("reconcile seat categories", e))?;

        Ok(saved)
    }

    /// Current seat categories of an event, for detail/admin responses.
    pub async fn categories(&self, event_id: &str) -> Result<Vec<SeatCategory>, ServiceError> {
        self.store
            .categories_by_event(event_id)
            .await
            .map_err(|e| ServiceError::store("load seat categories", e))
    }

    // Runs before any store access. Blank-after-trim checks mirror the
    // required-field rules the derive cannot express.
    fn validate(&self, request: &EventUpdateRequest) -> Result<(), ServiceError> {
        if request.name.trim().is_empty() {
            return Err(ServiceError::validation("Event name is required"));
        }
        if request.venue.trim().is_empty() {
            return Err(ServiceError::validation("Event venue is required"));
        }
        request
            .validate()
            .map_err(|e| ServiceError::Validation(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::MemoryBlobStore;
    use crate::models::SeatCategoryRequest;
    use crate::store::MemoryCatalogStore;
    use chrono::NaiveDate;

    struct Fixture {
        store: MemoryCatalogStore,
        blob: MemoryBlobStore,
        service: EventService,
    }

    fn fixture() -> Fixture {
        let store = MemoryCatalogStore::new();
        let blob = MemoryBlobStore::new();
        let service = EventService::new(Arc::new(store.clone()), Arc::new(blob.clone()));
        Fixture {
            store,
            blob,
            service,
        }
    }

    fn start_time() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 9, 1)
            .unwrap()
            .and_hms_opt(20, 0, 0)
            .unwrap()
    }

    fn create_request() -> EventUpdateRequest {
        EventUpdateRequest {
            id: None,
            name: "Jazz Night".to_string(),
            description: None,
            start_time: start_time(),
            venue: "Hall A".to_string(),
            seat_categories: vec![SeatCategoryRequest {
                id: None,
                name: "GA".to_string(),
                price: 20.0,
                available_count: 100,
            }],
        }
    }

    fn existing_event(id: &str) -> Event {
        Event {
            id: id.to_string(),
            name: "Old Name".to_string(),
            description: Some("old".to_string()),
            start_time: start_time(),
            venue: "Old Venue".to_string(),
            image_url: None,
        }
    }

    fn image() -> ImageUpload {
        ImageUpload {
            bytes: vec![0xff, 0xd8, 0xff],
            content_type: "image/jpeg".to_string(),
            file_name: "poster.jpg".to_string(),
        }
    }

    #[tokio::test]
    async fn create_assigns_fresh_id_and_persists_categories() {
        let fx = fixture();

        let event = fx
            .service
            .create_or_update(create_request(), None)
            .await
            .unwrap();

        assert!(!event.id.is_empty());
        assert!(Uuid::parse_str(&event.id).is_ok());
        assert!(event.image_url.is_none());

        let stored = fx.store.get_event(&event.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Jazz Night");
        assert_eq!(stored.venue, "Hall A");

        let categories = fx.service.categories(&event.id).await.unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, "GA");
        assert_eq!(categories[0].available_count, 100);
    }

    #[tokio::test]
    async fn created_ids_are_distinct() {
        let fx = fixture();

        let first = fx
            .service
            .create_or_update(create_request(), None)
            .await
            .unwrap();
        let second = fx
            .service
            .create_or_update(create_request(), None)
            .await
            .unwrap();

        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn update_retains_id_and_replaces_categories() {
        let fx = fixture();
        fx.store.seed_event(existing_event("E1")).await;
        fx.store
            .seed_categories(vec![SeatCategory {
                event_id: "E1".to_string(),
                id: "C1".to_string(),
                name: "Old".to_string(),
                price: 5.0,
                available_count: 10,
            }])
            .await;

        let mut request = create_request();
        request.id = Some("E1".to_string());
        request.seat_categories = vec![SeatCategoryRequest {
            id: None,
            name: "New".to_string(),
            price: 30.0,
            available_count: 40,
        }];

        let event = fx.service.create_or_update(request, None).await.unwrap();

        assert_eq!(event.id, "E1");
        assert_eq!(event.name, "Jazz Night");

        let categories = fx.service.categories("E1").await.unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, "New");
        assert_ne!(categories[0].id, "C1");
    }

    #[tokio::test]
    async fn update_of_unknown_id_fails_without_mutation() {
        let fx = fixture();

        let mut request = create_request();
        request.id = Some("missing".to_string());

        let err = fx.service.create_or_update(request, None).await.unwrap_err();

        assert!(matches!(err, ServiceError::NotFound(_)));
        assert_eq!(fx.store.write_count(), 0);
    }

    #[tokio::test]
    async fn validation_failure_never_touches_the_store() {
        let fx = fixture();

        let mut request = create_request();
        request.name = "   ".to_string();
        let err = fx.service.create_or_update(request, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let mut request = create_request();
        request.seat_categories.clear();
        let err = fx.service.create_or_update(request, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        assert_eq!(fx.store.read_count(), 0);
        assert_eq!(fx.store.write_count(), 0);
    }

    #[tokio::test]
    async fn image_upload_sets_location_under_event_namespace() {
        let fx = fixture();

        let event = fx
            .service
            .create_or_update(create_request(), Some(image()))
            .await
            .unwrap();

        let location = event.image_url.expect("image location should be set");
        assert!(location.starts_with(&format!("mem://event_images/{}/", event.id)));
        assert!(location.ends_with("_poster.jpg"));
        assert_eq!(fx.blob.object_count().await, 1);
    }

    #[tokio::test]
    async fn image_upload_failure_aborts_before_any_durable_write() {
        let fx = fixture();
        fx.store.seed_event(existing_event("E1")).await;
        fx.store
            .seed_categories(vec![SeatCategory {
                event_id: "E1".to_string(),
                id: "C1".to_string(),
                name: "Old".to_string(),
                price: 5.0,
                available_count: 10,
            }])
            .await;
        fx.blob.fail_next(1);

        let mut request = create_request();
        request.id = Some("E1".to_string());

        let err = fx
            .service
            .create_or_update(request, Some(image()))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::BlobUpload(_)));

        // Prior state byte-for-byte untouched.
        let stored = fx.store.get_event("E1").await.unwrap().unwrap();
        assert_eq!(stored, existing_event("E1"));
        let categories = fx.store.categories_by_event("E1").await.unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].id, "C1");
        assert_eq!(fx.store.write_count(), 0);
    }

    #[tokio::test]
    async fn update_without_image_preserves_existing_location() {
        let fx = fixture();
        let mut seeded = existing_event("E1");
        seeded.image_url = Some("s3://event-catalog-images/event_images/E1/old.jpg".to_string());
        fx.store.seed_event(seeded.clone()).await;

        let mut request = create_request();
        request.id = Some("E1".to_string());

        let event = fx.service.create_or_update(request, None).await.unwrap();

        assert_eq!(event.image_url, seeded.image_url);
    }
}
