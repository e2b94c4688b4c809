pub mod blob;
pub mod config;
pub mod controllers;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod resilience;
pub mod services;
pub mod store;

use std::sync::Arc;

use blob::{BlobStore, S3BlobStore};
use resilience::BreakerRegistry;
use services::{events::EventService, gateway::ReadGateway};
use store::{CatalogStore, PgCatalogStore};

// Shared state for the whole application.
pub struct AppState {
    pub config: config::Config,
    pub gateway: ReadGateway,
    pub events: EventService,
}

impl AppState {
    pub async fn new(config: config::Config) -> anyhow::Result<Arc<Self>> {
        let pg =
            PgCatalogStore::connect(&config.database.url, config.database.pool_size).await?;
        pg.run_migrations().await?;

        let store: Arc<dyn CatalogStore> = Arc::new(pg);
        let blob: Arc<dyn BlobStore> = Arc::new(S3BlobStore::from_config(&config.storage).await);

        let breakers = Arc::new(BreakerRegistry::new(config.resilience.clone()));
        let gateway = ReadGateway::new(store.clone(), breakers, &config.resilience);
        let events = EventService::new(store, blob);

        Ok(Arc::new(Self {
            config,
            gateway,
            events,
        }))
    }
}
