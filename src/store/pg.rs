use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use tracing::info;

use crate::models::{Event, SeatCategory};
use crate::store::{CatalogStore, StoreError};

#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub async fn connect(database_url: &str, pool_size: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("./src/migrations").run(&self.pool).await?;
        info!("Migrations completed");
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn get_event(&self, id: &str) -> Result<Option<Event>, StoreError> {
        sqlx::query_as::<_, Event>(
            "SELECT event_id AS id, name, description, start_time, venue, image_url
             FROM events
             WHERE event_id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }

    async fn list_events(&self, offset: i64, limit: i64) -> Result<(Vec<Event>, i64), StoreError> {
        let items = sqlx::query_as::<_, Event>(
            "SELECT event_id AS id, name, description, start_time, venue, image_url
             FROM events
             ORDER BY start_time, event_id
             LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events")
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;

        Ok((items, total))
    }

    async fn upsert_event(&self, event: &Event) -> Result<Event, StoreError> {
        sqlx::query_as::<_, Event>(
            "INSERT INTO events (event_id, name, description, start_time, venue, image_url)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (event_id) DO UPDATE
             SET name = EXCLUDED.name,
                 description = EXCLUDED.description,
                 start_time = EXCLUDED.start_time,
                 venue = EXCLUDED.venue,
                 image_url = EXCLUDED.image_url
             RETURNING event_id AS id, name, description, start_time, venue, image_url",
        )
        .bind(&event.id)
        .bind(&event.name)
        .bind(&event.description)
        .bind(event.start_time)
        .bind(&event.venue)
        .bind(&event.image_url)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }

    async fn delete_event(&self, id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM events WHERE event_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    async fn categories_by_event(&self, event_id: &str) -> Result<Vec<SeatCategory>, StoreError> {
        sqlx::query_as::<_, SeatCategory>(
            "SELECT event_id, category_id AS id, name, price, available_count
             FROM seat_categories
             WHERE event_id = $1
             ORDER BY category_id",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }

    async fn upsert_categories(&self, categories: &[SeatCategory]) -> Result<(), StoreError> {
        for category in categories {
            sqlx::query(
                "INSERT INTO seat_categories (event_id, category_id, name, price, available_count)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (event_id, category_id) DO UPDATE
                 SET name = EXCLUDED.name,
                     price = EXCLUDED.price,
                     available_count = EXCLUDED.available_count",
            )
            .bind(&category.event_id)
            .bind(&category.id)
            .bind(&category.name)
            .bind(category.price)
            .bind(category.available_count)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;
        }
        Ok(())
    }

    async fn delete_categories(&self, categories: &[SeatCategory]) -> Result<(), StoreError> {
        for category in categories {
            sqlx::query("DELETE FROM seat_categories WHERE event_id = $1 AND category_id = $2")
                .bind(&category.event_id)
                .bind(&category.id)
                .execute(&self.pool)
                .await
                .map_err(StoreError::from_sqlx)?;
        }
        Ok(())
    }
}
