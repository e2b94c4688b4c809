use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::errors::ServiceError;
use crate::models::{Event, SeatCategory};
use crate::services::gateway::EventPage;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events", get(list_events))
        .route("/events/{id}", get(get_event))
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub page: Option<u32>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct EventDetailResponse {
    pub event: Event,
    #[serde(rename = "seatCategories")]
    pub seat_categories: Vec<SeatCategory>,
}

// GET /events
async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EventsQuery>,
) -> Json<EventPage> {
    let page = params.page.unwrap_or(1).max(1);
    let page_size = params.page_size.unwrap_or(20).clamp(1, 100);

    Json(state.gateway.list_events(page, page_size).await)
}

// GET /events/{id}
async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<EventDetailResponse>, ServiceError> {
    let Some(event) = state.gateway.get_event(&id).await else {
        return Err(ServiceError::not_found(format!(
            "Event not found with id: {id}"
        )));
    };

    let seat_categories = state.gateway.categories_for_event(&id).await;
    Ok(Json(EventDetailResponse {
        event,
        seat_categories,
    }))
}
