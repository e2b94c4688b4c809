use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use std::sync::Arc;
use tracing::info;

use crate::controllers::events::EventDetailResponse;
use crate::errors::ServiceError;
use crate::middleware::AdminUser;
use crate::models::{EventUpdateRequest, ImageUpload};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/admin/events", post(create_or_update_event))
}

// POST /admin/events
//
// Multipart body: `eventData` (JSON) plus an optional `imageFile` part.
async fn create_or_update_event(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ServiceError> {
    let mut request: Option<EventUpdateRequest> = None;
    let mut image: Option<ImageUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::validation(format!("Invalid multipart request: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("eventData") => {
                let raw = field.text().await.map_err(|e| {
                    ServiceError::validation(format!("Unreadable eventData part: {e}"))
                })?;
                request = Some(serde_json::from_str(&raw).map_err(|e| {
                    ServiceError::validation(format!("Invalid JSON format for eventData: {e}"))
                })?);
            }
            Some("imageFile") => {
                let file_name = field.file_name().unwrap_or("image").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    ServiceError::validation(format!("Unreadable imageFile part: {e}"))
                })?;
                if !bytes.is_empty() {
                    image = Some(ImageUpload {
                        bytes: bytes.to_vec(),
                        content_type,
                        file_name,
                    });
                }
            }
            _ => {}
        }
    }

    let request =
        request.ok_or_else(|| ServiceError::validation("eventData part is required"))?;
    info!(
        subject = %admin.subject,
        update = request.id.is_some(),
        image = image.is_some(),
        "admin event upsert received"
    );

    let event = state.events.create_or_update(request, image).await?;
    let seat_categories = state.events.categories(&event.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(EventDetailResponse {
            event,
            seat_categories,
        }),
    ))
}
