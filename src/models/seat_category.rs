use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// Composite key: (event_id, id). Uniqueness is enforced by the store.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatCategory {
    pub event_id: String,
    pub id: String,
    pub name: String,
    pub price: f64,
    pub available_count: i64,
}
