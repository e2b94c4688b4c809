use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Admin create-or-update payload. A present `id` targets an existing event;
/// an absent `id` creates a new one.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EventUpdateRequest {
    pub id: Option<String>,

    #[validate(length(min = 1, message = "Event name is required"))]
    pub name: String,

    pub description: Option<String>,

    #[serde(rename = "startTime")]
    pub start_time: NaiveDateTime,

    #[validate(length(min = 1, message = "Event venue is required"))]
    pub venue: String,

    #[serde(rename = "seatCategories")]
    #[validate(
        length(min = 1, message = "At least one seat category is required"),
        nested
    )]
    pub seat_categories: Vec<SeatCategoryRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SeatCategoryRequest {
    pub id: Option<String>,

    #[validate(length(min = 1, message = "Seat category name is required"))]
    pub name: String,

    #[validate(range(min = 0.0, message = "Seat category price must be zero or positive"))]
    pub price: f64,

    #[serde(rename = "availableCount")]
    #[validate(range(min = 0, message = "Seat category available count must be zero or positive"))]
    pub available_count: i64,
}

/// Raw image payload lifted out of the multipart request.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub file_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    fn base_request() -> EventUpdateRequest {
        EventUpdateRequest {
            id: None,
            name: "Jazz Night".to_string(),
            description: None,
            start_time: chrono::NaiveDate::from_ymd_opt(2026, 9, 1)
                .unwrap()
                .and_hms_opt(20, 0, 0)
                .unwrap(),
            venue: "Hall A".to_string(),
            seat_categories: vec![SeatCategoryRequest {
                id: None,
                name: "GA".to_string(),
                price: 20.0,
                available_count: 100,
            }],
        }
    }

    #[test]
    fn valid_request_passes() {
        assert!(base_request().validate().is_ok());
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut req = base_request();
        req.name = String::new();
        assert!(req.validate().is_err());
    }

    #[test]
    fn empty_category_list_is_rejected() {
        let mut req = base_request();
        req.seat_categories.clear();
        assert!(req.validate().is_err());
    }

    #[test]
    fn negative_price_is_rejected() {
        let mut req = base_request();
        req.seat_categories[0].price = -1.0;
        assert!(req.validate().is_err());
    }

    #[test]
    fn negative_count_is_rejected() {
        let mut req = base_request();
        req.seat_categories[0].available_count = -5;
        assert!(req.validate().is_err());
    }
}
