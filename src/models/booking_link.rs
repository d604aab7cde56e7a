use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingLink {
    pub id: String,
    pub studio_id: String,
    pub booking_slug: String,
    pub is_active: bool,
    pub created_at: i64,
}
