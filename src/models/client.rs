use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub studio_id: String,
    pub full_name: String,
    /// Normalized (trimmed, lowercased) - the dedup key within a studio
    pub email: String,
    pub phone: Option<String>,
    pub created_at: i64,
}

/// Contact details submitted with a booking.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientDetails {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}
