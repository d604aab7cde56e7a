use serde::{Deserialize, Serialize};

/// Appointment length assumed when a service has no duration set.
pub const DEFAULT_DURATION_MINUTES: i32 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub studio_id: String,
    pub name: String,
    pub price: Option<f64>,
    pub duration_minutes: Option<i32>,
    pub created_at: i64,
}

impl Service {
    pub fn duration(&self) -> i32 {
        self.duration_minutes
            .filter(|d| *d > 0)
            .unwrap_or(DEFAULT_DURATION_MINUTES)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateService {
    pub name: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub duration_minutes: Option<i32>,
}
