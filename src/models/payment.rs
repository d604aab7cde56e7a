use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub appointment_id: String,
    pub studio_id: String,
    pub amount: f64,
    pub status: String,
    pub method: String,
    /// Processor transaction id (the payment intent id)
    pub reference: String,
    pub card_brand: Option<String>,
    pub card_last4: Option<String>,
    pub created_at: i64,
}
