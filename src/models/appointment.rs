use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    /// Whether an appointment in this status occupies its time slot.
    pub fn blocks_slot(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub studio_id: String,
    pub artist_id: String,
    pub client_id: String,
    pub service_id: Option<String>,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
    /// Minutes
    pub duration: i32,
    pub status: AppointmentStatus,
    /// Copied from the service at booking time
    pub price: Option<f64>,
    pub deposit_paid: f64,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub created_at: i64,
}

/// Row returned by the availability query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookedSlot {
    pub id: String,
    pub artist_id: String,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration: i32,
    pub status: AppointmentStatus,
}

/// Everything needed to insert an appointment once its client is known.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub studio_id: String,
    pub artist_id: String,
    pub service_id: Option<String>,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration: i32,
    pub price: Option<f64>,
    pub deposit_paid: f64,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}
