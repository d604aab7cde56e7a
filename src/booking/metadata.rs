//! Booking details carried on a payment intent between checkout and confirmation.
//!
//! No local draft booking exists while a deposit is being paid; the intent's
//! metadata is the only copy. Processor metadata is string-only with size
//! limits, which are checked here before the intent is created.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use crate::util::{format_time, parse_date, parse_time};

pub const MAX_METADATA_KEYS: usize = 50;
pub const MAX_KEY_CHARS: usize = 40;
pub const MAX_VALUE_CHARS: usize = 500;

const STUDIO_ID: &str = "studioId";
const BOOKING_SLUG: &str = "bookingSlug";
const ARTIST_ID: &str = "artistId";
const SERVICE_ID: &str = "serviceId";
const APPOINTMENT_DATE: &str = "appointmentDate";
const START_TIME: &str = "startTime";
const CLIENT_EMAIL: &str = "clientEmail";
const CLIENT_NAME: &str = "clientName";
const CLIENT_PHONE: &str = "clientPhone";
const NOTES: &str = "notes";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    #[error("Booking metadata is missing {0}")]
    Missing(&'static str),
    #[error("Booking metadata has an invalid {0}")]
    Invalid(&'static str),
    #[error("{0} is too long (max 500 characters)")]
    ValueTooLong(&'static str),
    #[error("Too many metadata entries")]
    TooManyKeys,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingMetadata {
    pub studio_id: String,
    pub booking_slug: Option<String>,
    pub artist_id: String,
    pub service_id: String,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
    pub client_email: String,
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
    pub notes: Option<String>,
}

impl BookingMetadata {
    /// Render as processor metadata, rejecting anything the processor would refuse.
    pub fn to_stripe_metadata(&self) -> Result<BTreeMap<String, String>, MetadataError> {
        let mut map = BTreeMap::new();
        map.insert(STUDIO_ID, Some(self.studio_id.clone()));
        map.insert(BOOKING_SLUG, self.booking_slug.clone());
        map.insert(ARTIST_ID, Some(self.artist_id.clone()));
        map.insert(SERVICE_ID, Some(self.service_id.clone()));
        map.insert(APPOINTMENT_DATE, Some(self.appointment_date.format("%Y-%m-%d").to_string()));
        map.insert(START_TIME, Some(format_time(self.start_time)));
        map.insert(CLIENT_EMAIL, Some(self.client_email.clone()));
        map.insert(CLIENT_NAME, self.client_name.clone());
        map.insert(CLIENT_PHONE, self.client_phone.clone());
        map.insert(NOTES, self.notes.clone());

        let mut out = BTreeMap::new();
        for (key, value) in map {
            // Empty strings mean "unset" to the processor, so leave them out
            let Some(value) = value.filter(|v| !v.is_empty()) else {
                continue;
            };
            debug_assert!(key.chars().count() <= MAX_KEY_CHARS);
            if value.chars().count() > MAX_VALUE_CHARS {
                return Err(MetadataError::ValueTooLong(key));
            }
            out.insert(key.to_string(), value);
        }

        if out.len() > MAX_METADATA_KEYS {
            return Err(MetadataError::TooManyKeys);
        }
        Ok(out)
    }

    /// The studio a payment was taken for, if it came from a booking at all.
    pub fn studio_id_of(map: &BTreeMap<String, String>) -> Option<&str> {
        map.get(STUDIO_ID).map(|v| v.trim()).filter(|v| !v.is_empty())
    }

    /// Read booking details back off a confirmed intent.
    pub fn from_stripe_metadata(map: &BTreeMap<String, String>) -> Result<Self, MetadataError> {
        let required = |key: &'static str| {
            map.get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .ok_or(MetadataError::Missing(key))
        };
        let optional = |key: &str| {
            map.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let studio_id = required(STUDIO_ID)?.to_string();
        let artist_id = required(ARTIST_ID)?.to_string();
        let service_id = required(SERVICE_ID)?.to_string();
        let appointment_date =
            parse_date(required(APPOINTMENT_DATE)?).ok_or(MetadataError::Invalid(APPOINTMENT_DATE))?;
        let start_time =
            parse_time(required(START_TIME)?).ok_or(MetadataError::Invalid(START_TIME))?;
        let client_email = required(CLIENT_EMAIL)?.to_string();

        Ok(Self {
            studio_id,
            booking_slug: optional(BOOKING_SLUG),
            artist_id,
            service_id,
            appointment_date,
            start_time,
            client_email,
            client_name: optional(CLIENT_NAME),
            client_phone: optional(CLIENT_PHONE),
            notes: optional(NOTES),
        })
    }
}
