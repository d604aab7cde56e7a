//! Row mapping for the query layer.
//!
//! Each model has a column-list constant matching the order its `FromRow`
//! impl reads, so `SELECT {COLS} FROM ...` and the mapper can't drift apart.

use std::str::FromStr;

use rusqlite::{Connection, Params, Row, types::Type};

use crate::error::Result;
use crate::models::*;

pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

pub fn query_one<T: FromRow>(conn: &Connection, sql: &str, params: impl Params) -> Result<Option<T>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    match rows.next()? {
        Some(row) => Ok(Some(T::from_row(row)?)),
        None => Ok(None),
    }
}

pub fn query_all<T: FromRow>(conn: &Connection, sql: &str, params: impl Params) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| T::from_row(row))?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
}

/// Read a text column into a strum enum.
fn parse_col<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub const STUDIO_COLS: &str = "id, name, allow_online_booking, require_deposit, deposit_amount, \
     deposit_percentage, stripe_account_id, currency, timezone, created_at";

impl FromRow for Studio {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Studio {
            id: row.get(0)?,
            name: row.get(1)?,
            allow_online_booking: row.get(2)?,
            require_deposit: row.get(3)?,
            deposit_amount: row.get(4)?,
            deposit_percentage: row.get(5)?,
            stripe_account_id: row.get(6)?,
            currency: row.get(7)?,
            timezone: row.get(8)?,
            created_at: row.get(9)?,
        })
    }
}

pub const BUSINESS_HOURS_COLS: &str = "studio_id, weekday, open_time, close_time, is_closed";

impl FromRow for BusinessHours {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(BusinessHours {
            studio_id: row.get(0)?,
            weekday: row.get(1)?,
            open_time: row.get(2)?,
            close_time: row.get(3)?,
            is_closed: row.get(4)?,
        })
    }
}

pub const ARTIST_COLS: &str = "id, studio_id, name, status, specialty, hourly_rate, created_at";

impl FromRow for Artist {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Artist {
            id: row.get(0)?,
            studio_id: row.get(1)?,
            name: row.get(2)?,
            status: parse_col(row, 3)?,
            specialty: row.get(4)?,
            hourly_rate: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}

pub const SERVICE_COLS: &str = "id, studio_id, name, price, duration_minutes, created_at";

impl FromRow for Service {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Service {
            id: row.get(0)?,
            studio_id: row.get(1)?,
            name: row.get(2)?,
            price: row.get(3)?,
            duration_minutes: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

pub const BOOKING_LINK_COLS: &str = "id, studio_id, booking_slug, is_active, created_at";

impl FromRow for BookingLink {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(BookingLink {
            id: row.get(0)?,
            studio_id: row.get(1)?,
            booking_slug: row.get(2)?,
            is_active: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

pub const CLIENT_COLS: &str = "id, studio_id, full_name, email, phone, created_at";

impl FromRow for Client {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Client {
            id: row.get(0)?,
            studio_id: row.get(1)?,
            full_name: row.get(2)?,
            email: row.get(3)?,
            phone: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

pub const APPOINTMENT_COLS: &str = "id, studio_id, artist_id, client_id, service_id, \
     appointment_date, start_time, duration, status, price, deposit_paid, payment_status, \
     payment_method, notes, created_at";

impl FromRow for Appointment {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Appointment {
            id: row.get(0)?,
            studio_id: row.get(1)?,
            artist_id: row.get(2)?,
            client_id: row.get(3)?,
            service_id: row.get(4)?,
            appointment_date: row.get(5)?,
            start_time: row.get(6)?,
            duration: row.get(7)?,
            status: parse_col(row, 8)?,
            price: row.get(9)?,
            deposit_paid: row.get(10)?,
            payment_status: parse_col(row, 11)?,
            payment_method: row.get(12)?,
            notes: row.get(13)?,
            created_at: row.get(14)?,
        })
    }
}

pub const BOOKED_SLOT_COLS: &str = "id, artist_id, appointment_date, start_time, duration, status";

impl FromRow for BookedSlot {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(BookedSlot {
            id: row.get(0)?,
            artist_id: row.get(1)?,
            appointment_date: row.get(2)?,
            start_time: row.get(3)?,
            duration: row.get(4)?,
            status: parse_col(row, 5)?,
        })
    }
}

pub const PAYMENT_COLS: &str = "id, appointment_id, studio_id, amount, status, method, reference, \
     card_brand, card_last4, created_at";

impl FromRow for Payment {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Payment {
            id: row.get(0)?,
            appointment_id: row.get(1)?,
            studio_id: row.get(2)?,
            amount: row.get(3)?,
            status: row.get(4)?,
            method: row.get(5)?,
            reference: row.get(6)?,
            card_brand: row.get(7)?,
            card_last4: row.get(8)?,
            created_at: row.get(9)?,
        })
    }
}
