use chrono::{NaiveDate, NaiveTime, Utc};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use uuid::Uuid;

use crate::booking::{is_slot_available, overlapping};
use crate::error::{AppError, Result};
use crate::models::*;
use crate::util::normalize_email;

use super::from_row::{
    APPOINTMENT_COLS, ARTIST_COLS, BOOKED_SLOT_COLS, BOOKING_LINK_COLS, BUSINESS_HOURS_COLS,
    CLIENT_COLS, PAYMENT_COLS, SERVICE_COLS, STUDIO_COLS, query_all, query_one,
};

fn now() -> i64 {
    Utc::now().timestamp()
}

fn gen_id() -> String {
    Uuid::new_v4().to_string()
}

// ============ Studios ============

pub fn create_studio(conn: &Connection, input: &CreateStudio) -> Result<Studio> {
    let id = gen_id();
    let now = now();
    let currency = input
        .currency
        .as_deref()
        .map(str::to_lowercase)
        .unwrap_or_else(|| "usd".to_string());

    conn.execute(
        "INSERT INTO studios (id, name, allow_online_booking, require_deposit, deposit_amount,
                              deposit_percentage, stripe_account_id, currency, timezone, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            &id,
            &input.name,
            input.allow_online_booking,
            input.require_deposit,
            input.deposit_amount,
            input.deposit_percentage,
            &input.stripe_account_id,
            &currency,
            &input.timezone,
            now
        ],
    )?;

    Ok(Studio {
        id,
        name: input.name.clone(),
        allow_online_booking: input.allow_online_booking,
        require_deposit: input.require_deposit,
        deposit_amount: input.deposit_amount,
        deposit_percentage: input.deposit_percentage,
        stripe_account_id: input.stripe_account_id.clone(),
        currency,
        timezone: input.timezone.clone(),
        created_at: now,
    })
}

pub fn get_studio_by_id(conn: &Connection, id: &str) -> Result<Option<Studio>> {
    query_one(
        conn,
        &format!("SELECT {} FROM studios WHERE id = ?1", STUDIO_COLS),
        params![id],
    )
}

// ============ Business Hours ============

/// Insert or replace one weekday's hours.
pub fn set_business_hours(conn: &Connection, studio_id: &str, input: &SetBusinessHours) -> Result<()> {
    if input.weekday > 6 {
        return Err(AppError::BadRequest("weekday must be between 0 and 6".into()));
    }

    let (open, close) = match (input.open_time, input.close_time) {
        (Some(open), Some(close)) if open < close => (open, close),
        _ if input.is_closed => (NaiveTime::MIN, NaiveTime::MIN),
        _ => {
            return Err(AppError::BadRequest(
                "open_time must be before close_time".into(),
            ));
        }
    };

    conn.execute(
        "INSERT INTO business_hours (studio_id, weekday, open_time, close_time, is_closed)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (studio_id, weekday) DO UPDATE SET
            open_time = excluded.open_time,
            close_time = excluded.close_time,
            is_closed = excluded.is_closed",
        params![studio_id, input.weekday, open, close, input.is_closed],
    )?;
    Ok(())
}

pub fn list_business_hours(conn: &Connection, studio_id: &str) -> Result<Vec<BusinessHours>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM business_hours WHERE studio_id = ?1 ORDER BY weekday",
            BUSINESS_HOURS_COLS
        ),
        params![studio_id],
    )
}

pub fn get_weekly_hours(conn: &Connection, studio_id: &str) -> Result<WeeklyHours> {
    let rows = list_business_hours(conn, studio_id)?;
    Ok(WeeklyHours::from_rows(&rows))
}

// ============ Artists ============

pub fn create_artist(conn: &Connection, studio_id: &str, input: &CreateArtist) -> Result<Artist> {
    let id = gen_id();
    let now = now();
    let status = input.status.unwrap_or(ArtistStatus::Active);

    conn.execute(
        "INSERT INTO artists (id, studio_id, name, status, specialty, hourly_rate, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            &id,
            studio_id,
            &input.name,
            status.as_ref(),
            &input.specialty,
            input.hourly_rate,
            now
        ],
    )?;

    Ok(Artist {
        id,
        studio_id: studio_id.to_string(),
        name: input.name.clone(),
        status,
        specialty: input.specialty.clone(),
        hourly_rate: input.hourly_rate,
        created_at: now,
    })
}

pub fn get_artist_by_id(conn: &Connection, id: &str) -> Result<Option<Artist>> {
    query_one(
        conn,
        &format!("SELECT {} FROM artists WHERE id = ?1", ARTIST_COLS),
        params![id],
    )
}

pub fn list_active_artists(conn: &Connection, studio_id: &str) -> Result<Vec<Artist>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM artists WHERE studio_id = ?1 AND status = ?2 ORDER BY name",
            ARTIST_COLS
        ),
        params![studio_id, ArtistStatus::Active.as_ref()],
    )
}

// ============ Services ============

pub fn create_service(conn: &Connection, studio_id: &str, input: &CreateService) -> Result<Service> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO services (id, studio_id, name, price, duration_minutes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![&id, studio_id, &input.name, input.price, input.duration_minutes, now],
    )?;

    Ok(Service {
        id,
        studio_id: studio_id.to_string(),
        name: input.name.clone(),
        price: input.price,
        duration_minutes: input.duration_minutes,
        created_at: now,
    })
}

pub fn get_service_by_id(conn: &Connection, id: &str) -> Result<Option<Service>> {
    query_one(
        conn,
        &format!("SELECT {} FROM services WHERE id = ?1", SERVICE_COLS),
        params![id],
    )
}

pub fn list_services(conn: &Connection, studio_id: &str) -> Result<Vec<Service>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM services WHERE studio_id = ?1 ORDER BY name",
            SERVICE_COLS
        ),
        params![studio_id],
    )
}

// ============ Booking Links ============

pub fn create_booking_link(
    conn: &Connection,
    studio_id: &str,
    booking_slug: &str,
    is_active: bool,
) -> Result<BookingLink> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO booking_links (id, studio_id, booking_slug, is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![&id, studio_id, booking_slug, is_active, now],
    )?;

    Ok(BookingLink {
        id,
        studio_id: studio_id.to_string(),
        booking_slug: booking_slug.to_string(),
        is_active,
        created_at: now,
    })
}

pub fn get_booking_link(
    conn: &Connection,
    studio_id: &str,
    booking_slug: &str,
) -> Result<Option<BookingLink>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM booking_links WHERE studio_id = ?1 AND booking_slug = ?2",
            BOOKING_LINK_COLS
        ),
        params![studio_id, booking_slug],
    )
}

pub fn has_active_booking_link(conn: &Connection, studio_id: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM booking_links WHERE studio_id = ?1 AND is_active = 1 LIMIT 1",
            params![studio_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn set_booking_link_active(conn: &Connection, id: &str, is_active: bool) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE booking_links SET is_active = ?1 WHERE id = ?2",
        params![is_active, id],
    )?;
    Ok(updated > 0)
}

// ============ Clients ============

pub fn get_client_by_email(conn: &Connection, studio_id: &str, email: &str) -> Result<Option<Client>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM clients WHERE studio_id = ?1 AND email = ?2",
            CLIENT_COLS
        ),
        params![studio_id, normalize_email(email)],
    )
}

/// Return the studio's client for this email, creating it on first booking.
///
/// Relies on the UNIQUE (studio_id, email) constraint: a concurrent insert for
/// the same email is ignored and both callers read back the same row.
pub fn find_or_create_client(
    conn: &Connection,
    studio_id: &str,
    details: &ClientDetails,
) -> Result<Client> {
    let email = normalize_email(&details.email);
    if email.is_empty() {
        return Err(AppError::BadRequest("Client email is required".into()));
    }

    conn.execute(
        "INSERT OR IGNORE INTO clients (id, studio_id, full_name, email, phone, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            gen_id(),
            studio_id,
            details.full_name.trim(),
            &email,
            &details.phone,
            now()
        ],
    )?;

    get_client_by_email(conn, studio_id, &email)?
        .ok_or_else(|| AppError::Internal("Client missing after insert".into()))
}

// ============ Appointments ============

/// All appointments for an artist on a date, whatever their status.
pub fn list_booked_slots(
    conn: &Connection,
    studio_id: &str,
    artist_id: &str,
    date: NaiveDate,
) -> Result<Vec<BookedSlot>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM appointments
             WHERE studio_id = ?1 AND artist_id = ?2 AND appointment_date = ?3
             ORDER BY start_time",
            BOOKED_SLOT_COLS
        ),
        params![studio_id, artist_id, date],
    )
}

pub fn get_appointment_by_id(conn: &Connection, id: &str) -> Result<Option<Appointment>> {
    query_one(
        conn,
        &format!("SELECT {} FROM appointments WHERE id = ?1", APPOINTMENT_COLS),
        params![id],
    )
}

/// Look up the appointment occupying the duplicate-booking key.
pub fn find_appointment(
    conn: &Connection,
    studio_id: &str,
    artist_id: &str,
    client_id: &str,
    date: NaiveDate,
    start_time: NaiveTime,
) -> Result<Option<Appointment>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM appointments
             WHERE studio_id = ?1 AND artist_id = ?2 AND client_id = ?3
               AND appointment_date = ?4 AND start_time = ?5",
            APPOINTMENT_COLS
        ),
        params![studio_id, artist_id, client_id, date, start_time],
    )
}

/// Insert an appointment unless one already holds the duplicate-booking key.
///
/// Returns the stored appointment and whether this call created it.
pub fn insert_appointment_if_absent(
    conn: &Connection,
    client_id: &str,
    input: &NewAppointment,
) -> Result<(Appointment, bool)> {
    let id = gen_id();
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO appointments
            (id, studio_id, artist_id, client_id, service_id, appointment_date, start_time,
             duration, status, price, deposit_paid, payment_status, payment_method, notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            &id,
            &input.studio_id,
            &input.artist_id,
            client_id,
            &input.service_id,
            input.appointment_date,
            input.start_time,
            input.duration,
            AppointmentStatus::Pending.as_ref(),
            input.price,
            input.deposit_paid,
            input.payment_status.as_ref(),
            &input.payment_method,
            &input.notes,
            now()
        ],
    )?;

    let appointment = find_appointment(
        conn,
        &input.studio_id,
        &input.artist_id,
        client_id,
        input.appointment_date,
        input.start_time,
    )?
    .ok_or_else(|| AppError::Internal("Appointment missing after insert".into()))?;

    Ok((appointment, inserted > 0))
}

/// Result of writing a booking's client and appointment.
#[derive(Debug, Clone)]
pub struct BookingRecord {
    pub client: Client,
    pub appointment: Appointment,
    /// False when the appointment already existed
    pub created: bool,
}

/// Create the client (if new) and an unpaid appointment atomically.
///
/// The slot is checked again under the write lock, so concurrent requests
/// for the same artist and time can't both land. Resubmitting a booking
/// that already exists returns it unchanged.
pub fn create_booking(
    conn: &mut Connection,
    client: &ClientDetails,
    appointment: &NewAppointment,
) -> Result<BookingRecord> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let client = find_or_create_client(&tx, &appointment.studio_id, client)?;

    if let Some(existing) = find_appointment(
        &tx,
        &appointment.studio_id,
        &appointment.artist_id,
        &client.id,
        appointment.appointment_date,
        appointment.start_time,
    )? {
        tx.commit()?;
        return Ok(BookingRecord {
            client,
            appointment: existing,
            created: false,
        });
    }

    let hours = get_weekly_hours(&tx, &appointment.studio_id)?.for_date(appointment.appointment_date);
    let booked = list_booked_slots(
        &tx,
        &appointment.studio_id,
        &appointment.artist_id,
        appointment.appointment_date,
    )?;
    if !is_slot_available(&hours, appointment.duration, &booked, appointment.start_time) {
        return Err(AppError::Conflict("Selected time is not available".into()));
    }

    let (appointment, created) = insert_appointment_if_absent(&tx, &client.id, appointment)?;

    tx.commit()?;

    Ok(BookingRecord {
        client,
        appointment,
        created,
    })
}

// ============ Payments ============

/// A confirmed deposit payment and the booking it pays for.
#[derive(Debug, Clone)]
pub struct PaidBooking {
    pub studio_id: String,
    pub artist_id: String,
    pub service_id: String,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
    pub client: ClientDetails,
    pub notes: Option<String>,
    /// Amount the processor actually captured, in currency units
    pub amount_received: f64,
    /// Processor transaction id
    pub reference: String,
    pub card_brand: Option<String>,
    pub card_last4: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PaidBookingRecord {
    pub appointment: Appointment,
    pub appointment_created: bool,
    pub payment_recorded: bool,
}

/// Write client, appointment and payment for a confirmed deposit in one transaction.
///
/// Safe to repeat: the appointment is keyed by (studio, artist, client, date, time)
/// and the payment by its processor reference, so replays write nothing new.
pub fn record_paid_booking(conn: &mut Connection, input: &PaidBooking) -> Result<PaidBookingRecord> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let client = find_or_create_client(&tx, &input.studio_id, &input.client)?;

    let existing = find_appointment(
        &tx,
        &input.studio_id,
        &input.artist_id,
        &client.id,
        input.appointment_date,
        input.start_time,
    )?;

    let (appointment, appointment_created) = match existing {
        Some(appointment) => (appointment, false),
        None => {
            // The service may have changed or gone since the intent was created;
            // the booking still stands because the client has paid.
            let service = get_service_by_id(&tx, &input.service_id)?
                .filter(|s| s.studio_id == input.studio_id);
            let duration = service
                .as_ref()
                .map(Service::duration)
                .unwrap_or(DEFAULT_DURATION_MINUTES);

            // Paid, so it is kept either way; staff sort out any clash.
            let booked = list_booked_slots(
                &tx,
                &input.studio_id,
                &input.artist_id,
                input.appointment_date,
            )?;
            let clashes: Vec<&str> = overlapping(&booked, input.start_time, duration)
                .into_iter()
                .map(|b| b.id.as_str())
                .collect();

            let inserted = insert_appointment_if_absent(
                &tx,
                &client.id,
                &NewAppointment {
                    studio_id: input.studio_id.clone(),
                    artist_id: input.artist_id.clone(),
                    service_id: service.as_ref().map(|s| s.id.clone()),
                    appointment_date: input.appointment_date,
                    start_time: input.start_time,
                    duration,
                    price: service.as_ref().and_then(|s| s.price),
                    deposit_paid: input.amount_received,
                    payment_status: PaymentStatus::Paid,
                    payment_method: Some("card".to_string()),
                    notes: input.notes.clone(),
                },
            )?;

            if !clashes.is_empty() {
                tracing::warn!(
                    appointment = %inserted.0.id,
                    overlaps = ?clashes,
                    payment = %input.reference,
                    "Paid booking overlaps existing appointments"
                );
            }
            inserted
        }
    };

    let payment_recorded = insert_payment_if_absent(
        &tx,
        &NewPayment {
            appointment_id: appointment.id.clone(),
            studio_id: input.studio_id.clone(),
            amount: input.amount_received,
            status: "succeeded".to_string(),
            method: "card".to_string(),
            reference: input.reference.clone(),
            card_brand: input.card_brand.clone(),
            card_last4: input.card_last4.clone(),
        },
    )?;

    tx.commit()?;

    Ok(PaidBookingRecord {
        appointment,
        appointment_created,
        payment_recorded,
    })
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub appointment_id: String,
    pub studio_id: String,
    pub amount: f64,
    pub status: String,
    pub method: String,
    pub reference: String,
    pub card_brand: Option<String>,
    pub card_last4: Option<String>,
}

/// Insert a payment unless one with the same processor reference exists.
/// Returns true if this call wrote the row.
pub fn insert_payment_if_absent(conn: &Connection, input: &NewPayment) -> Result<bool> {
    let affected = conn.execute(
        "INSERT OR IGNORE INTO payments
            (id, appointment_id, studio_id, amount, status, method, reference,
             card_brand, card_last4, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            gen_id(),
            &input.appointment_id,
            &input.studio_id,
            input.amount,
            &input.status,
            &input.method,
            &input.reference,
            &input.card_brand,
            &input.card_last4,
            now()
        ],
    )?;
    Ok(affected > 0)
}

pub fn get_payment_by_reference(conn: &Connection, reference: &str) -> Result<Option<Payment>> {
    query_one(
        conn,
        &format!("SELECT {} FROM payments WHERE reference = ?1", PAYMENT_COLS),
        params![reference],
    )
}

pub fn list_payments_for_appointment(conn: &Connection, appointment_id: &str) -> Result<Vec<Payment>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM payments WHERE appointment_id = ?1 ORDER BY created_at",
            PAYMENT_COLS
        ),
        params![appointment_id],
    )
}

// ============ Webhook Event Deduplication ============

/// Atomically record a webhook event, returning true if this is a new event.
///
/// Uses INSERT OR IGNORE on the UNIQUE (provider, event_id) pair, so a
/// redelivered event is silently ignored and we return false.
pub fn try_record_webhook_event(conn: &Connection, provider: &str, event_id: &str) -> Result<bool> {
    let affected = conn.execute(
        "INSERT OR IGNORE INTO webhook_events (id, provider, event_id, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![gen_id(), provider, event_id, now()],
    )?;
    Ok(affected > 0)
}

/// Forget a recorded webhook event so the processor's retry can run again.
pub fn forget_webhook_event(conn: &Connection, provider: &str, event_id: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM webhook_events WHERE provider = ?1 AND event_id = ?2",
        params![provider, event_id],
    )?;
    Ok(())
}
