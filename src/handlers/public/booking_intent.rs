use axum::extract::State;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::bookable_studio;
use crate::booking::{BookingMetadata, DepositDecision, is_slot_available, to_minor_units};
use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::models::{ClientDetails, NewAppointment, PaymentStatus, Service, Studio};
use crate::payments::CreatePaymentIntent;
use crate::util::{append_query_params, is_plausible_email, normalize_email, parse_date, parse_time};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingIntentRequest {
    pub studio_id: String,
    pub booking_slug: String,
    pub artist_id: String,
    pub service_id: String,
    pub appointment_date: String,
    pub start_time: String,
    pub client: ClientDetails,
    #[serde(default)]
    pub notes: Option<String>,
}

/// No deposit needed: the appointment exists and the client goes straight to confirmation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectBookingResponse {
    pub checkout_url: String,
    pub appointment_id: String,
}

/// Deposit needed: the client confirms this intent with the processor, then
/// calls `/booking-confirm`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositIntentResponse {
    pub client_secret: String,
    pub payment_intent_id: String,
    /// Whole currency units
    pub deposit_amount: i64,
    pub currency: String,
    pub service_name: String,
    pub service_price: Option<f64>,
    pub duration_minutes: i32,
    /// Needed by the client-side payment widget to confirm on the right account
    pub connected_account_id: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum BookingIntentResponse {
    Direct(DirectBookingResponse),
    Deposit(DepositIntentResponse),
}

/// Request fields after validation, before anything is looked up.
struct ValidBooking {
    date: NaiveDate,
    start_time: NaiveTime,
    client: ClientDetails,
    notes: Option<String>,
}

fn validate(request: &BookingIntentRequest) -> Result<ValidBooking> {
    let email = normalize_email(&request.client.email);
    if email.is_empty() {
        return Err(AppError::BadRequest("Client email is required".into()));
    }
    if !is_plausible_email(&email) {
        return Err(AppError::BadRequest("Client email is invalid".into()));
    }
    if request.service_id.trim().is_empty() || request.artist_id.trim().is_empty() {
        return Err(AppError::BadRequest("Artist and service are required".into()));
    }

    let date = parse_date(&request.appointment_date)
        .ok_or_else(|| AppError::BadRequest("appointmentDate must be YYYY-MM-DD".into()))?;
    let start_time = parse_time(&request.start_time)
        .ok_or_else(|| AppError::BadRequest("startTime must be HH:MM".into()))?;

    Ok(ValidBooking {
        date,
        start_time,
        client: ClientDetails {
            full_name: request.client.full_name.trim().to_string(),
            email,
            phone: request
                .client
                .phone
                .as_ref()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
        },
        notes: request
            .notes
            .as_ref()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
    })
}

/// Everything needed to open a deposit payment once the database work is done.
struct PendingDeposit {
    studio: Studio,
    service: Service,
    amount: i64,
    account_id: String,
}

/// Validate a booking and either book it directly or open a deposit payment.
///
/// On the deposit path nothing is written locally: the booking travels as
/// payment intent metadata until the payment is confirmed, so abandoned
/// checkouts leave no pending appointments behind.
pub async fn create_booking_intent(
    State(state): State<AppState>,
    Json(request): Json<BookingIntentRequest>,
) -> Result<Json<BookingIntentResponse>> {
    let booking = validate(&request)?;

    let pending = {
        let mut conn = state.db.get()?;

        let (studio, link) = bookable_studio(&conn, &request.studio_id, &request.booking_slug)?;

        let service = queries::get_service_by_id(&conn, &request.service_id)?
            .filter(|s| s.studio_id == studio.id)
            .ok_or_else(|| AppError::NotFound("Service not found".into()))?;

        let artist = queries::get_artist_by_id(&conn, &request.artist_id)?
            .filter(|a| a.studio_id == studio.id && a.is_active())
            .ok_or_else(|| AppError::NotFound("Artist not found".into()))?;

        let hours = queries::get_weekly_hours(&conn, &studio.id)?.for_date(booking.date);
        let booked = queries::list_booked_slots(&conn, &studio.id, &artist.id, booking.date)?;
        if !is_slot_available(&hours, service.duration(), &booked, booking.start_time) {
            return Err(AppError::Conflict(
                "Selected time is not available".into(),
            ));
        }

        match DepositDecision::for_studio(&studio, &service) {
            DepositDecision::None => {
                if studio.require_deposit && !studio.has_payment_account() {
                    tracing::warn!(
                        studio = %studio.id,
                        "Studio requires deposits but has no payment account, booking without deposit"
                    );
                }

                let record = queries::create_booking(
                    &mut conn,
                    &booking.client,
                    &NewAppointment {
                        studio_id: studio.id.clone(),
                        artist_id: artist.id.clone(),
                        service_id: Some(service.id.clone()),
                        appointment_date: booking.date,
                        start_time: booking.start_time,
                        duration: service.duration(),
                        price: service.price,
                        deposit_paid: 0.0,
                        payment_status: PaymentStatus::Unpaid,
                        payment_method: None,
                        notes: booking.notes.clone(),
                    },
                )?;

                tracing::info!(
                    studio = %studio.id,
                    appointment = %record.appointment.id,
                    client = %record.client.id,
                    created = record.created,
                    "Direct booking"
                );

                let success_page = format!(
                    "{}/book/{}/success",
                    state.base_url,
                    urlencoding::encode(&link.booking_slug)
                );
                let checkout_url = append_query_params(
                    &success_page,
                    &[
                        ("studio", studio.id.as_str()),
                        ("appointment", record.appointment.id.as_str()),
                    ],
                );

                return Ok(Json(BookingIntentResponse::Direct(DirectBookingResponse {
                    checkout_url,
                    appointment_id: record.appointment.id,
                })));
            }
            DepositDecision::Required { amount, account_id } => PendingDeposit {
                studio,
                service,
                amount,
                account_id,
            },
        }
    };

    let processor = state
        .payments
        .as_deref()
        .ok_or_else(|| AppError::Unavailable("Online payments are not configured".into()))?;

    let metadata = BookingMetadata {
        studio_id: pending.studio.id.clone(),
        booking_slug: Some(request.booking_slug.clone()),
        artist_id: request.artist_id.clone(),
        service_id: pending.service.id.clone(),
        appointment_date: booking.date,
        start_time: booking.start_time,
        client_email: booking.client.email.clone(),
        client_name: Some(booking.client.full_name.clone()),
        client_phone: booking.client.phone.clone(),
        notes: booking.notes.clone(),
    }
    .to_stripe_metadata()
    .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let intent = processor
        .create_payment_intent(&CreatePaymentIntent {
            amount: to_minor_units(pending.amount),
            currency: pending.studio.currency.clone(),
            account_id: pending.account_id.clone(),
            metadata,
            description: Some(format!(
                "Deposit for {} at {}",
                pending.service.name, pending.studio.name
            )),
            receipt_email: Some(booking.client.email.clone()),
        })
        .await?;

    let client_secret = intent
        .client_secret
        .clone()
        .ok_or_else(|| AppError::Internal("Payment intent has no client secret".into()))?;

    tracing::info!(
        studio = %pending.studio.id,
        payment_intent = %intent.id,
        deposit = pending.amount,
        "Deposit payment intent created"
    );

    Ok(Json(BookingIntentResponse::Deposit(DepositIntentResponse {
        client_secret,
        payment_intent_id: intent.id,
        deposit_amount: pending.amount,
        currency: pending.studio.currency,
        service_name: pending.service.name.clone(),
        service_price: pending.service.price,
        duration_minutes: pending.service.duration(),
        connected_account_id: pending.account_id,
    })))
}
