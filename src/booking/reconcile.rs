//! Turning a confirmed deposit payment into local booking records.
//!
//! Reached from two places that may both fire for the same payment: the
//! client's `/booking-confirm` call after card confirmation, and Stripe's
//! `payment_intent.succeeded` webhook. Every write is keyed so that repeats
//! are no-ops.

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::models::ClientDetails;
use crate::payments::{CardDetails, PaymentIntent, PaymentProcessor};

use super::metadata::BookingMetadata;

#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    pub appointment_id: String,
    /// False when an earlier reconciliation already created it
    pub appointment_created: bool,
    pub payment_recorded: bool,
}

/// Confirm `payment_intent_id` for `studio_id` and record the paid booking.
pub async fn reconcile_payment(
    state: &AppState,
    studio_id: &str,
    payment_intent_id: &str,
) -> Result<ReconcileOutcome> {
    let processor = state
        .payments
        .as_deref()
        .ok_or_else(|| AppError::Unavailable("Online payments are not configured".into()))?;

    let account_id = {
        let conn = state.db.get()?;
        let studio = queries::get_studio_by_id(&conn, studio_id)?
            .ok_or_else(|| AppError::NotFound("Studio not found".into()))?;
        studio
            .stripe_account_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AppError::BadRequest("Studio has no payment account".into()))?
    };

    let intent = retrieve_intent(processor, payment_intent_id, &account_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment not found".into()))?;

    if !intent.is_succeeded() {
        return Err(AppError::BadRequest("Payment not completed".into()));
    }

    let booking = BookingMetadata::from_stripe_metadata(&intent.metadata).map_err(|e| {
        tracing::warn!(
            payment_intent = %intent.id,
            studio = %studio_id,
            "Rejecting payment with incomplete booking metadata: {}",
            e
        );
        AppError::BadRequest(format!("Incomplete booking details: {}", e))
    })?;

    if booking.studio_id != studio_id {
        tracing::warn!(
            payment_intent = %intent.id,
            studio = %studio_id,
            intent_studio = %booking.studio_id,
            "Payment belongs to a different studio"
        );
        return Err(AppError::BadRequest("Payment does not belong to this studio".into()));
    }

    let card = lookup_card(processor, &intent, &account_id).await;

    let mut conn = state.db.get()?;
    let record = queries::record_paid_booking(
        &mut conn,
        &queries::PaidBooking {
            studio_id: booking.studio_id.clone(),
            artist_id: booking.artist_id.clone(),
            service_id: booking.service_id.clone(),
            appointment_date: booking.appointment_date,
            start_time: booking.start_time,
            client: ClientDetails {
                full_name: booking.client_name.clone().unwrap_or_default(),
                email: booking.client_email.clone(),
                phone: booking.client_phone.clone(),
            },
            notes: booking.notes.clone(),
            amount_received: intent.amount_received as f64 / 100.0,
            reference: intent.id.clone(),
            card_brand: card.as_ref().and_then(|c| c.brand.clone()),
            card_last4: card.as_ref().and_then(|c| c.last4.clone()),
        },
    )
    .inspect_err(|e| {
        // The charge has gone through; nothing is refunded automatically
        tracing::error!(
            payment_intent = %intent.id,
            studio = %studio_id,
            "Deposit captured but booking could not be recorded, needs manual reconciliation: {}",
            e
        );
    })?;

    if record.appointment_created || record.payment_recorded {
        tracing::info!(
            payment_intent = %intent.id,
            studio = %studio_id,
            appointment = %record.appointment.id,
            appointment_created = record.appointment_created,
            payment_recorded = record.payment_recorded,
            "Deposit reconciled"
        );
    } else {
        tracing::debug!(
            payment_intent = %intent.id,
            appointment = %record.appointment.id,
            "Deposit already reconciled"
        );
    }

    Ok(ReconcileOutcome {
        appointment_id: record.appointment.id,
        appointment_created: record.appointment_created,
        payment_recorded: record.payment_recorded,
    })
}

/// Look on the connected account first; some intents are only visible from the
/// platform account, so fall back there when the first lookup comes back empty.
async fn retrieve_intent(
    processor: &dyn PaymentProcessor,
    payment_intent_id: &str,
    account_id: &str,
) -> Result<Option<PaymentIntent>> {
    if let Some(intent) = processor
        .retrieve_payment_intent(payment_intent_id, Some(account_id))
        .await?
    {
        return Ok(Some(intent));
    }

    tracing::debug!(
        payment_intent = %payment_intent_id,
        account = %account_id,
        "Intent not visible on connected account, retrying on platform"
    );
    processor.retrieve_payment_intent(payment_intent_id, None).await
}

/// Best effort: a failed card lookup never blocks the booking.
async fn lookup_card(
    processor: &dyn PaymentProcessor,
    intent: &PaymentIntent,
    account_id: &str,
) -> Option<CardDetails> {
    let charge_id = intent.latest_charge.as_deref()?;
    match processor.card_details(charge_id, Some(account_id)).await {
        Ok(card) => card,
        Err(e) => {
            tracing::warn!(
                payment_intent = %intent.id,
                "Could not fetch card details: {}",
                e
            );
            None
        }
    }
}
