use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};

use crate::booking::{BookingMetadata, reconcile_payment};
use crate::db::{AppState, queries};
use crate::payments::{PaymentIntent, StripeWebhookEvent, verify_webhook_signature};

const PROVIDER: &str = "stripe";

/// Stripe's server-side notice that a deposit went through.
///
/// Backstop for clients that never reach `/booking-confirm` (closed tab,
/// lost connection). Both paths reconcile the same way, so whichever
/// arrives second changes nothing.
pub async fn handle_stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let Some(secret) = state.stripe_webhook_secret.as_deref() else {
        return (StatusCode::SERVICE_UNAVAILABLE, "Webhooks not configured");
    };

    let signature = match headers.get("stripe-signature") {
        Some(sig) => match sig.to_str() {
            Ok(s) => s.to_string(),
            Err(_) => return (StatusCode::BAD_REQUEST, "Invalid signature header"),
        },
        None => return (StatusCode::BAD_REQUEST, "Missing stripe-signature header"),
    };

    let now = chrono::Utc::now().timestamp();
    match verify_webhook_signature(&body, &signature, secret, now) {
        Ok(true) => {}
        Ok(false) => return (StatusCode::BAD_REQUEST, "Invalid signature"),
        Err(e) => {
            tracing::error!("Signature verification error: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Signature verification failed");
        }
    }

    let event: StripeWebhookEvent = match serde_json::from_slice(&body) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("Failed to parse Stripe webhook: {}", e);
            return (StatusCode::BAD_REQUEST, "Invalid JSON");
        }
    };

    match event.event_type.as_str() {
        "payment_intent.succeeded" => handle_payment_succeeded(state, &event).await,
        _ => (StatusCode::OK, "Event ignored"),
    }
}

async fn handle_payment_succeeded(
    state: AppState,
    event: &StripeWebhookEvent,
) -> (StatusCode, &'static str) {
    let intent: PaymentIntent = match serde_json::from_value(event.data.object.clone()) {
        Ok(i) => i,
        Err(e) => {
            tracing::error!("Failed to parse payment intent: {}", e);
            return (StatusCode::BAD_REQUEST, "Invalid payment intent");
        }
    };

    // Other products on the same Stripe account send these too
    let Some(studio_id) = BookingMetadata::studio_id_of(&intent.metadata) else {
        return (StatusCode::OK, "Not a booking payment");
    };

    {
        let conn = match state.db.get() {
            Ok(c) => c,
            Err(e) => {
                tracing::error!("DB connection error: {}", e);
                return (StatusCode::INTERNAL_SERVER_ERROR, "Database error");
            }
        };
        match queries::try_record_webhook_event(&conn, PROVIDER, &event.id) {
            Ok(true) => {}
            Ok(false) => return (StatusCode::OK, "Already processed"),
            Err(e) => {
                tracing::error!("DB error: {}", e);
                return (StatusCode::INTERNAL_SERVER_ERROR, "Database error");
            }
        }
    }

    match reconcile_payment(&state, studio_id, &intent.id).await {
        Ok(outcome) => {
            tracing::info!(
                event = %event.id,
                payment_intent = %intent.id,
                appointment = %outcome.appointment_id,
                "Stripe webhook: deposit reconciled"
            );
            (StatusCode::OK, "OK")
        }
        // Retrying won't fix bad metadata or an unknown studio
        Err(e) if e.status().is_client_error() => {
            tracing::warn!(
                event = %event.id,
                payment_intent = %intent.id,
                "Stripe webhook: payment not reconciled: {}",
                e
            );
            (StatusCode::OK, "Payment not reconciled")
        }
        Err(e) => {
            tracing::error!(
                event = %event.id,
                payment_intent = %intent.id,
                "Stripe webhook: reconciliation failed: {}",
                e
            );
            // Let Stripe's retry through the dedup check
            if let Ok(conn) = state.db.get() {
                if let Err(e) = queries::forget_webhook_event(&conn, PROVIDER, &event.id) {
                    tracing::error!("Failed to clear webhook event {}: {}", event.id, e);
                }
            }
            (StatusCode::INTERNAL_SERVER_ERROR, "Reconciliation failed")
        }
    }
}
