use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::booking::reconcile_payment;
use crate::db::AppState;
use crate::error::{AppError, Result};
use crate::extractors::Json;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmBookingRequest {
    pub payment_intent_id: String,
    pub studio_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmBookingResponse {
    pub ok: bool,
    pub appointment_id: String,
}

/// Called by the booking page once the card payment has been confirmed.
/// Safe to repeat, and safe to race the payment webhook.
pub async fn confirm_booking(
    State(state): State<AppState>,
    Json(request): Json<ConfirmBookingRequest>,
) -> Result<Json<ConfirmBookingResponse>> {
    let payment_intent_id = request.payment_intent_id.trim();
    let studio_id = request.studio_id.trim();
    if payment_intent_id.is_empty() || studio_id.is_empty() {
        return Err(AppError::BadRequest(
            "paymentIntentId and studioId are required".into(),
        ));
    }

    let outcome = reconcile_payment(&state, studio_id, payment_intent_id).await?;

    Ok(Json(ConfirmBookingResponse {
        ok: true,
        appointment_id: outcome.appointment_id,
    }))
}
