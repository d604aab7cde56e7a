mod availability;
mod booking_confirm;
mod booking_intent;
mod booking_page;

pub use availability::*;
pub use booking_confirm::*;
pub use booking_intent::*;
pub use booking_page::*;

use axum::{
    Json, Router, middleware,
    routing::{get, post},
};
use rusqlite::Connection;
use serde::Serialize;

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::middleware::booking_rate_limit;
use crate::models::{BookingLink, Studio};

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router(state: AppState) -> Router<AppState> {
    // Writes are rate limited per client IP
    let booking_routes = Router::new()
        .route("/booking-intent", post(create_booking_intent))
        .route("/booking-confirm", post(confirm_booking))
        .layer(middleware::from_fn_with_state(state, booking_rate_limit));

    Router::new()
        .route("/health", get(health))
        .route("/availability", get(get_availability))
        .route("/slots", get(get_slots))
        .route("/booking/{studio_id}/{booking_slug}", get(get_booking_page))
        .merge(booking_routes)
}

/// Resolve a studio through one of its booking links.
///
/// A missing or inactive link, a link for another studio, or a studio that
/// has switched off online booking all look the same to the caller: not found.
pub(crate) fn bookable_studio(
    conn: &Connection,
    studio_id: &str,
    booking_slug: &str,
) -> Result<(Studio, BookingLink)> {
    let link = queries::get_booking_link(conn, studio_id, booking_slug)?
        .filter(|link| link.is_active && link.studio_id == studio_id)
        .ok_or_else(|| AppError::NotFound("Booking page not found".into()))?;

    let studio = queries::get_studio_by_id(conn, studio_id)?
        .filter(|studio| studio.allow_online_booking)
        .ok_or_else(|| AppError::NotFound("Studio not found".into()))?;

    Ok((studio, link))
}

/// Like `bookable_studio`, for callers that may not know the slug: any active
/// link makes the studio reachable.
pub(crate) fn reachable_studio(
    conn: &Connection,
    studio_id: &str,
    booking_slug: Option<&str>,
) -> Result<Studio> {
    if let Some(slug) = booking_slug.filter(|s| !s.is_empty()) {
        return bookable_studio(conn, studio_id, slug).map(|(studio, _)| studio);
    }

    if !queries::has_active_booking_link(conn, studio_id)? {
        return Err(AppError::NotFound("Booking page not found".into()));
    }

    queries::get_studio_by_id(conn, studio_id)?
        .filter(|studio| studio.allow_online_booking)
        .ok_or_else(|| AppError::NotFound("Studio not found".into()))
}
