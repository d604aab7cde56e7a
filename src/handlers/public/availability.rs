use axum::extract::State;
use serde::{Deserialize, Serialize};

use super::reachable_studio;
use crate::booking::available_slots;
use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Query};
use crate::models::BookedSlot;
use crate::util::{format_time, parse_date};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub studio_id: String,
    pub artist_id: String,
    pub date: String,
    #[serde(default)]
    pub booking_slug: Option<String>,
}

/// Every appointment an artist has on a date, whatever its status.
///
/// Which statuses actually block a slot is the slot calculator's call, so
/// cancelled appointments are returned too.
pub async fn get_availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Vec<BookedSlot>>> {
    let date = parse_date(&query.date)
        .ok_or_else(|| AppError::BadRequest("date must be YYYY-MM-DD".into()))?;

    let conn = state.db.get()?;
    let studio = reachable_studio(&conn, &query.studio_id, query.booking_slug.as_deref())?;

    let booked = queries::list_booked_slots(&conn, &studio.id, &query.artist_id, date)?;
    Ok(Json(booked))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotsQuery {
    pub studio_id: String,
    #[serde(default)]
    pub booking_slug: Option<String>,
    pub artist_id: String,
    pub service_id: String,
    pub date: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotsResponse {
    pub date: String,
    pub duration_minutes: i32,
    /// `HH:MM` start times
    pub slots: Vec<String>,
}

/// Bookable start times for a service with an artist on a date.
pub async fn get_slots(
    State(state): State<AppState>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<SlotsResponse>> {
    let date = parse_date(&query.date)
        .ok_or_else(|| AppError::BadRequest("date must be YYYY-MM-DD".into()))?;

    let conn = state.db.get()?;
    let studio = reachable_studio(&conn, &query.studio_id, query.booking_slug.as_deref())?;

    let artist = queries::get_artist_by_id(&conn, &query.artist_id)?
        .filter(|a| a.studio_id == studio.id && a.is_active())
        .ok_or_else(|| AppError::NotFound("Artist not found".into()))?;

    let service = queries::get_service_by_id(&conn, &query.service_id)?
        .filter(|s| s.studio_id == studio.id)
        .ok_or_else(|| AppError::NotFound("Service not found".into()))?;

    let hours = queries::get_weekly_hours(&conn, &studio.id)?.for_date(date);
    let booked = queries::list_booked_slots(&conn, &studio.id, &artist.id, date)?;

    let slots = available_slots(&hours, service.duration(), &booked)
        .into_iter()
        .map(format_time)
        .collect();

    Ok(Json(SlotsResponse {
        date: date.format("%Y-%m-%d").to_string(),
        duration_minutes: service.duration(),
        slots,
    }))
}
