use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use super::bookable_studio;
use crate::db::{AppState, queries};
use crate::error::Result;
use crate::extractors::Json;
use crate::models::{Artist, BookingLink, PublicStudio, Service};
use crate::util::format_time;

#[derive(Debug, Deserialize)]
pub struct BookingPagePath {
    pub studio_id: String,
    pub booking_slug: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayHoursView {
    /// 0 = Sunday
    pub weekday: u8,
    pub closed: bool,
    pub open: Option<String>,
    pub close: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPageResponse {
    pub booking_link: BookingLink,
    pub studio: PublicStudio,
    pub artists: Vec<Artist>,
    pub services: Vec<Service>,
    pub hours: Vec<DayHoursView>,
}

/// Everything the public booking page renders: studio, active artists, services, hours.
pub async fn get_booking_page(
    State(state): State<AppState>,
    Path(path): Path<BookingPagePath>,
) -> Result<Json<BookingPageResponse>> {
    let conn = state.db.get()?;
    let (studio, link) = bookable_studio(&conn, &path.studio_id, &path.booking_slug)?;

    let artists = queries::list_active_artists(&conn, &studio.id)?;
    let services = queries::list_services(&conn, &studio.id)?;
    let week = queries::get_weekly_hours(&conn, &studio.id)?;

    let hours = week
        .days()
        .iter()
        .enumerate()
        .map(|(weekday, day)| DayHoursView {
            weekday: weekday as u8,
            closed: day.closed,
            open: (!day.closed).then(|| format_time(day.open)),
            close: (!day.closed).then(|| format_time(day.close)),
        })
        .collect();

    Ok(Json(BookingPageResponse {
        booking_link: link,
        studio: PublicStudio::from(&studio),
        artists,
        services,
        hours,
    }))
}
