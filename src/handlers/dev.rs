use axum::{Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::models::{CreateArtist, CreateService, CreateStudio, SetBusinessHours};
use crate::util::parse_time;

#[derive(Debug, Deserialize)]
pub struct DevHours {
    /// 0 = Sunday .. 6 = Saturday
    pub weekday: u8,
    /// "HH:MM"
    #[serde(default)]
    pub open: Option<String>,
    #[serde(default)]
    pub close: Option<String>,
    #[serde(default)]
    pub closed: bool,
}

#[derive(Debug, Deserialize)]
pub struct DevCreateStudio {
    #[serde(flatten)]
    pub studio: CreateStudio,
    pub booking_slug: String,
    /// Omitted weekdays use the default week
    #[serde(default)]
    pub hours: Vec<DevHours>,
    #[serde(default)]
    pub artists: Vec<CreateArtist>,
    #[serde(default)]
    pub services: Vec<CreateService>,
}

#[derive(Debug, Serialize)]
pub struct DevStudioCreated {
    pub studio_id: String,
    pub booking_slug: String,
    /// Public booking page aggregate for this studio
    pub booking_page: String,
    pub artist_ids: Vec<String>,
    pub service_ids: Vec<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/dev/studios", post(create_dev_studio))
}

/// Seed a bookable studio in one call. Only mounted in dev mode.
pub async fn create_dev_studio(
    State(state): State<AppState>,
    Json(input): Json<DevCreateStudio>,
) -> Result<Json<DevStudioCreated>> {
    let slug = input.booking_slug.trim();
    if slug.is_empty() || input.studio.name.trim().is_empty() {
        return Err(AppError::BadRequest("name and booking_slug are required".into()));
    }

    let hours = input
        .hours
        .iter()
        .map(|h| {
            let time = |value: &Option<String>| match value.as_deref() {
                Some(v) => parse_time(v)
                    .map(Some)
                    .ok_or_else(|| AppError::BadRequest(format!("Invalid time: {}", v))),
                None => Ok(None),
            };
            Ok(SetBusinessHours {
                weekday: h.weekday,
                open_time: time(&h.open)?,
                close_time: time(&h.close)?,
                is_closed: h.closed,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut conn = state.db.get()?;
    let tx = conn.transaction()?;

    let studio = queries::create_studio(&tx, &input.studio)?;
    for day in &hours {
        queries::set_business_hours(&tx, &studio.id, day)?;
    }
    let link = queries::create_booking_link(&tx, &studio.id, slug, true)?;

    let artist_ids = input
        .artists
        .iter()
        .map(|a| queries::create_artist(&tx, &studio.id, a).map(|a| a.id))
        .collect::<Result<Vec<_>>>()?;
    let service_ids = input
        .services
        .iter()
        .map(|s| queries::create_service(&tx, &studio.id, s).map(|s| s.id))
        .collect::<Result<Vec<_>>>()?;

    tx.commit()?;

    tracing::info!(
        "DEV: Created studio {} ({}) with {} artists and {} services",
        studio.name,
        studio.id,
        artist_ids.len(),
        service_ids.len()
    );

    Ok(Json(DevStudioCreated {
        booking_page: format!(
            "/booking/{}/{}",
            studio.id,
            urlencoding::encode(&link.booking_slug)
        ),
        studio_id: studio.id,
        booking_slug: link.booking_slug,
        artist_ids,
        service_ids,
    }))
}
