//! Tests for the read side of the public booking flow:
//! GET /availability, GET /slots, GET /booking/{studio_id}/{booking_slug}, GET /health.

use axum::http::StatusCode;

mod common;
use common::*;

fn availability_uri(fixture: &TestStudio, date: &str) -> String {
    format!(
        "/availability?studioId={}&artistId={}&date={}",
        fixture.studio.id, fixture.artist.id, date
    )
}

fn slots_uri(fixture: &TestStudio, date: &str) -> String {
    format!(
        "/slots?studioId={}&bookingSlug={}&artistId={}&serviceId={}&date={}",
        fixture.studio.id, fixture.link.booking_slug, fixture.artist.id, fixture.service.id, date
    )
}

fn slot_strings(json: &serde_json::Value) -> Vec<String> {
    json["slots"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s.as_str().unwrap().to_string())
        .collect()
}

// ============ GET /availability ============

#[tokio::test]
async fn test_availability_lists_artist_appointments_for_date() {
    let state = create_test_app_state();
    let fixture = {
        let mut conn = state.db.get().unwrap();
        let fixture = create_test_studio(&conn, &studio_input("Black Lotus"));
        create_test_appointment(&mut conn, &fixture, "existing@example.com", "14:00", 60);
        fixture
    };

    let (status, json) = get_json(public_app(state), &availability_uri(&fixture, MONDAY)).await;

    assert_eq!(status, StatusCode::OK);
    let slots = json.as_array().unwrap();
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0]["start_time"], "14:00:00");
    assert_eq!(slots[0]["duration"], 60);
    assert_eq!(slots[0]["status"], "pending");
}

#[tokio::test]
async fn test_availability_other_date_is_empty() {
    let state = create_test_app_state();
    let fixture = {
        let mut conn = state.db.get().unwrap();
        let fixture = create_test_studio(&conn, &studio_input("Black Lotus"));
        create_test_appointment(&mut conn, &fixture, "existing@example.com", "14:00", 60);
        fixture
    };

    let (status, json) = get_json(public_app(state), &availability_uri(&fixture, "2026-11-03")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_availability_without_active_link_is_not_found() {
    let state = create_test_app_state();
    let fixture = {
        let conn = state.db.get().unwrap();
        let fixture = create_test_studio(&conn, &studio_input("Black Lotus"));
        queries::set_booking_link_active(&conn, &fixture.link.id, false).unwrap();
        fixture
    };

    let (status, _) = get_json(public_app(state), &availability_uri(&fixture, MONDAY)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_availability_rejects_malformed_date() {
    let state = create_test_app_state();
    let fixture = {
        let conn = state.db.get().unwrap();
        create_test_studio(&conn, &studio_input("Black Lotus"))
    };

    let (status, json) = get_json(public_app(state), &availability_uri(&fixture, "11/02/2026")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("date"));
}

#[tokio::test]
async fn test_availability_missing_params_is_bad_request() {
    let state = create_test_app_state();
    let (status, json) = get_json(public_app(state), "/availability?studioId=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

// ============ GET /slots ============

#[tokio::test]
async fn test_slots_skip_overlapping_appointment() {
    let state = create_test_app_state();
    let fixture = {
        let mut conn = state.db.get().unwrap();
        let fixture = create_test_studio(&conn, &studio_input("Black Lotus"));
        create_test_appointment(&mut conn, &fixture, "existing@example.com", "14:00", 60);
        fixture
    };

    let (status, json) = get_json(public_app(state), &slots_uri(&fixture, MONDAY)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["date"], MONDAY);
    assert_eq!(json["durationMinutes"], 60);

    let slots = slot_strings(&json);
    assert_eq!(slots.first().map(String::as_str), Some("10:00"));
    assert_eq!(slots.last().map(String::as_str), Some("17:00"));
    for taken in ["13:30", "14:00", "14:30"] {
        assert!(!slots.contains(&taken.to_string()), "{} should be taken", taken);
    }
    assert!(slots.contains(&"13:00".to_string()));
    assert!(slots.contains(&"15:00".to_string()));
    assert_eq!(slots.len(), 12);
}

#[tokio::test]
async fn test_slots_ignore_cancelled_appointment() {
    let state = create_test_app_state();
    let fixture = {
        let mut conn = state.db.get().unwrap();
        let fixture = create_test_studio(&conn, &studio_input("Black Lotus"));
        let appt = create_test_appointment(&mut conn, &fixture, "existing@example.com", "14:00", 60);
        conn.execute(
            "UPDATE appointments SET status = 'cancelled' WHERE id = ?1",
            [&appt.id],
        )
        .unwrap();
        fixture
    };

    let (status, json) = get_json(public_app(state), &slots_uri(&fixture, MONDAY)).await;

    assert_eq!(status, StatusCode::OK);
    let slots = slot_strings(&json);
    assert!(slots.contains(&"14:00".to_string()));
    assert_eq!(slots.len(), 15);
}

#[tokio::test]
async fn test_slots_follow_configured_hours() {
    let state = create_test_app_state();
    let fixture = {
        let conn = state.db.get().unwrap();
        let fixture = create_test_studio(&conn, &studio_input("Black Lotus"));
        // Monday 12:00-15:00
        queries::set_business_hours(
            &conn,
            &fixture.studio.id,
            &SetBusinessHours {
                weekday: 1,
                open_time: Some(time("12:00")),
                close_time: Some(time("15:00")),
                is_closed: false,
            },
        )
        .unwrap();
        fixture
    };

    let (_, json) = get_json(public_app(state), &slots_uri(&fixture, MONDAY)).await;
    assert_eq!(
        slot_strings(&json),
        vec!["12:00", "12:30", "13:00", "13:30", "14:00"]
    );
}

#[tokio::test]
async fn test_slots_closed_day_is_empty() {
    let state = create_test_app_state();
    let fixture = {
        let conn = state.db.get().unwrap();
        create_test_studio(&conn, &studio_input("Black Lotus"))
    };

    // Sunday is closed in the default week
    let (status, json) = get_json(public_app(state), &slots_uri(&fixture, "2026-11-01")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(slot_strings(&json).is_empty());
}

#[tokio::test]
async fn test_slots_inactive_artist_is_not_found() {
    let state = create_test_app_state();
    let fixture = {
        let conn = state.db.get().unwrap();
        let mut fixture = create_test_studio(&conn, &studio_input("Black Lotus"));
        fixture.artist =
            create_test_artist(&conn, &fixture.studio.id, "On Leave", ArtistStatus::Inactive);
        fixture
    };

    let (status, _) = get_json(public_app(state), &slots_uri(&fixture, MONDAY)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_slots_service_from_other_studio_is_not_found() {
    let state = create_test_app_state();
    let fixture = {
        let conn = state.db.get().unwrap();
        let mut fixture = create_test_studio(&conn, &studio_input("Black Lotus"));
        let other = create_test_studio(&conn, &studio_input("Other Studio"));
        fixture.service = other.service;
        fixture
    };

    let (status, _) = get_json(public_app(state), &slots_uri(&fixture, MONDAY)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============ GET /booking/{studio_id}/{booking_slug} ============

#[tokio::test]
async fn test_booking_page_aggregates_public_studio_data() {
    let state = create_test_app_state();
    let fixture = {
        let conn = state.db.get().unwrap();
        let fixture = create_test_studio(&conn, &deposit_studio_input("Black Lotus"));
        create_test_artist(&conn, &fixture.studio.id, "On Leave", ArtistStatus::Inactive);
        fixture
    };

    let uri = format!("/booking/{}/{}", fixture.studio.id, fixture.link.booking_slug);
    let (status, json) = get_json(public_app(state), &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["bookingLink"]["booking_slug"], "book");
    assert_eq!(json["studio"]["name"], "Black Lotus");
    assert_eq!(json["studio"]["acceptsDeposits"], true);
    assert!(
        !json.to_string().contains(TEST_ACCOUNT),
        "connected account id must not be exposed"
    );

    let artists = json["artists"].as_array().unwrap();
    assert_eq!(artists.len(), 1);
    assert_eq!(artists[0]["name"], "Mara");

    assert_eq!(json["services"].as_array().unwrap().len(), 1);

    let hours = json["hours"].as_array().unwrap();
    assert_eq!(hours.len(), 7);
    assert_eq!(hours[0]["closed"], true);
    assert_eq!(hours[1]["open"], "10:00");
    assert_eq!(hours[1]["close"], "18:00");
}

#[tokio::test]
async fn test_booking_page_unknown_slug_is_not_found() {
    let state = create_test_app_state();
    let fixture = {
        let conn = state.db.get().unwrap();
        create_test_studio(&conn, &studio_input("Black Lotus"))
    };

    let uri = format!("/booking/{}/nope", fixture.studio.id);
    let (status, _) = get_json(public_app(state), &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_booking_page_online_booking_disabled_is_not_found() {
    let state = create_test_app_state();
    let fixture = {
        let conn = state.db.get().unwrap();
        let input = CreateStudio {
            allow_online_booking: false,
            ..studio_input("Walk-ins Only")
        };
        create_test_studio(&conn, &input)
    };

    let uri = format!("/booking/{}/{}", fixture.studio.id, fixture.link.booking_slug);
    let (status, _) = get_json(public_app(state), &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health() {
    let (status, json) = get_json(public_app(create_test_app_state()), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}
