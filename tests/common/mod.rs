//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::Value;
use tower::ServiceExt;

pub use inkbook::db::{AppState, DbPool, queries};
pub use inkbook::models::*;

use inkbook::error::{AppError, Result};
use inkbook::payments::{CardDetails, CreatePaymentIntent, PaymentIntent, PaymentProcessor};

pub const TEST_BASE_URL: &str = "http://localhost:5173";
pub const TEST_ACCOUNT: &str = "acct_test_studio";
pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_secret";

/// 2026-11-02 is a Monday, open 10:00-18:00 in the default week.
pub const MONDAY: &str = "2026-11-02";

// ============ App State ============

pub fn create_test_pool() -> DbPool {
    let pool = inkbook::db::create_pool(":memory:").unwrap();
    {
        let conn = pool.get().unwrap();
        inkbook::db::init_db(&conn).unwrap();
    }
    pool
}

/// State with no payment processor, no webhook secret and no rate limit.
pub fn create_test_app_state() -> AppState {
    AppState {
        db: create_test_pool(),
        base_url: TEST_BASE_URL.to_string(),
        payments: None,
        stripe_webhook_secret: None,
        rate_limiter: None,
        trust_proxy_headers: false,
    }
}

/// State wired to a fake processor and a webhook secret.
pub fn create_payment_app_state() -> (AppState, Arc<FakeProcessor>) {
    let processor = Arc::new(FakeProcessor::default());
    let state = AppState {
        payments: Some(processor.clone() as Arc<dyn PaymentProcessor>),
        stripe_webhook_secret: Some(TEST_WEBHOOK_SECRET.to_string()),
        ..create_test_app_state()
    };
    (state, processor)
}

pub fn public_app(state: AppState) -> Router {
    inkbook::handlers::router(state, false)
}

pub fn dev_app(state: AppState) -> Router {
    inkbook::handlers::router(state, true)
}

// ============ Requests ============

pub async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read_json(response).await
}

pub async fn post_json(app: Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    read_json(response).await
}

pub async fn read_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

// ============ Fixtures ============

pub struct TestStudio {
    pub studio: Studio,
    pub link: BookingLink,
    pub artist: Artist,
    pub service: Service,
}

pub fn studio_input(name: &str) -> CreateStudio {
    CreateStudio {
        name: name.to_string(),
        allow_online_booking: true,
        require_deposit: false,
        deposit_amount: 0.0,
        deposit_percentage: false,
        stripe_account_id: None,
        currency: None,
        timezone: Some("America/New_York".to_string()),
    }
}

/// A studio that takes a 20% deposit on its connected account.
pub fn deposit_studio_input(name: &str) -> CreateStudio {
    CreateStudio {
        require_deposit: true,
        deposit_amount: 20.0,
        deposit_percentage: true,
        stripe_account_id: Some(TEST_ACCOUNT.to_string()),
        ..studio_input(name)
    }
}

/// Studio with an active "book" link, one active artist and a 60 minute, $200 service.
pub fn create_test_studio(conn: &rusqlite::Connection, input: &CreateStudio) -> TestStudio {
    let studio = queries::create_studio(conn, input).unwrap();
    let link = queries::create_booking_link(conn, &studio.id, "book", true).unwrap();
    let artist = create_test_artist(conn, &studio.id, "Mara", ArtistStatus::Active);
    let service = create_test_service(conn, &studio.id, "Fine line piece", Some(200.0), Some(60));
    TestStudio {
        studio,
        link,
        artist,
        service,
    }
}

pub fn create_test_artist(
    conn: &rusqlite::Connection,
    studio_id: &str,
    name: &str,
    status: ArtistStatus,
) -> Artist {
    queries::create_artist(
        conn,
        studio_id,
        &CreateArtist {
            name: name.to_string(),
            status: Some(status),
            specialty: Some("Fine line".to_string()),
            hourly_rate: Some(150.0),
        },
    )
    .unwrap()
}

pub fn create_test_service(
    conn: &rusqlite::Connection,
    studio_id: &str,
    name: &str,
    price: Option<f64>,
    duration_minutes: Option<i32>,
) -> Service {
    queries::create_service(
        conn,
        studio_id,
        &CreateService {
            name: name.to_string(),
            price,
            duration_minutes,
        },
    )
    .unwrap()
}

pub fn date(value: &str) -> chrono::NaiveDate {
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
}

pub fn time(value: &str) -> chrono::NaiveTime {
    chrono::NaiveTime::parse_from_str(value, "%H:%M").unwrap()
}

pub fn client_details(email: &str) -> ClientDetails {
    ClientDetails {
        full_name: "Existing Client".to_string(),
        email: email.to_string(),
        phone: None,
    }
}

/// An unpaid appointment with the fixture's artist and service on MONDAY.
pub fn new_appointment(fixture: &TestStudio, start: &str) -> NewAppointment {
    NewAppointment {
        studio_id: fixture.studio.id.clone(),
        artist_id: fixture.artist.id.clone(),
        service_id: Some(fixture.service.id.clone()),
        appointment_date: date(MONDAY),
        start_time: time(start),
        duration: fixture.service.duration(),
        price: fixture.service.price,
        deposit_paid: 0.0,
        payment_status: PaymentStatus::Unpaid,
        payment_method: None,
        notes: None,
    }
}

/// Insert an appointment directly, bypassing the booking flow.
pub fn create_test_appointment(
    conn: &mut rusqlite::Connection,
    fixture: &TestStudio,
    email: &str,
    start: &str,
    duration: i32,
) -> Appointment {
    let appointment = NewAppointment {
        duration,
        ..new_appointment(fixture, start)
    };
    queries::create_booking(conn, &client_details(email), &appointment)
        .unwrap()
        .appointment
}

pub fn booking_request(fixture: &TestStudio, email: &str, start: &str) -> Value {
    serde_json::json!({
        "studioId": fixture.studio.id,
        "bookingSlug": fixture.link.booking_slug,
        "artistId": fixture.artist.id,
        "serviceId": fixture.service.id,
        "appointmentDate": MONDAY,
        "startTime": start,
        "client": {
            "full_name": "Jane Doe",
            "email": email,
            "phone": "555-0100"
        },
        "notes": "Rose on the left forearm"
    })
}

pub fn count_rows(conn: &rusqlite::Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
        .unwrap()
}

// ============ Fake payment processor ============

/// In-memory stand-in for Stripe.
#[derive(Default)]
pub struct FakeProcessor {
    intents: Mutex<HashMap<String, PaymentIntent>>,
    requests: Mutex<Vec<CreatePaymentIntent>>,
    counter: AtomicUsize,
    /// Intents can't be seen through the connected account, only the platform
    pub hide_from_connected_account: AtomicBool,
    pub fail_card_lookup: AtomicBool,
}

impl FakeProcessor {
    pub fn requests(&self) -> Vec<CreatePaymentIntent> {
        self.requests.lock().unwrap().clone()
    }

    pub fn intent(&self, id: &str) -> Option<PaymentIntent> {
        self.intents.lock().unwrap().get(id).cloned()
    }

    pub fn insert_intent(&self, intent: PaymentIntent) {
        self.intents.lock().unwrap().insert(intent.id.clone(), intent);
    }

    /// Simulate the client confirming the card payment.
    pub fn succeed(&self, id: &str) {
        let mut intents = self.intents.lock().unwrap();
        let intent = intents.get_mut(id).expect("unknown intent");
        intent.status = "succeeded".to_string();
        intent.amount_received = intent.amount;
        intent.latest_charge = Some(format!("ch_{}", id));
    }
}

#[async_trait]
impl PaymentProcessor for FakeProcessor {
    async fn create_payment_intent(&self, request: &CreatePaymentIntent) -> Result<PaymentIntent> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("pi_test_{}", n);
        let intent = PaymentIntent {
            id: id.clone(),
            status: "requires_payment_method".to_string(),
            amount: request.amount,
            amount_received: 0,
            currency: request.currency.clone(),
            client_secret: Some(format!("{}_secret_abc", id)),
            metadata: request.metadata.clone(),
            latest_charge: None,
        };
        self.requests.lock().unwrap().push(request.clone());
        self.insert_intent(intent.clone());
        Ok(intent)
    }

    async fn retrieve_payment_intent(
        &self,
        id: &str,
        account_id: Option<&str>,
    ) -> Result<Option<PaymentIntent>> {
        if account_id.is_some() && self.hide_from_connected_account.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(self.intent(id))
    }

    async fn card_details(
        &self,
        _charge_id: &str,
        _account_id: Option<&str>,
    ) -> Result<Option<CardDetails>> {
        if self.fail_card_lookup.load(Ordering::SeqCst) {
            return Err(AppError::Internal("card lookup failed".into()));
        }
        Ok(Some(CardDetails {
            brand: Some("visa".to_string()),
            last4: Some("4242".to_string()),
        }))
    }
}
