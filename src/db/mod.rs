mod from_row;
pub mod queries;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::error::Result;
use crate::middleware::BookingRateLimiter;
use crate::payments::PaymentProcessor;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    /// Public origin of the booking frontend
    pub base_url: String,
    /// None when no processor credentials are configured
    pub payments: Option<Arc<dyn PaymentProcessor>>,
    pub stripe_webhook_secret: Option<String>,
    pub rate_limiter: Option<Arc<BookingRateLimiter>>,
    /// Rate-limit on forwarded client IP headers instead of the socket address
    pub trust_proxy_headers: bool,
}

pub fn create_pool(database_path: &str) -> Result<DbPool> {
    let manager = if database_path == ":memory:" {
        SqliteConnectionManager::memory()
    } else {
        if let Some(parent) = Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    crate::error::AppError::Internal(format!(
                        "Failed to create database directory: {}",
                        e
                    ))
                })?;
            }
        }
        SqliteConnectionManager::file(database_path)
    };
    let manager = manager.with_init(|conn| {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
    });

    // Every in-memory connection is its own database, so keep exactly one
    let max_size = if database_path == ":memory:" { 1 } else { 8 };
    let pool = Pool::builder().max_size(max_size).build(manager)?;
    Ok(pool)
}

/// Create the schema. Safe to run on every startup.
pub fn init_db(conn: &Connection) -> Result<()> {
    // journal_mode answers with a row, so it can't go through execute_batch
    conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))?;

    conn.execute_batch(
        r#"

        CREATE TABLE IF NOT EXISTS studios (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            allow_online_booking INTEGER NOT NULL DEFAULT 1,
            require_deposit INTEGER NOT NULL DEFAULT 0,
            deposit_amount REAL NOT NULL DEFAULT 0,
            deposit_percentage INTEGER NOT NULL DEFAULT 0,
            stripe_account_id TEXT,
            currency TEXT NOT NULL DEFAULT 'usd',
            timezone TEXT,
            created_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS business_hours (
            studio_id TEXT NOT NULL REFERENCES studios(id) ON DELETE CASCADE,
            weekday INTEGER NOT NULL CHECK (weekday BETWEEN 0 AND 6),
            open_time TEXT NOT NULL,
            close_time TEXT NOT NULL,
            is_closed INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (studio_id, weekday)
        );

        CREATE TABLE IF NOT EXISTS artists (
            id TEXT PRIMARY KEY,
            studio_id TEXT NOT NULL REFERENCES studios(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'active',
            specialty TEXT,
            hourly_rate REAL,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_artists_studio ON artists(studio_id);

        CREATE TABLE IF NOT EXISTS services (
            id TEXT PRIMARY KEY,
            studio_id TEXT NOT NULL REFERENCES studios(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            price REAL,
            duration_minutes INTEGER,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_services_studio ON services(studio_id);

        CREATE TABLE IF NOT EXISTS booking_links (
            id TEXT PRIMARY KEY,
            studio_id TEXT NOT NULL REFERENCES studios(id) ON DELETE CASCADE,
            booking_slug TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at INTEGER NOT NULL,
            UNIQUE (studio_id, booking_slug)
        );

        CREATE TABLE IF NOT EXISTS clients (
            id TEXT PRIMARY KEY,
            studio_id TEXT NOT NULL REFERENCES studios(id) ON DELETE CASCADE,
            full_name TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT,
            created_at INTEGER NOT NULL,
            UNIQUE (studio_id, email)
        );

        CREATE TABLE IF NOT EXISTS appointments (
            id TEXT PRIMARY KEY,
            studio_id TEXT NOT NULL REFERENCES studios(id) ON DELETE CASCADE,
            artist_id TEXT NOT NULL REFERENCES artists(id),
            client_id TEXT NOT NULL REFERENCES clients(id),
            service_id TEXT REFERENCES services(id) ON DELETE SET NULL,
            appointment_date TEXT NOT NULL,
            start_time TEXT NOT NULL,
            duration INTEGER NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            price REAL,
            deposit_paid REAL NOT NULL DEFAULT 0,
            payment_status TEXT NOT NULL DEFAULT 'unpaid',
            payment_method TEXT,
            notes TEXT,
            created_at INTEGER NOT NULL,
            UNIQUE (studio_id, artist_id, client_id, appointment_date, start_time)
        );
        CREATE INDEX IF NOT EXISTS idx_appointments_artist_date
            ON appointments(studio_id, artist_id, appointment_date);

        CREATE TABLE IF NOT EXISTS payments (
            id TEXT PRIMARY KEY,
            appointment_id TEXT NOT NULL REFERENCES appointments(id) ON DELETE CASCADE,
            studio_id TEXT NOT NULL REFERENCES studios(id) ON DELETE CASCADE,
            amount REAL NOT NULL,
            status TEXT NOT NULL,
            method TEXT NOT NULL,
            reference TEXT NOT NULL UNIQUE,
            card_brand TEXT,
            card_last4 TEXT,
            created_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS webhook_events (
            id TEXT PRIMARY KEY,
            provider TEXT NOT NULL,
            event_id TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            UNIQUE (provider, event_id)
        );
        "#,
    )?;
    Ok(())
}
