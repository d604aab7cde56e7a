use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use inkbook::config::Config;
use inkbook::db::{AppState, create_pool, init_db};
use inkbook::handlers;
use inkbook::middleware::booking_rate_limiter;
use inkbook::payments::{PaymentProcessor, StripeClient};

#[derive(Parser)]
#[command(name = "inkbook", version, about = "Public booking service for tattoo studios")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Create the database schema and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkbook=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    let pool = create_pool(&config.database_path).context("Failed to create database pool")?;
    {
        let conn = pool.get().context("Failed to get database connection")?;
        init_db(&conn).context("Failed to initialize database")?;
    }

    if matches!(cli.command, Some(Command::Migrate)) {
        tracing::info!("Schema ready at {}", config.database_path);
        return Ok(());
    }

    let payments: Option<Arc<dyn PaymentProcessor>> = match config.stripe_secret_key {
        Some(ref key) => Some(Arc::new(StripeClient::new(key, &config.stripe_api_base))),
        None => {
            tracing::warn!("STRIPE_SECRET_KEY not set, deposit bookings are disabled");
            None
        }
    };
    if config.stripe_webhook_secret.is_none() {
        tracing::warn!("STRIPE_WEBHOOK_SECRET not set, the Stripe webhook will answer 503");
    }

    let rate_limiter = booking_rate_limiter(config.booking_rate_limit_per_minute);
    if let Some(ref limiter) = rate_limiter {
        // Drop idle client keys so the limiter doesn't grow without bound
        let limiter = limiter.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            loop {
                interval.tick().await;
                limiter.retain_recent();
            }
        });
    }

    let state = AppState {
        db: pool,
        base_url: config.base_url.clone(),
        payments,
        stripe_webhook_secret: config.stripe_webhook_secret.clone(),
        rate_limiter,
        trust_proxy_headers: config.trust_proxy_headers,
    };

    if config.trust_proxy_headers {
        tracing::info!("Rate limiting on forwarded client IP headers");
    }

    if config.dev_mode {
        tracing::warn!("Dev mode enabled, /dev routes are mounted");
    }

    let app = handlers::router(state, config.dev_mode)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("inkbook listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
