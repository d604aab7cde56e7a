use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

use crate::db::AppState;
use crate::error::AppError;
use crate::util::extract_client_ip;

/// Per-client-IP limiter for the public booking endpoints.
pub type BookingRateLimiter = DefaultKeyedRateLimiter<String>;

/// Build the limiter, or None when `per_minute` is 0 (unlimited).
pub fn booking_rate_limiter(per_minute: u32) -> Option<Arc<BookingRateLimiter>> {
    NonZeroU32::new(per_minute).map(|n| Arc::new(RateLimiter::keyed(Quota::per_minute(n))))
}

pub async fn booking_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(ref limiter) = state.rate_limiter {
        let forwarded = if state.trust_proxy_headers {
            extract_client_ip(request.headers())
        } else {
            None
        };
        let key = forwarded
            .or_else(|| {
                request
                    .extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
            .unwrap_or_else(|| "unknown".to_string());

        if limiter.check_key(&key).is_err() {
            tracing::warn!(client = %key, "Booking rate limit exceeded");
            return Err(AppError::RateLimited);
        }
    }

    Ok(next.run(request).await)
}
