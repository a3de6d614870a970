//! Authentication, rate limiting and other middleware.

use super::AppState;
use crate::error::ApiError;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{num::NonZeroU32, sync::Arc, time::Instant};
use tracing::{debug, warn};

/// Response header carrying the request duration in seconds.
pub const DEBUG_TIME_HEADER: &str = "x-debug-time";

/// Global rate limiter (not keyed by IP).
pub type GlobalLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Rate limiter state shared across requests.
#[derive(Clone)]
pub struct RateLimitState {
    pub global: Arc<GlobalLimiter>,
}

impl RateLimitState {
    /// Create a limiter allowing `requests_per_minute` requests. Zero falls back to 60.
    pub fn new(requests_per_minute: u32) -> Self {
        let quota = Quota::per_minute(
            NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::new(60).unwrap()),
        );

        Self {
            global: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Create a permissive rate limiter for testing.
    pub fn permissive() -> Self {
        Self::new(10_000)
    }
}

/// Rejects requests with 429 once the global quota is used up.
pub async fn rate_limit_middleware(
    State(rate_limit): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if rate_limit.global.check().is_err() {
        warn!("Global rate limit exceeded");
        return Err(ApiError::RateLimitExceeded);
    }

    Ok(next.run(request).await)
}

/// Resolves the bearer token and attaches the [`AuthenticatedUser`] to the request.
///
/// [`AuthenticatedUser`]: crate::auth::AuthenticatedUser
pub async fn require_token(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&request)
        .ok_or(ApiError::Unauthenticated)?
        .to_owned();

    let user = state.auth.write().await.authenticate(&token)?;
    debug!(user_id = user.user.id, "Authenticated request");

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Option<&str> {
    let value = request.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Logging middleware for requests.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    debug!(%method, %uri, "Request started");

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    if status.is_success() {
        debug!(%method, %uri, %status, ?duration, "Request completed");
    } else {
        warn!(%method, %uri, %status, ?duration, "Request failed");
    }

    response
}

/// Adds an `X-Debug-Time` header with the time spent handling the request.
pub async fn debug_headers_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let mut response = next.run(request).await;

    let elapsed = format!("{:.6}", start.elapsed().as_secs_f64());
    if let Ok(value) = HeaderValue::from_str(&elapsed) {
        response.headers_mut().insert(DEBUG_TIME_HEADER, value);
    }
    response
}
