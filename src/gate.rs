// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request gate for `/api` routes.
//!
//! Runs before every handler and settles, in order:
//!
//! 1. paths outside `/api` pass straight through;
//! 2. `OPTIONS` gets the fixed CORS preflight answer;
//! 3. methods other than `GET`/`POST` get 405;
//! 4. `POST` to a wallet creation endpoint is counted by the [`RateLimiter`]
//!    and rejected with 429 once the client's quota is spent;
//! 5. everything else reaches the router unchanged.
//!
//! Clients are identified by the raw `x-forwarded-for` header, then
//! `x-real-ip`. Requests carrying neither share the [`UNKNOWN_IP`] bucket.
//!
//! [`RateLimiter`]: crate::rate_limit::RateLimiter

use axum::{
    body::Body,
    extract::{Request, State},
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, RETRY_AFTER, USER_AGENT,
        },
        HeaderMap, HeaderName, HeaderValue, Method, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::models::{AccountType, RateLimitDetails};
use crate::rate_limit::{reset_time_string, seconds_until, RateLimitDecision};
use crate::state::AppState;

/// Bucket shared by clients that send no forwarding headers.
pub const UNKNOWN_IP: &str = "unknown IP";

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");
pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

const RATE_LIMITED_PATHS: [AccountType; 3] = [
    AccountType::Eoa,
    AccountType::SmartAccount,
    AccountType::Solana,
];

/// Gate middleware, installed with `axum::middleware::from_fn_with_state`.
pub async fn request_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    if !is_api_path(&path) {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let ip = client_ip(request.headers());
    info!(%method, %path, %ip, "API request");

    if method == Method::OPTIONS {
        return preflight_response();
    }

    if method != Method::GET && method != Method::POST {
        return ApiError::method_not_allowed(method.as_str()).into_response();
    }

    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");
    if user_agent.to_ascii_lowercase().contains("bot") && !path.contains("/health") {
        warn!(%user_agent, %path, "Potential bot detected");
    }

    if method == Method::POST && is_rate_limited_path(&path) {
        let decision = state.rate_limiter.check_rate_limit(&ip).await;
        if !decision.allowed {
            warn!(%ip, %path, "Wallet creation rate limit exceeded");
            return rate_limited_response(decision, state.rate_limiter.limit());
        }
        info!(%ip, remaining = decision.remaining, "Wallet creation allowed");
    }

    next.run(request).await
}

fn is_api_path(path: &str) -> bool {
    path == "/api" || path.starts_with("/api/")
}

fn is_rate_limited_path(path: &str) -> bool {
    RATE_LIMITED_PATHS
        .iter()
        .any(|account_type| account_type.endpoint() == path)
}

/// Client identity used as the rate limit bucket.
pub fn client_ip(headers: &HeaderMap) -> String {
    [X_FORWARDED_FOR, X_REAL_IP]
        .iter()
        .filter_map(|name| headers.get(name))
        .map(|v| String::from_utf8_lossy(v.as_bytes()))
        .find(|v| !v.is_empty())
        .map(|v| v.into_owned())
        .unwrap_or_else(|| UNKNOWN_IP.to_string())
}

fn preflight_response() -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400"));
    response
}

fn rate_limited_response(decision: RateLimitDecision, limit: u64) -> Response {
    let now_ms = Utc::now().timestamp_millis();
    let reset_in = reset_time_string(decision.reset_time, now_ms);

    let error = ApiError::new(
        StatusCode::TOO_MANY_REQUESTS,
        format!(
            "Rate limit exceeded. You can create up to {limit} wallets per 24 hours. Please try again in {reset_in}."
        ),
    )
    .with_details(RateLimitDetails {
        limit,
        window: "24 hours".to_string(),
        reset_in,
    });

    let mut response = error.into_response();
    let headers = response.headers_mut();
    headers.insert(
        RETRY_AFTER,
        HeaderValue::from(seconds_until(decision.reset_time, now_ms)),
    );
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from_static("0"));
    headers.insert(X_RATELIMIT_RESET, HeaderValue::from(decision.reset_time));
    response
}
