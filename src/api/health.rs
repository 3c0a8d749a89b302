// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use chrono::{SecondsFormat, Utc};

use crate::config::{NEXT_PUBLIC_API_URL_ENV, REQUIRED_CDP_CREDENTIALS};
use crate::models::{CheckResult, HealthChecks, HealthResponse};
use crate::state::AppState;

const SERVICE_NAME: &str = "cli-wallet-api";
const SERVICE_VERSION: &str = "1.0.0";

/// Check that all CDP credentials are present.
fn check_environment(state: &AppState) -> CheckResult {
    let missing = state.cdp.missing_credentials();
    if missing.is_empty() {
        CheckResult {
            variables: Some(REQUIRED_CDP_CREDENTIALS.iter().map(|v| v.to_string()).collect()),
            ..CheckResult::healthy("All required environment variables are set")
        }
    } else {
        CheckResult {
            missing: Some(missing.clone()),
            ..CheckResult::unhealthy(format!(
                "Missing environment variables: {}",
                missing.join(", ")
            ))
        }
    }
}

/// Check that the CDP client can be constructed. No platform call is made.
fn check_cdp_client(state: &AppState) -> CheckResult {
    match state.cdp.get_client() {
        Ok(_) => CheckResult::healthy("CDP Client initialized successfully"),
        Err(e) => CheckResult::unhealthy(e.to_string()),
    }
}

/// The advertised API URL is optional; its absence is only a warning.
fn check_api_url(state: &AppState) -> CheckResult {
    match &state.config.public_api_url {
        Some(url) => CheckResult {
            url: Some(url.clone()),
            ..CheckResult::healthy(format!("API URL configured: {url}"))
        },
        None => CheckResult {
            url: Some("not set".to_string()),
            ..CheckResult::warning(format!(
                "{NEXT_PUBLIC_API_URL_ENV} not set (optional for development)"
            ))
        },
    }
}

/// Health check endpoint handler.
///
/// Returns 200 when every check is healthy or a warning, 503 otherwise.
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let checks = HealthChecks {
        service: CheckResult::healthy("API service is running"),
        environment: check_environment(&state),
        cdp_client: check_cdp_client(&state),
        api_url: check_api_url(&state),
    };
    let healthy = checks.all_passing();

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        version: SERVICE_VERSION.to_string(),
        service: SERVICE_NAME.to_string(),
        checks,
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{state_with_credentials, state_without_credentials};

    #[tokio::test]
    async fn missing_credentials_make_the_service_unhealthy() {
        let (status, Json(body)) = health(State(state_without_credentials())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.status, "unhealthy");
        assert_eq!(body.service, "cli-wallet-api");
        assert_eq!(body.checks.environment.missing.as_ref().map(Vec::len), Some(3));
        assert_eq!(body.checks.cdp_client.status, "unhealthy");
    }

    #[tokio::test]
    async fn unset_api_url_is_only_a_warning() {
        let (status, Json(body)) = health(State(state_with_credentials(
            "https://api.cdp.coinbase.com/platform",
        )))
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "healthy");
        assert_eq!(body.checks.api_url.status, "warning");
        assert_eq!(body.checks.api_url.url.as_deref(), Some("not set"));
        assert_eq!(body.version, "1.0.0");
    }
}
