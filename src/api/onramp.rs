// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};
use tracing::error;

use super::extract::ApiJson;
use crate::{
    error::{ApiError, AppError},
    models::{OnrampBlockchain, OnrampSessionRequest, OnrampSessionResponse},
    providers::onramp::{OnrampSession, SESSION_EXPIRES_IN},
    state::AppState,
    validation::{is_valid_evm_address, is_valid_solana_address},
};

/// Create a Coinbase Pay session and return its purchase link.
#[utoipa::path(
    post,
    path = "/api/onramp/session",
    request_body = OnrampSessionRequest,
    tag = "Onramp",
    responses(
        (status = 200, description = "Onramp link created", body = OnrampSessionResponse),
        (status = 400, description = "Missing or malformed address", body = crate::models::ErrorResponse),
        (status = 500, description = "Session could not be created", body = crate::models::ErrorResponse)
    )
)]
pub async fn create_onramp_session(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<OnrampSessionRequest>,
) -> Result<Json<OnrampSessionResponse>, ApiError> {
    let cdp = state.cdp.get_client()?;

    let address = request.address.trim();
    if address.is_empty() {
        return Err(ApiError::bad_request("Missing required field: address"));
    }
    match request.blockchain {
        OnrampBlockchain::Solana if !is_valid_solana_address(address) => {
            return Err(ApiError::bad_request("Invalid Solana address format"));
        }
        OnrampBlockchain::Base if !is_valid_evm_address(address) => {
            return Err(ApiError::bad_request("Invalid EVM wallet address format"));
        }
        _ => {}
    }

    let preset_amount = request
        .preset_amount
        .as_deref()
        .map(str::trim)
        .filter(|amount| !amount.is_empty());

    let session = OnrampSession {
        destination_address: address.to_string(),
        purchase_currency: request.blockchain.purchase_currency().to_string(),
        destination_network: request.blockchain.as_str().to_string(),
        payment_amount: preset_amount.map(str::to_string),
        payment_currency: preset_amount.map(|_| "USD".to_string()),
    };

    let onramp_url = state
        .onramp
        .create_onramp_url(cdp.api_key(), &session)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to create onramp session");
            // Every onramp failure is reported as a server error.
            ApiError::internal(AppError::from(e).to_string())
        })?;

    Ok(Json(OnrampSessionResponse {
        success: true,
        onramp_url,
        expires_in: Some(SESSION_EXPIRES_IN.to_string()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{state_with_credentials, state_without_credentials};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn missing_credentials_are_server_errors() {
        let err = create_onramp_session(
            State(state_without_credentials()),
            ApiJson(OnrampSessionRequest::default()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.message.starts_with("Missing required environment variables"));
    }

    #[tokio::test]
    async fn solana_sessions_need_solana_addresses() {
        let state = state_with_credentials("http://127.0.0.1:9");
        let err = create_onramp_session(
            State(state),
            ApiJson(OnrampSessionRequest {
                address: "0x52908400098527886E0F7030069857D2E4169EE7".to_string(),
                preset_amount: None,
                blockchain: OnrampBlockchain::Solana,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Invalid Solana address format");
    }
}
