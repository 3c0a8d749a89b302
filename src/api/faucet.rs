// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use tracing::{error, info};

use super::extract::ApiJson;
use crate::{
    error::{ApiError, AppError},
    models::{FaucetBlockchain, FaucetRequest, FaucetResponse},
    state::AppState,
    validation::{is_valid_evm_address, is_valid_solana_address},
};

const FAUCET_TOKEN: &str = "usdc";
const FAUCET_AMOUNT: &str = "1 USDC";
const FAUCET_RATE_LIMITED: &str = "Rate limit exceeded. Please try again in 24 hours.";

/// Request testnet USDC on Base Sepolia or Solana devnet.
#[utoipa::path(
    post,
    path = "/api/faucet/testnet",
    request_body = FaucetRequest,
    tag = "Faucet",
    responses(
        (status = 200, description = "Funds requested", body = FaucetResponse),
        (status = 400, description = "Missing or malformed address", body = crate::models::ErrorResponse),
        (status = 429, description = "Faucet claim limit reached", body = crate::models::ErrorResponse),
        (status = 500, description = "Configuration or platform failure", body = crate::models::ErrorResponse)
    )
)]
pub async fn request_testnet_funds(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<FaucetRequest>,
) -> Result<Json<FaucetResponse>, ApiError> {
    let cdp = state.cdp.get_client()?;

    let address = request.address.trim();
    if address.is_empty() {
        return Err(ApiError::bad_request("Missing required field: address"));
    }
    validate_address(request.blockchain, address)?;

    let result = match request.blockchain {
        FaucetBlockchain::Solana => {
            info!(%address, "Requesting testnet USDC on Solana devnet");
            cdp.request_solana_faucet(address, FAUCET_TOKEN)
                .await
                .map(|signature| FaucetResponse {
                    success: true,
                    explorer_url: format!("https://explorer.solana.com/tx/{signature}?cluster=devnet"),
                    transaction_hash: signature,
                    network: "solana-devnet".to_string(),
                    token: FAUCET_TOKEN.to_string(),
                    amount: FAUCET_AMOUNT.to_string(),
                })
        }
        FaucetBlockchain::Evm => {
            info!(%address, "Requesting testnet USDC on Base Sepolia");
            cdp.request_evm_faucet(address, "base-sepolia", FAUCET_TOKEN)
                .await
                .map(|hash| FaucetResponse {
                    success: true,
                    explorer_url: format!("https://sepolia.basescan.org/tx/{hash}"),
                    transaction_hash: hash,
                    network: "base-sepolia".to_string(),
                    token: FAUCET_TOKEN.to_string(),
                    amount: FAUCET_AMOUNT.to_string(),
                })
        }
    };

    match result {
        Ok(response) => {
            info!(tx = %response.transaction_hash, network = %response.network, "Faucet transaction sent");
            Ok(Json(response))
        }
        Err(e) => {
            error!(error = %e, "Faucet request failed");
            Err(faucet_error(e.into()))
        }
    }
}

fn validate_address(blockchain: FaucetBlockchain, address: &str) -> Result<(), ApiError> {
    match blockchain {
        FaucetBlockchain::Solana if !is_valid_solana_address(address) => {
            Err(ApiError::bad_request("Invalid Solana address format"))
        }
        FaucetBlockchain::Evm if !is_valid_evm_address(address) => {
            Err(ApiError::bad_request("Invalid EVM wallet address format"))
        }
        _ => Ok(()),
    }
}

fn faucet_error(e: AppError) -> ApiError {
    match e {
        AppError::RateLimited { .. } => {
            ApiError::new(StatusCode::TOO_MANY_REQUESTS, FAUCET_RATE_LIMITED)
        }
        other => other.into(),
    }
}

#[utoipa::path(get, path = "/api/faucet/testnet", tag = "Faucet", responses((status = 200)))]
pub async fn describe_faucet() -> Json<Value> {
    Json(json!({
        "endpoint": "/api/faucet/testnet",
        "method": "POST",
        "description": "Requests testnet USDC from CDP Faucet for Base Sepolia or Solana devnet",
        "parameters": {
            "address": "string (required) - EVM or Solana wallet address",
            "blockchain": "string (optional) - \"evm\" (default) or \"solana\"",
        },
        "returns": {
            "success": "boolean",
            "transactionHash": "string",
            "network": "string",
            "token": "string",
            "amount": "string",
            "explorerUrl": "string",
        },
        "limits": {
            "token": FAUCET_TOKEN,
            "claimsPerDay": 10,
            "amountPerClaim": FAUCET_AMOUNT,
        },
    }))
}
