// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet creation endpoints.
//!
//! Each `POST` creates an account through CDP, exports its key and returns
//! both to the caller. The service keeps nothing. Matching `GET` routes
//! describe the endpoint.

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::{
    error::{ApiError, AppError},
    models::{AccountType, EoaWalletResponse, SmartAccountResponse, SolanaWalletResponse},
    state::AppState,
};

const BASE_MAINNET: &str = "base-mainnet";
const SOLANA_MAINNET: &str = "solana-mainnet";

const SMART_ACCOUNT_NOTE: &str = "Smart Account will be deployed on first transaction. You must use the owner's private key to sign transactions for this Smart Account.";

#[utoipa::path(
    post,
    path = "/api/wallet/eoa",
    tag = "Wallet",
    responses(
        (status = 201, description = "EOA created", body = EoaWalletResponse),
        (status = 401, description = "Platform rejected credentials", body = crate::models::ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = crate::models::ErrorResponse),
        (status = 500, description = "Configuration or platform failure", body = crate::models::ErrorResponse)
    )
)]
pub async fn create_eoa_wallet(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<EoaWalletResponse>), ApiError> {
    let create = async {
        let cdp = state.cdp.get_client()?;
        let account = cdp.create_evm_account().await?;
        info!(address = %account.address, "Created EOA");
        let private_key = cdp.export_evm_account(&account.address).await?;
        Ok::<_, AppError>(EoaWalletResponse {
            success: true,
            account_type: AccountType::Eoa,
            address: account.address,
            private_key,
            network: BASE_MAINNET.to_string(),
        })
    };

    create
        .await
        .map(|body| (StatusCode::CREATED, Json(body)))
        .map_err(|e| wallet_error(AccountType::Eoa, e))
}

#[utoipa::path(
    post,
    path = "/api/wallet/smart-account",
    tag = "Wallet",
    responses(
        (status = 201, description = "Smart Account created", body = SmartAccountResponse),
        (status = 400, description = "Network not supported", body = crate::models::ErrorResponse),
        (status = 401, description = "Platform rejected credentials", body = crate::models::ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = crate::models::ErrorResponse),
        (status = 500, description = "Configuration or platform failure", body = crate::models::ErrorResponse)
    )
)]
pub async fn create_smart_account(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SmartAccountResponse>), ApiError> {
    let create = async {
        let cdp = state.cdp.get_client()?;

        // The Smart Account is signed for by a plain EOA owner.
        let owner = cdp.create_evm_account().await?;
        info!(owner = %owner.address, "Created Smart Account owner");

        let smart_account = cdp.create_smart_account(&owner.address).await?;
        info!(address = %smart_account.address, "Created Smart Account");

        let owner_private_key = cdp.export_evm_account(&owner.address).await?;
        Ok::<_, AppError>(SmartAccountResponse {
            success: true,
            account_type: AccountType::SmartAccount,
            smart_account_address: smart_account.address,
            owner_address: owner.address,
            owner_private_key,
            network: BASE_MAINNET.to_string(),
            note: Some(SMART_ACCOUNT_NOTE.to_string()),
        })
    };

    create
        .await
        .map(|body| (StatusCode::CREATED, Json(body)))
        .map_err(|e| wallet_error(AccountType::SmartAccount, e))
}

#[utoipa::path(
    post,
    path = "/api/wallet/solana",
    tag = "Wallet",
    responses(
        (status = 201, description = "Solana account created", body = SolanaWalletResponse),
        (status = 401, description = "Platform rejected credentials", body = crate::models::ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = crate::models::ErrorResponse),
        (status = 500, description = "Configuration or platform failure", body = crate::models::ErrorResponse)
    )
)]
pub async fn create_solana_wallet(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SolanaWalletResponse>), ApiError> {
    let create = async {
        let cdp = state.cdp.get_client()?;
        let account = cdp.create_solana_account().await?;
        info!(address = %account.address, "Created Solana account");
        let private_key = cdp.export_solana_account(&account.address).await?;
        Ok::<_, AppError>(SolanaWalletResponse {
            success: true,
            account_type: AccountType::Solana,
            address: account.address,
            private_key,
            network: SOLANA_MAINNET.to_string(),
        })
    };

    create
        .await
        .map(|body| (StatusCode::CREATED, Json(body)))
        .map_err(|e| wallet_error(AccountType::Solana, e))
}

/// Map a wallet creation failure to its response, tagged with the account type.
fn wallet_error(account_type: AccountType, e: AppError) -> ApiError {
    error!(%account_type, error = %e, "Wallet creation failed");

    // Smart Accounts only exist on Base networks.
    let unsupported_network = account_type == AccountType::SmartAccount
        && matches!(&e, AppError::Upstream(m) if m.contains("network") || m.contains("Base"));

    let mut error = ApiError::from(e).with_account_type(account_type);
    if unsupported_network {
        error.status = StatusCode::BAD_REQUEST;
    }
    error
}

#[utoipa::path(get, path = "/api/wallet/eoa", tag = "Wallet", responses((status = 200)))]
pub async fn describe_eoa() -> Json<Value> {
    Json(json!({
        "endpoint": AccountType::Eoa.endpoint(),
        "method": "POST",
        "description": "Creates a new EOA (Externally Owned Account) on Base Mainnet",
        "returns": {
            "success": "boolean",
            "accountType": "string",
            "address": "string",
            "privateKey": "string",
            "network": "string",
        },
        "notes": [
            "EOA accounts work on all EVM-compatible networks",
            "Private key should be stored securely by the user",
            "This is a simple wallet controlled directly by a private key",
        ],
    }))
}

#[utoipa::path(get, path = "/api/wallet/smart-account", tag = "Wallet", responses((status = 200)))]
pub async fn describe_smart_account() -> Json<Value> {
    Json(json!({
        "endpoint": AccountType::SmartAccount.endpoint(),
        "method": "POST",
        "description": "Creates a new Smart Account on Base Mainnet with an EOA owner",
        "returns": {
            "success": "boolean",
            "accountType": "string",
            "smartAccountAddress": "string",
            "ownerAddress": "string",
            "ownerPrivateKey": "string",
            "network": "string",
            "note": "string",
        },
        "features": [
            "Gas sponsorship via paymasters (subsidized on Base Sepolia)",
            "Batch multiple transactions in a single user operation",
            "EIP-4337 account abstraction support",
            "Deployed on first transaction using CREATE2",
        ],
        "limitations": [
            "Only available on Base Mainnet and Base Sepolia",
            "One Smart Account per owner EOA",
            "Requires owner EOA private key to sign transactions",
        ],
    }))
}

#[utoipa::path(get, path = "/api/wallet/solana", tag = "Wallet", responses((status = 200)))]
pub async fn describe_solana() -> Json<Value> {
    Json(json!({
        "endpoint": AccountType::Solana.endpoint(),
        "method": "POST",
        "description": "Creates a new Solana account on Solana network",
        "returns": {
            "success": "boolean",
            "accountType": "string",
            "address": "string",
            "privateKey": "string",
            "network": "string",
        },
        "notes": [
            "Solana accounts work on Solana blockchain",
            "Private key should be stored securely by the user",
        ],
    }))
}
