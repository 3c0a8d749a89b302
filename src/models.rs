// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the HTTP API. The server serializes them
//! and the `add-wallet` CLI deserializes the same types, so both sides agree
//! on the camelCase wire format. Everything derives `ToSchema` for the
//! OpenAPI document.
//!
//! ## Model Categories
//!
//! - **Wallets**: EOA, Smart Account and Solana creation responses
//! - **Faucet**: testnet USDC requests
//! - **Onramp**: Coinbase Pay session links
//! - **Errors**: the shared `{ success: false, error }` envelope

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// =============================================================================
// Wallet Models
// =============================================================================

/// Kind of wallet the service can create.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum AccountType {
    /// Externally owned account on Base.
    Eoa,
    /// ERC-4337 Smart Account on Base, owned by a fresh EOA.
    SmartAccount,
    /// Solana account.
    Solana,
}

impl AccountType {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountType::Eoa => "eoa",
            AccountType::SmartAccount => "smart-account",
            AccountType::Solana => "solana",
        }
    }

    /// API path that creates this kind of wallet.
    pub fn endpoint(self) -> &'static str {
        match self {
            AccountType::Eoa => "/api/wallet/eoa",
            AccountType::SmartAccount => "/api/wallet/smart-account",
            AccountType::Solana => "/api/wallet/solana",
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Newly created EOA with its exported key.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EoaWalletResponse {
    pub success: bool,
    pub account_type: AccountType,
    pub address: String,
    /// Hex-encoded private key, no `0x` prefix.
    pub private_key: String,
    pub network: String,
}

/// Newly created Smart Account and its owner EOA.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SmartAccountResponse {
    pub success: bool,
    pub account_type: AccountType,
    pub smart_account_address: String,
    pub owner_address: String,
    pub owner_private_key: String,
    pub network: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Newly created Solana account with its exported keypair.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SolanaWalletResponse {
    pub success: bool,
    pub account_type: AccountType,
    pub address: String,
    /// Base58 of the 64-byte keypair.
    pub private_key: String,
    pub network: String,
}

// =============================================================================
// Faucet Models
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FaucetBlockchain {
    /// Base Sepolia.
    #[default]
    Evm,
    /// Solana devnet.
    Solana,
}

/// Testnet USDC request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FaucetRequest {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub blockchain: FaucetBlockchain,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FaucetResponse {
    pub success: bool,
    pub transaction_hash: String,
    pub network: String,
    pub token: String,
    pub amount: String,
    pub explorer_url: String,
}

// =============================================================================
// Onramp Models
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OnrampBlockchain {
    #[default]
    Base,
    Solana,
}

impl OnrampBlockchain {
    /// Network name understood by the onramp token API.
    pub fn as_str(self) -> &'static str {
        match self {
            OnrampBlockchain::Base => "base",
            OnrampBlockchain::Solana => "solana",
        }
    }

    /// Asset offered by default on this network.
    pub fn purchase_currency(self) -> &'static str {
        match self {
            OnrampBlockchain::Base => "USDC",
            OnrampBlockchain::Solana => "SOL",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OnrampSessionRequest {
    #[serde(default)]
    pub address: String,
    /// USD amount to pre-fill, e.g. `"100"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset_amount: Option<String>,
    #[serde(default)]
    pub blockchain: OnrampBlockchain,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OnrampSessionResponse {
    pub success: bool,
    pub onramp_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<String>,
}

// =============================================================================
// Health Models
// =============================================================================

/// Result of one health check.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckResult {
    /// `healthy`, `unhealthy` or `warning`.
    pub status: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl CheckResult {
    pub fn healthy(message: impl Into<String>) -> Self {
        Self::with_status("healthy", message)
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self::with_status("unhealthy", message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::with_status("warning", message)
    }

    fn with_status(status: &str, message: impl Into<String>) -> Self {
        Self {
            status: status.to_string(),
            message: message.into(),
            missing: None,
            variables: None,
            url: None,
        }
    }

    /// Whether this check lets the service report itself healthy.
    pub fn is_passing(&self) -> bool {
        self.status == "healthy" || self.status == "warning"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthChecks {
    pub service: CheckResult,
    pub environment: CheckResult,
    pub cdp_client: CheckResult,
    pub api_url: CheckResult,
}

impl HealthChecks {
    pub fn all_passing(&self) -> bool {
        [
            &self.service,
            &self.environment,
            &self.cdp_client,
            &self.api_url,
        ]
        .iter()
        .all(|check| check.is_passing())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// `healthy` or `unhealthy`.
    pub status: String,
    /// RFC 3339 timestamp of the check.
    pub timestamp: String,
    pub version: String,
    pub service: String,
    pub checks: HealthChecks,
}

// =============================================================================
// Error Models
// =============================================================================

/// Extra context attached to a 429 from the wallet rate limiter.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitDetails {
    pub limit: u64,
    pub window: String,
    pub reset_in: String,
}

/// Error envelope returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_type: Option<AccountType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<RateLimitDetails>,
}
