// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Coinbase Developer Platform (CDP) v2 REST client.
//!
//! Covers the small surface this service needs: account creation and key
//! export for EVM and Solana, Smart Account creation, and the testnet
//! faucets.

pub mod auth;
pub mod export;
pub mod guard;

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

use self::auth::{hex_lower, ApiKeySigner, WalletSigner};
use self::export::{solana_keypair_base58, ExportKeyPair};

pub use self::guard::{CdpClientGuard, ConfigurationError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum CdpError {
    #[error("CDP request failed: {0}")]
    Request(String),

    #[error("CDP authentication failed: {0}")]
    Auth(String),

    #[error("CDP rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("CDP API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("CDP response was invalid: {0}")]
    InvalidResponse(String),

    #[error("CDP request signing failed: {0}")]
    Signing(String),

    #[error("CDP key export failed: {0}")]
    Export(String),
}

/// Coarse classification used by handlers to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CdpErrorKind {
    Authentication,
    RateLimit,
    Other,
}

impl CdpError {
    pub fn kind(&self) -> CdpErrorKind {
        match self {
            CdpError::Auth(_) => CdpErrorKind::Authentication,
            CdpError::RateLimited(_) => CdpErrorKind::RateLimit,
            other => classify_message(&other.to_string()),
        }
    }
}

/// Classify an upstream error message by the substrings the platform uses.
pub fn classify_message(message: &str) -> CdpErrorKind {
    let lower = message.to_ascii_lowercase();
    if lower.contains("api key") || lower.contains("authentication") {
        CdpErrorKind::Authentication
    } else if lower.contains("rate limit") {
        CdpErrorKind::RateLimit
    } else {
        CdpErrorKind::Other
    }
}

/// Validated CDP credentials.
#[derive(Clone)]
pub struct CdpCredentials {
    pub api_key_id: String,
    pub api_key_secret: String,
    pub wallet_secret: String,
}

impl std::fmt::Debug for CdpCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdpCredentials")
            .field("api_key_id", &self.api_key_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmAccount {
    pub address: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartAccount {
    pub address: String,
    #[serde(default)]
    pub owners: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolanaAccount {
    pub address: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportResponse {
    encrypted_private_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EvmFaucetResponse {
    transaction_hash: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SolanaFaucetResponse {
    transaction_signature: String,
}

/// Authenticated CDP REST client.
pub struct CdpClient {
    base_url: Url,
    api_key: ApiKeySigner,
    wallet: WalletSigner,
    http: Client,
}

impl std::fmt::Debug for CdpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdpClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key)
            .finish_non_exhaustive()
    }
}

impl CdpClient {
    /// Parse credentials and build a client for `base_url`.
    ///
    /// Returns the name of the offending credential alongside the reason when
    /// a secret cannot be parsed.
    pub fn new(
        credentials: &CdpCredentials,
        base_url: &str,
    ) -> Result<Self, (&'static str, String)> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| ("CDP_API_BASE_URL", e.to_string()))?;
        let api_key =
            ApiKeySigner::from_secret(&credentials.api_key_id, &credentials.api_key_secret)
                .map_err(|e| ("CDP_API_KEY_SECRET", e))?;
        let wallet = WalletSigner::from_secret(&credentials.wallet_secret)
            .map_err(|e| ("CDP_WALLET_SECRET", e))?;

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ("CDP_API_BASE_URL", format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url,
            api_key,
            wallet,
            http,
        })
    }

    /// API key signer, shared with other Coinbase APIs that accept CDP keys.
    pub fn api_key(&self) -> &ApiKeySigner {
        &self.api_key
    }

    /// Create a new EVM account (EOA).
    pub async fn create_evm_account(&self) -> Result<EvmAccount, CdpError> {
        let account: EvmAccount = self.post("/v2/evm/accounts", json!({}), true).await?;
        info!(address = %account.address, "CDP created EVM account");
        Ok(account)
    }

    /// Export an EVM account's private key as lowercase hex (no `0x`).
    pub async fn export_evm_account(&self, address: &str) -> Result<String, CdpError> {
        let key = self
            .export(&format!("/v2/evm/accounts/{address}/export"))
            .await?;
        info!(%address, "CDP exported EVM account");
        Ok(hex_lower(&key))
    }

    /// Create a Smart Account owned by `owner`.
    pub async fn create_smart_account(&self, owner: &str) -> Result<SmartAccount, CdpError> {
        let account: SmartAccount = self
            .post("/v2/evm/smart-accounts", json!({ "owners": [owner] }), false)
            .await?;
        info!(address = %account.address, %owner, "CDP created Smart Account");
        Ok(account)
    }

    /// Create a new Solana account.
    pub async fn create_solana_account(&self) -> Result<SolanaAccount, CdpError> {
        let account: SolanaAccount = self.post("/v2/solana/accounts", json!({}), true).await?;
        info!(address = %account.address, "CDP created Solana account");
        Ok(account)
    }

    /// Export a Solana account's keypair as base58.
    pub async fn export_solana_account(&self, address: &str) -> Result<String, CdpError> {
        let seed = self
            .export(&format!("/v2/solana/accounts/{address}/export"))
            .await?;
        info!(%address, "CDP exported Solana account");
        solana_keypair_base58(&seed, address)
    }

    /// Request testnet tokens on an EVM network. Returns the transaction hash.
    pub async fn request_evm_faucet(
        &self,
        address: &str,
        network: &str,
        token: &str,
    ) -> Result<String, CdpError> {
        let response: EvmFaucetResponse = self
            .post(
                "/v2/evm/faucet",
                json!({ "address": address, "network": network, "token": token }),
                false,
            )
            .await?;
        Ok(response.transaction_hash)
    }

    /// Request testnet tokens on Solana devnet. Returns the transaction signature.
    pub async fn request_solana_faucet(
        &self,
        address: &str,
        token: &str,
    ) -> Result<String, CdpError> {
        let response: SolanaFaucetResponse = self
            .post(
                "/v2/solana/faucet",
                json!({ "address": address, "token": token }),
                false,
            )
            .await?;
        Ok(response.transaction_signature)
    }

    async fn export(&self, path: &str) -> Result<Vec<u8>, CdpError> {
        let exchange = tokio::task::spawn_blocking(ExportKeyPair::generate)
            .await
            .map_err(|e| CdpError::Export(format!("export key task failed: {e}")))??;
        let response: ExportResponse = self
            .post(
                path,
                json!({ "exportEncryptionKey": exchange.public_key_b64() }),
                true,
            )
            .await?;
        exchange.decrypt(&response.encrypted_private_key)
    }

    fn endpoint(&self, path: &str) -> (String, String, String) {
        let host = match (self.base_url.host_str(), self.base_url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => String::new(),
        };
        let full_path = format!("{}{}", self.base_url.path().trim_end_matches('/'), path);
        let url = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path);
        (url, host, full_path)
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: Value,
        wallet_auth: bool,
    ) -> Result<T, CdpError> {
        let (url, host, full_path) = self.endpoint(path);
        let bearer = self.api_key.bearer_jwt("POST", &host, &full_path)?;

        let mut request = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {bearer}"))
            .header("Content-Type", "application/json")
            .json(&body);

        if wallet_auth {
            let token = self.wallet.wallet_jwt("POST", &host, &full_path, &body)?;
            request = request
                .header("X-Wallet-Auth", token)
                .header("X-Idempotency-Key", Uuid::new_v4().to_string());
        }

        debug!(%url, key_id = %self.api_key.key_id(), "CDP request");

        let response = request
            .send()
            .await
            .map_err(|e| CdpError::Request(format!("POST {path} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, &text));
        }

        response
            .json()
            .await
            .map_err(|e| CdpError::InvalidResponse(format!("POST {path} invalid JSON: {e}")))
    }
}

fn error_for_status(status: StatusCode, body: &str) -> CdpError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("errorMessage")
                .or_else(|| v.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CdpError::Auth(message),
        StatusCode::TOO_MANY_REQUESTS => CdpError::RateLimited(message),
        _ => CdpError::Api {
            status: status.as_u16(),
            message,
        },
    }
}
