// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP client for the add-wallet API.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;

use super::CliError;
use crate::models::{
    AccountType, EoaWalletResponse, ErrorResponse, FaucetRequest, FaucetResponse,
    OnrampSessionRequest, OnrampSessionResponse, SmartAccountResponse, SolanaWalletResponse,
};

/// Production deployment used when `API_URL` is unset.
pub const DEFAULT_API_URL: &str = "https://add-wallet.vercel.app";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A wallet returned by one of the creation endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreatedWallet {
    Eoa(EoaWalletResponse),
    SmartAccount(SmartAccountResponse),
    Solana(SolanaWalletResponse),
}

impl CreatedWallet {
    /// Address to fund: the Smart Account itself rather than its owner.
    pub fn funding_address(&self) -> &str {
        match self {
            CreatedWallet::Eoa(w) => &w.address,
            CreatedWallet::SmartAccount(w) => &w.smart_account_address,
            CreatedWallet::Solana(w) => &w.address,
        }
    }

    pub fn network(&self) -> &str {
        match self {
            CreatedWallet::Eoa(w) => &w.network,
            CreatedWallet::SmartAccount(w) => &w.network,
            CreatedWallet::Solana(w) => &w.network,
        }
    }
}

pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, CliError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CliError::Api(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub async fn create_wallet(&self, account_type: AccountType) -> Result<CreatedWallet, CliError> {
        let path = account_type.endpoint();
        let body = json!({});
        Ok(match account_type {
            AccountType::Eoa => CreatedWallet::Eoa(self.post(path, &body).await?),
            AccountType::SmartAccount => CreatedWallet::SmartAccount(self.post(path, &body).await?),
            AccountType::Solana => CreatedWallet::Solana(self.post(path, &body).await?),
        })
    }

    pub async fn create_onramp_session(
        &self,
        request: &OnrampSessionRequest,
    ) -> Result<OnrampSessionResponse, CliError> {
        self.post("/api/onramp/session", request).await
    }

    pub async fn request_testnet_faucet(
        &self,
        request: &FaucetRequest,
    ) -> Result<FaucetResponse, CliError> {
        self.post("/api/faucet/testnet", request).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, CliError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|_| CliError::Api(unreachable_message()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let error = serde_json::from_str::<ErrorResponse>(&text).ok();
            return Err(CliError::Api(friendly_error(status, error)));
        }

        response
            .json()
            .await
            .map_err(|e| CliError::Api(format!("Unexpected response from {path}: {e}")))
    }
}

fn unreachable_message() -> String {
    "Unable to connect to the wallet API. Please check your internet connection and try again."
        .to_string()
}

/// Message shown for a failed API call.
pub fn friendly_error(status: StatusCode, body: Option<ErrorResponse>) -> String {
    if let Some(body) = body.filter(|b| !b.error.is_empty()) {
        return body.error;
    }
    if status.is_server_error() {
        return "The wallet service is temporarily unavailable. Please try again later."
            .to_string();
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return "Too many requests. Please wait a moment and try again.".to_string();
    }
    format!("API request failed with status {}", status.as_u16())
}
