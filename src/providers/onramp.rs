// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Coinbase Pay onramp integration.
//!
//! A purchase link is built in two steps: a short-lived session token is
//! minted through the Session Token API (authenticated with the CDP API key)
//! and then embedded in a hosted `pay.coinbase.com/buy` URL.

use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info};
use url::Url;

use super::cdp::auth::ApiKeySigner;
use super::cdp::CdpError;

const PAY_BUY_URL: &str = "https://pay.coinbase.com/buy";

/// How long a session token stays valid, as reported to clients.
pub const SESSION_EXPIRES_IN: &str = "5 minutes";

#[derive(Debug, thiserror::Error)]
pub enum OnrampError {
    #[error("Onramp token request failed: {0}")]
    Request(String),

    #[error("Session token not found in response")]
    MissingToken,

    #[error("Onramp request signing failed: {0}")]
    Signing(String),

    #[error("Onramp configuration invalid: {0}")]
    Config(String),
}

impl From<CdpError> for OnrampError {
    fn from(e: CdpError) -> Self {
        OnrampError::Signing(e.to_string())
    }
}

/// Parameters of one onramp purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnrampSession {
    pub destination_address: String,
    /// Asset to purchase (`USDC`, `SOL`).
    pub purchase_currency: String,
    /// Destination network (`base`, `solana`).
    pub destination_network: String,
    /// Optional fiat amount for one-click buy.
    pub payment_amount: Option<String>,
    pub payment_currency: Option<String>,
}

/// Session token client.
#[derive(Debug, Clone)]
pub struct OnrampClient {
    token_url: Url,
    http: Client,
}

impl OnrampClient {
    pub fn new(token_url: &str) -> Result<Self, OnrampError> {
        let token_url = Url::parse(token_url).map_err(|e| OnrampError::Config(e.to_string()))?;
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| OnrampError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { token_url, http })
    }

    /// Mint a session token for `session` and return the purchase URL.
    pub async fn create_onramp_url(
        &self,
        signer: &ApiKeySigner,
        session: &OnrampSession,
    ) -> Result<String, OnrampError> {
        let token = self.create_session_token(signer, session).await?;
        Ok(build_onramp_url(&token, session))
    }

    async fn create_session_token(
        &self,
        signer: &ApiKeySigner,
        session: &OnrampSession,
    ) -> Result<String, OnrampError> {
        let host = match (self.token_url.host_str(), self.token_url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(OnrampError::Config("token URL has no host".to_string())),
        };
        let jwt = signer.bearer_jwt("POST", &host, self.token_url.path())?;

        let payload = json!({
            "addresses": [{
                "address": session.destination_address,
                "blockchains": [session.destination_network],
            }],
            "assets": [session.purchase_currency],
        });

        let response = self
            .http
            .post(self.token_url.clone())
            .header("Authorization", format!("Bearer {jwt}"))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| OnrampError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OnrampError::Request(format!(
                "token API returned {status}: {body}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| OnrampError::Request(format!("invalid JSON: {e}")))?;
        debug!(response = %body, "Onramp token API response");

        let token = extract_session_token(&body).ok_or(OnrampError::MissingToken)?;
        info!(network = %session.destination_network, "Onramp session token generated");
        Ok(token)
    }
}

fn extract_session_token(body: &Value) -> Option<String> {
    body.pointer("/data/token")
        .or_else(|| body.get("token"))
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// One-click-buy URL carrying the session token and optional preset amount.
pub fn build_onramp_url(session_token: &str, session: &OnrampSession) -> String {
    let mut url = format!(
        "{PAY_BUY_URL}?sessionToken={}&defaultAsset={}",
        encode(session_token),
        encode(&session.purchase_currency)
    );

    if let (Some(amount), Some(currency)) = (&session.payment_amount, &session.payment_currency) {
        url.push_str("&presetFiatAmount=");
        url.push_str(&encode(amount));
        url.push_str("&fiatCurrency=");
        url.push_str(&encode(currency));
    }

    url
}

fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
