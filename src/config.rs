// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup, except for the CDP credentials which are read lazily by the
//! client guard on first use.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `CDP_API_KEY_ID` | CDP API key name | Required for platform calls |
//! | `CDP_API_KEY_SECRET` | CDP API key secret (Ed25519 base64 or EC PEM) | Required for platform calls |
//! | `CDP_WALLET_SECRET` | CDP wallet secret (base64 PKCS#8) | Required for platform calls |
//! | `CDP_API_BASE_URL` | CDP REST base URL | `https://api.cdp.coinbase.com/platform` |
//! | `ONRAMP_TOKEN_URL` | Coinbase Pay session token endpoint | `https://api.developer.coinbase.com/onramp/v1/token` |
//! | `REDIS_URL` | Rate limit counter store | In-process store when unset |
//! | `RATE_LIMIT_MAX_REQUESTS` | Wallet creations per IP per 24 hours | `20` |
//! | `PUBLIC_API_URL` | Advertised API URL (`NEXT_PUBLIC_API_URL` also accepted) | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;

/// Environment variable name for the server bind host.
pub const HOST_ENV: &str = "HOST";

/// Environment variable name for the server bind port.
pub const PORT_ENV: &str = "PORT";

/// CDP API key identifier.
pub const CDP_API_KEY_ID_ENV: &str = "CDP_API_KEY_ID";

/// CDP API key secret used to sign bearer JWTs.
pub const CDP_API_KEY_SECRET_ENV: &str = "CDP_API_KEY_SECRET";

/// CDP wallet secret used to sign `X-Wallet-Auth` JWTs.
pub const CDP_WALLET_SECRET_ENV: &str = "CDP_WALLET_SECRET";

/// Override for the CDP REST base URL.
pub const CDP_API_BASE_URL_ENV: &str = "CDP_API_BASE_URL";

/// Override for the Coinbase Pay session token endpoint.
pub const ONRAMP_TOKEN_URL_ENV: &str = "ONRAMP_TOKEN_URL";

/// Redis connection URL for the rate limit counters.
pub const REDIS_URL_ENV: &str = "REDIS_URL";

/// Maximum wallet creations per client IP per window.
pub const RATE_LIMIT_MAX_REQUESTS_ENV: &str = "RATE_LIMIT_MAX_REQUESTS";

/// Public URL this API is reachable at (reported by the health check).
pub const PUBLIC_API_URL_ENV: &str = "PUBLIC_API_URL";

/// Legacy name for [`PUBLIC_API_URL_ENV`] kept for existing deployments.
pub const NEXT_PUBLIC_API_URL_ENV: &str = "NEXT_PUBLIC_API_URL";

/// Logging output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Credentials the client guard requires before constructing a client.
pub const REQUIRED_CDP_CREDENTIALS: [&str; 3] = [
    CDP_API_KEY_ID_ENV,
    CDP_API_KEY_SECRET_ENV,
    CDP_WALLET_SECRET_ENV,
];

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_CDP_API_BASE_URL: &str = "https://api.cdp.coinbase.com/platform";
pub const DEFAULT_ONRAMP_TOKEN_URL: &str = "https://api.developer.coinbase.com/onramp/v1/token";

/// Default per-IP wallet creation quota for one window.
pub const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u64 = 20;

/// Fixed rate limit window (24 hours).
pub const RATE_LIMIT_WINDOW_SECS: u64 = 86_400;

/// Logging output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Process configuration resolved from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub cdp_api_base_url: String,
    pub onramp_token_url: String,
    pub redis_url: Option<String>,
    pub rate_limit_max_requests: u64,
    pub public_api_url: Option<String>,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = get(PORT_ENV)
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let rate_limit_max_requests = get(RATE_LIMIT_MAX_REQUESTS_ENV)
            .and_then(|v| v.parse().ok())
            .filter(|v: &u64| *v > 0)
            .unwrap_or(DEFAULT_RATE_LIMIT_MAX_REQUESTS);

        let log_format = match get(LOG_FORMAT_ENV).as_deref() {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Self {
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            cdp_api_base_url: get(CDP_API_BASE_URL_ENV)
                .unwrap_or_else(|| DEFAULT_CDP_API_BASE_URL.to_string()),
            onramp_token_url: get(ONRAMP_TOKEN_URL_ENV)
                .unwrap_or_else(|| DEFAULT_ONRAMP_TOKEN_URL.to_string()),
            redis_url: get(REDIS_URL_ENV),
            rate_limit_max_requests,
            public_api_url: get(PUBLIC_API_URL_ENV).or_else(|| get(NEXT_PUBLIC_API_URL_ENV)),
            log_format,
        }
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
