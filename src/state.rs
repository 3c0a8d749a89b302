// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::config::Config;
use crate::providers::cdp::CdpClientGuard;
use crate::providers::onramp::{OnrampClient, OnrampError};
use crate::rate_limit::{build_store, CounterStore, RateLimitConfig, RateLimiter};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cdp: Arc<CdpClientGuard>,
    pub rate_limiter: Arc<RateLimiter>,
    pub onramp: Arc<OnrampClient>,
}

impl AppState {
    /// Assemble production state: credentials from the environment and the
    /// counter store selected by `REDIS_URL`.
    pub fn from_config(config: Config) -> Result<Self, OnrampError> {
        let cdp = CdpClientGuard::from_env(config.cdp_api_base_url.clone());
        let store = build_store(config.redis_url.as_deref());
        Self::with_parts(config, cdp, store)
    }

    /// Assemble state from explicit parts.
    pub fn with_parts(
        config: Config,
        cdp: CdpClientGuard,
        store: Arc<dyn CounterStore>,
    ) -> Result<Self, OnrampError> {
        let onramp = OnrampClient::new(&config.onramp_token_url)?;
        let limiter = RateLimiter::new(
            store,
            RateLimitConfig {
                max_requests: config.rate_limit_max_requests,
                ..RateLimitConfig::default()
            },
        );

        Ok(Self {
            config: Arc::new(config),
            cdp: Arc::new(cdp),
            rate_limiter: Arc::new(limiter),
            onramp: Arc::new(onramp),
        })
    }
}
