// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Lazily constructed, shared CDP client handle.
//!
//! The guard lives in `AppState` and hands every handler the same
//! `Arc<CdpClient>`. Credentials are validated only before the first
//! construction; after that the cached handle is returned until
//! [`CdpClientGuard::reset_client`] drops it.
//!
//! Construction is not serialized. Two requests racing on an empty guard may
//! both validate and build a client; the first one stored wins and the other
//! is discarded.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{info, warn};

use super::{CdpClient, CdpCredentials};
use crate::config::{
    CDP_API_KEY_ID_ENV, CDP_API_KEY_SECRET_ENV, CDP_WALLET_SECRET_ENV, REQUIRED_CDP_CREDENTIALS,
};

/// Missing or unusable platform credentials.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error(
        "Missing required environment variables: {}. Please check your .env file and ensure all CDP credentials are set.",
        .0.join(", ")
    )]
    MissingCredentials(Vec<String>),

    #[error("Invalid {name}: {reason}")]
    InvalidCredential { name: &'static str, reason: String },
}

type CredentialLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Owner of the process-wide CDP client.
pub struct CdpClientGuard {
    lookup: CredentialLookup,
    base_url: String,
    slot: RwLock<Option<Arc<CdpClient>>>,
}

impl CdpClientGuard {
    /// Guard reading credentials from the process environment.
    pub fn from_env(base_url: impl Into<String>) -> Self {
        Self::with_lookup(base_url, |name| std::env::var(name).ok())
    }

    /// Guard reading credentials through `lookup`.
    pub fn with_lookup<F>(base_url: impl Into<String>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            lookup: Arc::new(lookup),
            base_url: base_url.into(),
            slot: RwLock::new(None),
        }
    }

    /// Return the shared client, constructing it on first use.
    pub fn get_client(&self) -> Result<Arc<CdpClient>, ConfigurationError> {
        if let Some(client) = self.cached() {
            return Ok(client);
        }

        let credentials = self.credentials()?;
        let client = CdpClient::new(&credentials, &self.base_url).map_err(|(name, reason)| {
            warn!(credential = name, %reason, "CDP credential rejected");
            ConfigurationError::InvalidCredential { name, reason }
        })?;

        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        let client = slot.get_or_insert_with(|| {
            info!(key_id = %credentials.api_key_id, "CDP client initialized");
            Arc::new(client)
        });
        Ok(Arc::clone(client))
    }

    /// Drop the cached client so the next call re-validates and rebuilds.
    pub fn reset_client(&self) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
    }

    /// Whether a client has been constructed.
    pub fn is_initialized(&self) -> bool {
        self.cached().is_some()
    }

    /// Names of required credentials that are currently unset or blank.
    pub fn missing_credentials(&self) -> Vec<String> {
        REQUIRED_CDP_CREDENTIALS
            .iter()
            .filter(|name| self.lookup_trimmed(name).is_none())
            .map(|name| name.to_string())
            .collect()
    }

    fn cached(&self) -> Option<Arc<CdpClient>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Arc::clone)
    }

    fn lookup_trimmed(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn credentials(&self) -> Result<CdpCredentials, ConfigurationError> {
        let missing = self.missing_credentials();
        if !missing.is_empty() {
            return Err(ConfigurationError::MissingCredentials(missing));
        }

        let require = |name: &str| {
            self.lookup_trimmed(name)
                .ok_or_else(|| ConfigurationError::MissingCredentials(vec![name.to_string()]))
        };

        Ok(CdpCredentials {
            api_key_id: require(CDP_API_KEY_ID_ENV)?,
            api_key_secret: require(CDP_API_KEY_SECRET_ENV)?,
            wallet_secret: require(CDP_WALLET_SECRET_ENV)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::cdp::auth::test_keys;
    use std::collections::HashMap;

    const BASE_URL: &str = "https://api.cdp.coinbase.com/platform";

    fn guard_with(vars: HashMap<&'static str, String>) -> CdpClientGuard {
        CdpClientGuard::with_lookup(BASE_URL, move |name| vars.get(name).cloned())
    }

    fn valid_vars() -> HashMap<&'static str, String> {
        HashMap::from([
            (CDP_API_KEY_ID_ENV, "organizations/o/apiKeys/k".to_string()),
            (CDP_API_KEY_SECRET_ENV, test_keys::api_key_secret()),
            (CDP_WALLET_SECRET_ENV, test_keys::wallet_secret()),
        ])
    }

    #[test]
    fn repeated_calls_return_the_same_handle() {
        let guard = guard_with(valid_vars());
        let first = guard.get_client().expect("client");
        let second = guard.get_client().expect("client");
        assert!(Arc::ptr_eq(&first, &second));
        assert!(guard.is_initialized());
    }

    #[test]
    fn reset_forces_a_new_handle() {
        let guard = guard_with(valid_vars());
        let first = guard.get_client().expect("client");
        guard.reset_client();
        assert!(!guard.is_initialized());
        let second = guard.get_client().expect("client");
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn missing_credentials_are_all_named() {
        let mut vars = valid_vars();
        vars.remove(CDP_API_KEY_ID_ENV);
        vars.insert(CDP_WALLET_SECRET_ENV, "   ".to_string());
        let guard = guard_with(vars);

        let err = guard.get_client().unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::MissingCredentials(vec![
                "CDP_API_KEY_ID".to_string(),
                "CDP_WALLET_SECRET".to_string()
            ])
        );
        let message = err.to_string();
        assert!(message.starts_with("Missing required environment variables"));
        assert!(message.contains("CDP_API_KEY_ID"));
        assert!(message.contains("CDP_WALLET_SECRET"));
        assert!(!message.contains("CDP_API_KEY_SECRET"));
        assert!(!guard.is_initialized());
    }

    #[test]
    fn no_credentials_names_all_three() {
        let guard = guard_with(HashMap::new());
        let message = guard.get_client().unwrap_err().to_string();
        for name in REQUIRED_CDP_CREDENTIALS {
            assert!(message.contains(name), "{name} missing from: {message}");
        }
    }

    #[test]
    fn unparseable_secret_is_a_configuration_error() {
        let mut vars = valid_vars();
        vars.insert(CDP_API_KEY_SECRET_ENV, "definitely-not-a-key".to_string());
        let guard = guard_with(vars);

        match guard.get_client() {
            Err(ConfigurationError::InvalidCredential { name, .. }) => {
                assert_eq!(name, "CDP_API_KEY_SECRET")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn cached_handle_survives_credential_removal() {
        let vars = Arc::new(RwLock::new(valid_vars()));
        let source = Arc::clone(&vars);
        let guard = CdpClientGuard::with_lookup(BASE_URL, move |name| {
            source.read().unwrap().get(name).cloned()
        });

        let first = guard.get_client().expect("client");
        vars.write().unwrap().clear();
        let second = guard.get_client().expect("cached client");
        assert!(Arc::ptr_eq(&first, &second));
        assert!(!guard.missing_credentials().is_empty());
    }
}
