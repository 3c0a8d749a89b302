// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! `.env` and `.gitignore` handling for created wallets.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};

use super::api_client::CreatedWallet;
use super::CliError;

pub const ENV_FILE: &str = ".env";
pub const GITIGNORE_FILE: &str = ".gitignore";

pub const WALLET_ADDRESS_KEY: &str = "WALLET_ADDRESS";
pub const WALLET_PRIVATE_KEY_KEY: &str = "WALLET_PRIVATE_KEY";
pub const SMART_ACCOUNT_ADDRESS_KEY: &str = "SMART_ACCOUNT_ADDRESS";
pub const OWNER_ADDRESS_KEY: &str = "OWNER_ADDRESS";
pub const OWNER_PRIVATE_KEY_KEY: &str = "OWNER_PRIVATE_KEY";
pub const SOLANA_WALLET_ADDRESS_KEY: &str = "SOLANA_WALLET_ADDRESS";
pub const SOLANA_PRIVATE_KEY_KEY: &str = "SOLANA_PRIVATE_KEY";

/// Append the wallet's credentials to `dir/.env`, creating it owner-only.
pub fn save_to_env_file(
    dir: &Path,
    wallet: &CreatedWallet,
    created_at: DateTime<Utc>,
) -> Result<PathBuf, CliError> {
    let path = dir.join(ENV_FILE);

    let mut content = match fs::read_to_string(&path) {
        Ok(mut existing) => {
            if !existing.is_empty() && !existing.ends_with('\n') {
                existing.push('\n');
            }
            existing.push('\n');
            existing
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(CliError::Io(e)),
    };

    content.push_str(&format!(
        "# Wallet created on {}\n",
        created_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    ));
    for (key, value) in env_entries(wallet) {
        content.push_str(&format!("{key}={value}\n"));
    }
    content.push_str("\n# Run 'add-wallet topup' at any time to topup your wallet\n");
    content.push_str(
        "# Run 'add-wallet topup testnet' at any time to topup your wallet with testnet USDC\n",
    );

    write_private(&path, &content)?;
    Ok(path)
}

fn env_entries(wallet: &CreatedWallet) -> Vec<(&'static str, &str)> {
    match wallet {
        CreatedWallet::Eoa(w) => vec![
            (WALLET_ADDRESS_KEY, w.address.as_str()),
            (WALLET_PRIVATE_KEY_KEY, w.private_key.as_str()),
        ],
        CreatedWallet::SmartAccount(w) => vec![
            (SMART_ACCOUNT_ADDRESS_KEY, w.smart_account_address.as_str()),
            (OWNER_ADDRESS_KEY, w.owner_address.as_str()),
            (OWNER_PRIVATE_KEY_KEY, w.owner_private_key.as_str()),
        ],
        CreatedWallet::Solana(w) => vec![
            (SOLANA_WALLET_ADDRESS_KEY, w.address.as_str()),
            (SOLANA_PRIVATE_KEY_KEY, w.private_key.as_str()),
        ],
    }
}

#[cfg(unix)]
fn write_private(path: &Path, content: &str) -> Result<(), CliError> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // `mode` only applies on creation.
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

#[cfg(not(unix))]
fn write_private(path: &Path, content: &str) -> Result<(), CliError> {
    let mut file = fs::File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// Make sure `dir/.gitignore` mentions `.env`. Returns whether it was changed.
pub fn ensure_gitignore(dir: &Path) -> Result<bool, CliError> {
    let path = dir.join(GITIGNORE_FILE);

    let mut content = match fs::read_to_string(&path) {
        Ok(existing) if existing.contains(ENV_FILE) => return Ok(false),
        Ok(mut existing) => {
            if !existing.is_empty() && !existing.ends_with('\n') {
                existing.push('\n');
            }
            existing
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(CliError::Io(e)),
    };

    content.push_str("\n# Environment variables (added by add-wallet)\n");
    content.push_str(ENV_FILE);
    content.push('\n');
    fs::write(&path, content)?;
    Ok(true)
}

/// Look up a wallet address previously saved in `dir/.env`.
///
/// EVM lookups prefer `WALLET_ADDRESS` over `SMART_ACCOUNT_ADDRESS`.
pub fn find_wallet_address(dir: &Path, solana: bool) -> Option<String> {
    let content = fs::read_to_string(dir.join(ENV_FILE)).ok()?;
    let keys: &[&str] = if solana {
        &[SOLANA_WALLET_ADDRESS_KEY]
    } else {
        &[WALLET_ADDRESS_KEY, SMART_ACCOUNT_ADDRESS_KEY]
    };

    keys.iter().find_map(|key| env_value(&content, key))
}

/// First non-empty value assigned to `key`.
fn env_value(content: &str, key: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .find(|(k, _)| k.trim() == key)
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
