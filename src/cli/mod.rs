// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # add-wallet CLI
//!
//! Non-interactive client for the wallet API.
//!
//! ```text
//! add-wallet create [--type eoa|smart-account|solana] [--preset-amount 5]
//! add-wallet topup [--address A] [--amount 25] [--blockchain base|solana]
//! add-wallet topup testnet [--address A] [--blockchain evm|solana]
//! ```
//!
//! `create` appends the new credentials to `./.env` and makes sure
//! `.gitignore` lists it. `topup` falls back to the address saved there.

pub mod api_client;
pub mod env_file;

use std::path::Path;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};

use self::api_client::{ApiClient, CreatedWallet, DEFAULT_API_URL};
use crate::models::{
    AccountType, FaucetBlockchain, FaucetRequest, OnrampBlockchain, OnrampSessionRequest,
};
use crate::validation::{is_valid_evm_address, is_valid_solana_address};

const DEFAULT_PRESET_AMOUNT: &str = "5";

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Api(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("File error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Parser)]
#[command(name = "add-wallet", version)]
#[command(about = "Create a crypto wallet instantly using Coinbase Developer Platform")]
pub struct Cli {
    /// Wallet API base URL.
    #[arg(long, env = "API_URL", default_value = DEFAULT_API_URL, global = true)]
    pub api_url: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a wallet and save its credentials to ./.env
    Create(CreateArgs),
    /// Print a Coinbase Pay link to fund a wallet
    Topup(TopupArgs),
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Wallet type to create.
    #[arg(long = "type", value_enum, default_value_t = AccountType::Eoa)]
    pub account_type: AccountType,

    /// USD amount pre-filled in the funding link.
    #[arg(long, default_value = DEFAULT_PRESET_AMOUNT)]
    pub preset_amount: String,
}

#[derive(Debug, Args)]
pub struct TopupArgs {
    #[command(subcommand)]
    pub command: Option<TopupCommand>,

    /// Address to fund. Defaults to the wallet saved in ./.env.
    #[arg(long)]
    pub address: Option<String>,

    /// USD amount pre-filled in the funding link.
    #[arg(long, default_value = DEFAULT_PRESET_AMOUNT)]
    pub amount: String,

    #[arg(long, value_enum, default_value_t = OnrampBlockchain::Base)]
    pub blockchain: OnrampBlockchain,
}

#[derive(Debug, Subcommand)]
pub enum TopupCommand {
    /// Claim testnet USDC from the CDP faucet
    Testnet(TestnetArgs),
}

#[derive(Debug, Args)]
pub struct TestnetArgs {
    /// Address to fund. Defaults to the wallet saved in ./.env.
    #[arg(long)]
    pub address: Option<String>,

    #[arg(long, value_enum, default_value_t = FaucetBlockchain::Evm)]
    pub blockchain: FaucetBlockchain,
}

/// Run a parsed command with `dir` as the working directory.
pub async fn run(cli: Cli, dir: &Path) -> Result<(), CliError> {
    let client = ApiClient::new(&cli.api_url)?;
    match cli.command {
        Command::Create(args) => create(&client, dir, args).await,
        Command::Topup(TopupArgs {
            command: Some(TopupCommand::Testnet(args)),
            ..
        }) => topup_testnet(&client, dir, args).await,
        Command::Topup(args) => topup(&client, dir, args).await,
    }
}

async fn create(client: &ApiClient, dir: &Path, args: CreateArgs) -> Result<(), CliError> {
    println!("Creating your {} wallet...", args.account_type);
    let wallet = client.create_wallet(args.account_type).await?;
    print_wallet(&wallet);

    let env_path = env_file::save_to_env_file(dir, &wallet, Utc::now())?;
    println!("Credentials saved to {}", env_path.display());
    if let Err(e) = env_file::ensure_gitignore(dir) {
        eprintln!("Warning: could not update .gitignore: {e}");
    }
    println!("Never commit .env or share your private key.\n");

    let blockchain = match wallet {
        CreatedWallet::Solana(_) => OnrampBlockchain::Solana,
        _ => OnrampBlockchain::Base,
    };
    let request = OnrampSessionRequest {
        address: wallet.funding_address().to_string(),
        preset_amount: Some(args.preset_amount.clone()),
        blockchain,
    };
    match client.create_onramp_session(&request).await {
        Ok(session) => print_onramp(&session.onramp_url, &args.preset_amount),
        Err(e) => {
            eprintln!("Could not generate funding link: {e}");
            println!("You can fund your wallet manually at https://pay.coinbase.com");
        }
    }

    println!("Wallet setup complete!");
    Ok(())
}

async fn topup(client: &ApiClient, dir: &Path, args: TopupArgs) -> Result<(), CliError> {
    let solana = args.blockchain == OnrampBlockchain::Solana;
    let address = resolve_address(dir, args.address, solana)?;

    let request = OnrampSessionRequest {
        address,
        preset_amount: Some(args.amount.clone()),
        blockchain: args.blockchain,
    };
    let session = client.create_onramp_session(&request).await?;
    print_onramp(&session.onramp_url, &args.amount);
    Ok(())
}

async fn topup_testnet(client: &ApiClient, dir: &Path, args: TestnetArgs) -> Result<(), CliError> {
    let solana = args.blockchain == FaucetBlockchain::Solana;
    let address = resolve_address(dir, args.address, solana)?;

    println!("Requesting testnet USDC for {address}...");
    let response = client
        .request_testnet_faucet(&FaucetRequest {
            address,
            blockchain: args.blockchain,
        })
        .await?;

    println!("Sent {} on {}", response.amount, response.network);
    println!("Transaction: {}", response.transaction_hash);
    println!("Explorer:    {}", response.explorer_url);
    Ok(())
}

/// Pick the explicit address or the one saved in `.env`, then check its format.
fn resolve_address(dir: &Path, address: Option<String>, solana: bool) -> Result<String, CliError> {
    let address = match address {
        Some(address) => address.trim().to_string(),
        None => {
            let found = env_file::find_wallet_address(dir, solana).ok_or_else(|| {
                CliError::InvalidInput(
                    "No wallet address found in .env. Pass one with --address.".to_string(),
                )
            })?;
            println!("Using wallet address from .env: {found}");
            found
        }
    };

    let valid = if solana {
        is_valid_solana_address(&address)
    } else {
        is_valid_evm_address(&address)
    };
    if !valid {
        let expected = if solana { "Solana" } else { "EVM (0x...)" };
        return Err(CliError::InvalidInput(format!(
            "Invalid {expected} address: {address}"
        )));
    }
    Ok(address)
}

fn print_wallet(wallet: &CreatedWallet) {
    match wallet {
        CreatedWallet::Eoa(w) => println!("Wallet address: {}", w.address),
        CreatedWallet::SmartAccount(w) => {
            println!("Smart Account address: {}", w.smart_account_address);
            println!("Owner EOA address:     {}", w.owner_address);
            if let Some(note) = &w.note {
                println!("Note: {note}");
            }
        }
        CreatedWallet::Solana(w) => println!("Wallet address: {}", w.address),
    }
    println!("Network: {}", wallet.network());
}

fn print_onramp(url: &str, amount: &str) {
    println!("Fund your wallet with Coinbase Pay:\n");
    println!("{url}\n");
    println!("The link is pre-filled with ${amount} for quick checkout.\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_create_with_type() {
        let cli = Cli::try_parse_from(["add-wallet", "create", "--type", "smart-account"]).unwrap();
        match cli.command {
            Command::Create(args) => {
                assert_eq!(args.account_type, AccountType::SmartAccount);
                assert_eq!(args.preset_amount, "5");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_topup_testnet() {
        let cli = Cli::try_parse_from([
            "add-wallet",
            "topup",
            "testnet",
            "--blockchain",
            "solana",
        ])
        .unwrap();
        match cli.command {
            Command::Topup(TopupArgs {
                command: Some(TopupCommand::Testnet(args)),
                ..
            }) => assert_eq!(args.blockchain, FaucetBlockchain::Solana),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn address_falls_back_to_env_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            resolve_address(dir.path(), None, false),
            Err(CliError::InvalidInput(_))
        ));

        let address = "0x52908400098527886E0F7030069857D2E4169EE7";
        std::fs::write(
            dir.path().join(env_file::ENV_FILE),
            format!("WALLET_ADDRESS={address}\n"),
        )
        .unwrap();
        assert_eq!(resolve_address(dir.path(), None, false).unwrap(), address);
    }

    #[test]
    fn explicit_address_is_validated_for_its_chain() {
        let dir = tempfile::tempdir().unwrap();
        let evm = "0x52908400098527886E0F7030069857D2E4169EE7".to_string();
        assert!(resolve_address(dir.path(), Some(evm.clone()), false).is_ok());
        assert!(resolve_address(dir.path(), Some(evm), true).is_err());
    }
}
