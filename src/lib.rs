// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! add-wallet - Wallet provisioning over the Coinbase Developer Platform
//!
//! This crate provides an HTTP API that creates EOA, Smart Account and Solana
//! wallets through CDP, requests testnet funds and builds Coinbase Pay onramp
//! links, plus the `add-wallet` CLI that drives it.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `gate` - CORS preflight, method allow-list and wallet rate limiting
//! - `rate_limit` - Per-IP fixed window limiter over Redis
//! - `providers` - CDP REST client, client guard and onramp client
//! - `cli` - `add-wallet` command implementation

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod gate;
pub mod logging;
pub mod models;
pub mod providers;
pub mod rate_limit;
pub mod state;
pub mod validation;
