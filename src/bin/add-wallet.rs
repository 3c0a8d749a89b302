// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;

use add_wallet_server::cli::{run, Cli};
use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let dir = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("✖ Cannot read the current directory: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli, &dir).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\n✖ An error occurred:");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
