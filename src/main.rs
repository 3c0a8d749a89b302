// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::net::SocketAddr;
use std::time::Duration;

use add_wallet_server::{api::router, config::Config, logging, state::AppState};
use axum_server::Handle;
use tokio::signal;
use tracing::{error, info};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();
    logging::init(config.log_format);

    let addr = config.bind_addr()?;
    info!(
        %addr,
        redis = config.redis_url.is_some(),
        max_requests = config.rate_limit_max_requests,
        "add-wallet server starting"
    );

    let state = AppState::from_config(config)?;
    let missing = state.cdp.missing_credentials();
    if !missing.is_empty() {
        // Wallet routes answer 500 until these are set.
        error!(?missing, "CDP credentials are not configured");
    }

    let app = router(state);

    let handle: Handle<SocketAddr> = Handle::new();
    tokio::spawn(shutdown_signal(handle.clone()));

    info!("add-wallet server listening on http://{addr} (docs at /docs)");
    axum_server::bind(addr)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;

    info!("add-wallet server stopped");
    Ok(())
}

async fn shutdown_signal(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }

    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}
