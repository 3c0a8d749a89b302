// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    error::ApiError,
    gate::request_gate,
    models::{
        AccountType, CheckResult, EoaWalletResponse, ErrorResponse, FaucetBlockchain,
        FaucetRequest, FaucetResponse, HealthChecks, HealthResponse, OnrampBlockchain,
        OnrampSessionRequest, OnrampSessionResponse, RateLimitDetails, SmartAccountResponse,
        SolanaWalletResponse,
    },
    state::AppState,
};

pub mod extract;
pub mod faucet;
pub mod health;
pub mod onramp;
pub mod wallet;

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route(
            "/wallet/eoa",
            get(wallet::describe_eoa).post(wallet::create_eoa_wallet),
        )
        .route(
            "/wallet/smart-account",
            get(wallet::describe_smart_account).post(wallet::create_smart_account),
        )
        .route(
            "/wallet/solana",
            get(wallet::describe_solana).post(wallet::create_solana_wallet),
        )
        .route(
            "/faucet/testnet",
            get(faucet::describe_faucet).post(faucet::request_testnet_funds),
        )
        .route("/onramp/session", post(onramp::create_onramp_session))
        .route("/health", get(health::health));

    // The gate wraps CORS so preflights get its fixed answer.
    Router::new()
        .nest("/api", api_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn_with_state(state.clone(), request_gate))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

async fn not_found() -> ApiError {
    ApiError::new(axum::http::StatusCode::NOT_FOUND, "Not found")
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "add-wallet API",
        description = "Create CDP wallets, claim testnet funds and build Coinbase Pay onramp links."
    ),
    paths(
        wallet::create_eoa_wallet,
        wallet::describe_eoa,
        wallet::create_smart_account,
        wallet::describe_smart_account,
        wallet::create_solana_wallet,
        wallet::describe_solana,
        faucet::request_testnet_funds,
        faucet::describe_faucet,
        onramp::create_onramp_session,
        health::health
    ),
    components(
        schemas(
            AccountType,
            EoaWalletResponse,
            SmartAccountResponse,
            SolanaWalletResponse,
            FaucetBlockchain,
            FaucetRequest,
            FaucetResponse,
            OnrampBlockchain,
            OnrampSessionRequest,
            OnrampSessionResponse,
            CheckResult,
            HealthChecks,
            HealthResponse,
            RateLimitDetails,
            ErrorResponse
        )
    ),
    tags(
        (name = "Wallet", description = "Wallet creation (rate limited per client IP)"),
        (name = "Faucet", description = "Testnet USDC"),
        (name = "Onramp", description = "Coinbase Pay purchase links"),
        (name = "Health", description = "Service health")
    )
)]
pub struct ApiDoc;
