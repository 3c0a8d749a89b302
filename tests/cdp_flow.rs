// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet, faucet and onramp endpoints against a local stand-in for CDP.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use add_wallet_server::{
    api::router,
    config::{Config, CDP_API_KEY_ID_ENV, CDP_API_KEY_SECRET_ENV, CDP_WALLET_SECRET_ENV},
    providers::cdp::CdpClientGuard,
    rate_limit::MemoryCounterStore,
    state::AppState,
};
use axum::{
    body::{to_bytes, Body},
    extract::{Path, State},
    http::{HeaderMap, Request, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use base64ct::{Base64, Encoding};
use p256::pkcs8::EncodePrivateKey;
use rand::RngCore;
use rsa::{pkcs8::DecodePublicKey, Oaep, RsaPublicKey};
use serde_json::{json, Value};
use sha2::Sha256;
use tower::ServiceExt;

const EVM_ADDRESS: &str = "0x52908400098527886E0F7030069857D2E4169EE7";
const SMART_ADDRESS: &str = "0xde709f2102306220921060314715629080e2fb77";
const EVM_SECRET: [u8; 32] = [0x11; 32];
const SOLANA_PUBKEY: [u8; 32] = [5; 32];
const SOLANA_SEED: [u8; 32] = [7; 32];

/// Headers seen by the stand-in, keyed by request path.
type Seen = Arc<Mutex<HashMap<String, HeaderMap>>>;

fn record(seen: &Seen, path: &str, headers: &HeaderMap) {
    seen.lock().unwrap().insert(path.to_string(), headers.clone());
}

fn encrypt_to(body: &Value, secret: &[u8]) -> String {
    let der = Base64::decode_vec(body["exportEncryptionKey"].as_str().unwrap()).unwrap();
    let key = RsaPublicKey::from_public_key_der(&der).unwrap();
    let ciphertext = key
        .encrypt(&mut rand::rngs::OsRng, Oaep::new::<Sha256>(), secret)
        .unwrap();
    Base64::encode_string(&ciphertext)
}

fn platform(seen: Seen) -> Router {
    Router::new()
        .route(
            "/platform/v2/evm/accounts",
            post(|State(seen): State<Seen>, headers: HeaderMap| async move {
                record(&seen, "evm/accounts", &headers);
                Json(json!({ "address": EVM_ADDRESS }))
            }),
        )
        .route(
            "/platform/v2/evm/accounts/{address}/export",
            post(|Path(address): Path<String>, Json(body): Json<Value>| async move {
                assert_eq!(address, EVM_ADDRESS);
                Json(json!({ "encryptedPrivateKey": encrypt_to(&body, &EVM_SECRET) }))
            }),
        )
        .route(
            "/platform/v2/evm/smart-accounts",
            post(
                |State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>| async move {
                    record(&seen, "evm/smart-accounts", &headers);
                    Json(json!({ "address": SMART_ADDRESS, "owners": body["owners"] }))
                },
            ),
        )
        .route(
            "/platform/v2/solana/accounts",
            post(|| async { Json(json!({ "address": bs58::encode(SOLANA_PUBKEY).into_string() })) }),
        )
        .route(
            "/platform/v2/solana/accounts/{address}/export",
            post(|Json(body): Json<Value>| async move {
                Json(json!({ "encryptedPrivateKey": encrypt_to(&body, &SOLANA_SEED) }))
            }),
        )
        .route(
            "/platform/v2/evm/faucet",
            post(|| async {
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({ "errorMessage": "Faucet rate limit exceeded" })),
                )
                    .into_response()
            }),
        )
        .route(
            "/platform/v2/solana/faucet",
            post(|| async { Json(json!({ "transactionSignature": "5ig" })) }),
        )
        .route(
            "/onramp/v1/token",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["assets"][0], "USDC");
                assert_eq!(body["addresses"][0]["blockchains"][0], "base");
                Json(json!({ "data": { "token": "tok123" } }))
            }),
        )
        .with_state(seen)
}

async fn spawn_platform() -> (String, Seen) {
    let seen: Seen = Arc::default();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = platform(seen.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), seen)
}

fn credentials() -> HashMap<String, String> {
    let mut api_key = [0u8; 64];
    rand::thread_rng().fill_bytes(&mut api_key);
    let wallet = p256::SecretKey::random(&mut rand::rngs::OsRng)
        .to_pkcs8_der()
        .unwrap();

    HashMap::from([
        (CDP_API_KEY_ID_ENV.to_string(), "organizations/o/apiKeys/k".to_string()),
        (CDP_API_KEY_SECRET_ENV.to_string(), Base64::encode_string(&api_key)),
        (CDP_WALLET_SECRET_ENV.to_string(), Base64::encode_string(wallet.as_bytes())),
    ])
}

async fn app() -> (Router, Seen) {
    let (base, seen) = spawn_platform().await;
    let config = Config {
        cdp_api_base_url: format!("{base}/platform"),
        onramp_token_url: format!("{base}/onramp/v1/token"),
        ..Config::default()
    };
    let vars = credentials();
    let guard = CdpClientGuard::with_lookup(config.cdp_api_base_url.clone(), move |name| {
        vars.get(name).cloned()
    });
    let state =
        AppState::with_parts(config, guard, Arc::new(MemoryCounterStore::new())).unwrap();
    (router(state), seen)
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .header("x-forwarded-for", "198.51.100.1")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn eoa_is_created_and_exported() {
    let (app, seen) = app().await;
    let (status, body) = post_json(app, "/api/wallet/eoa", json!({})).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["accountType"], "eoa");
    assert_eq!(body["address"], EVM_ADDRESS);
    assert_eq!(body["privateKey"], "11".repeat(32));
    assert_eq!(body["network"], "base-mainnet");

    let seen = seen.lock().unwrap();
    let headers = &seen["evm/accounts"];
    assert!(headers["authorization"].to_str().unwrap().starts_with("Bearer "));
    assert!(headers.contains_key("x-wallet-auth"));
}

#[tokio::test]
async fn smart_account_is_owned_by_a_fresh_eoa() {
    let (app, seen) = app().await;
    let (status, body) = post_json(app, "/api/wallet/smart-account", json!({})).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["smartAccountAddress"], SMART_ADDRESS);
    assert_eq!(body["ownerAddress"], EVM_ADDRESS);
    assert_eq!(body["ownerPrivateKey"], "11".repeat(32));
    assert!(body["note"].as_str().unwrap().contains("first transaction"));

    let seen = seen.lock().unwrap();
    assert!(!seen["evm/smart-accounts"].contains_key("x-wallet-auth"));
}

#[tokio::test]
async fn solana_key_is_seed_followed_by_public_key() {
    let (app, _) = app().await;
    let (status, body) = post_json(app, "/api/wallet/solana", json!({})).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["network"], "solana-mainnet");
    let keypair = bs58::decode(body["privateKey"].as_str().unwrap())
        .into_vec()
        .unwrap();
    assert_eq!(&keypair[..32], &SOLANA_SEED);
    assert_eq!(&keypair[32..], &SOLANA_PUBKEY);
}

#[tokio::test]
async fn faucet_rate_limit_is_reported_as_429() {
    let (app, _) = app().await;
    let (status, body) =
        post_json(app, "/api/faucet/testnet", json!({ "address": EVM_ADDRESS })).await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        body["error"],
        "Rate limit exceeded. Please try again in 24 hours."
    );
}

#[tokio::test]
async fn solana_faucet_links_to_devnet_explorer() {
    let (app, _) = app().await;
    let address = bs58::encode(SOLANA_PUBKEY).into_string();
    let (status, body) = post_json(
        app,
        "/api/faucet/testnet",
        json!({ "address": address, "blockchain": "solana" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["network"], "solana-devnet");
    assert_eq!(body["amount"], "1 USDC");
    assert_eq!(
        body["explorerUrl"],
        "https://explorer.solana.com/tx/5ig?cluster=devnet"
    );
}

#[tokio::test]
async fn onramp_session_returns_prefilled_link() {
    let (app, _) = app().await;
    let (status, body) = post_json(
        app,
        "/api/onramp/session",
        json!({ "address": EVM_ADDRESS, "presetAmount": "10" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["expiresIn"], "5 minutes");
    assert_eq!(
        body["onrampUrl"],
        "https://pay.coinbase.com/buy?sessionToken=tok123&defaultAsset=USDC&presetFiatAmount=10&fiatCurrency=USD"
    );
}
