// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JSON body extractor that rejects with the API error shape.
//!
//! ```rust,ignore
//! async fn handler(ApiJson(request): ApiJson<FaucetRequest>) -> impl IntoResponse {
//!     // a malformed body never reaches here
//! }
//! ```

use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ApiError;

/// Like [`Json`], but a body that cannot be parsed produces
/// `{success:false, error}` with the rejection's status.
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                debug!(error = %rejection.body_text(), "Rejected request body");
                Err(ApiError::new(rejection.status(), rejection.body_text()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FaucetRequest;
    use axum::{
        body::{to_bytes, Body},
        http::StatusCode,
        response::IntoResponse,
    };

    fn json_request(body: &'static str) -> Request {
        axum::http::Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn valid_body_is_parsed() {
        let ApiJson(request) =
            ApiJson::<FaucetRequest>::from_request(json_request(r#"{"address":"0xabc"}"#), &())
                .await
                .unwrap_or_else(|_| panic!("body should parse"));
        assert_eq!(request.address, "0xabc");
    }

    #[tokio::test]
    async fn malformed_body_is_a_json_error() {
        let rejection = match ApiJson::<FaucetRequest>::from_request(json_request("{not json"), &())
            .await
        {
            Ok(_) => panic!("body should be rejected"),
            Err(e) => e,
        };

        let response = rejection.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("JSON"));
    }
}
