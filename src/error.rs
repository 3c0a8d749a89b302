// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::models::{AccountType, ErrorResponse, RateLimitDetails};
use crate::providers::cdp::{CdpError, CdpErrorKind, ConfigurationError};
use crate::providers::onramp::OnrampError;

/// Failure categories shared by every handler.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Auth(String),

    #[error("{message}")]
    RateLimited {
        message: String,
        retry_after_secs: Option<u64>,
    },

    #[error("{0}")]
    Upstream(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CdpError> for AppError {
    fn from(e: CdpError) -> Self {
        let message = e.to_string();
        match e.kind() {
            CdpErrorKind::Authentication => AppError::Auth(message),
            CdpErrorKind::RateLimit => AppError::RateLimited {
                message,
                retry_after_secs: None,
            },
            CdpErrorKind::Other => AppError::Upstream(message),
        }
    }
}

impl From<OnrampError> for AppError {
    fn from(e: OnrampError) -> Self {
        AppError::Upstream(e.to_string())
    }
}

/// HTTP error response: `{ success: false, error, accountType?, details? }`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub account_type: Option<AccountType>,
    pub details: Option<RateLimitDetails>,
    pub retry_after_secs: Option<u64>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            account_type: None,
            details: None,
            retry_after_secs: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn method_not_allowed(method: &str) -> Self {
        Self::new(
            StatusCode::METHOD_NOT_ALLOWED,
            format!("Method {method} not allowed"),
        )
    }

    pub fn with_account_type(mut self, account_type: AccountType) -> Self {
        self.account_type = Some(account_type);
        self
    }

    pub fn with_details(mut self, details: RateLimitDetails) -> Self {
        self.details = Some(details);
        self
    }
}

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        let status = e.status();
        let retry_after_secs = match &e {
            AppError::RateLimited {
                retry_after_secs, ..
            } => *retry_after_secs,
            _ => None,
        };
        let mut error = ApiError::new(status, e.to_string());
        error.retry_after_secs = retry_after_secs;
        error
    }
}

impl From<ConfigurationError> for ApiError {
    fn from(e: ConfigurationError) -> Self {
        AppError::from(e).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            success: false,
            error: self.message,
            account_type: self.account_type,
            details: self.details,
        });
        let mut response = (self.status, body).into_response();
        if let Some(secs) = self.retry_after_secs {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
