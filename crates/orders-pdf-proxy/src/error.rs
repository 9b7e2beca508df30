//! Error types for the PDF proxy.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use orders_pdf_core::{CredentialError, FetchOutcome};
use serde::Serialize;

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Provide item_id and/or url")]
    MissingIdentifier,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Upstream authentication failed: {0}")]
    UpstreamAuth(String),

    #[error("Document not found (last strategy {strategy}: {detail})")]
    NotFound {
        strategy: &'static str,
        detail: String,
    },

    #[error("Upstream error (strategy {strategy}: {message})")]
    Upstream {
        strategy: &'static str,
        code: Option<u16>,
        message: String,
    },

    #[error("Could not fetch PDF (last strategy {strategy}: {reason})")]
    NotAPdf {
        strategy: &'static str,
        reason: String,
    },

    #[error("Document exceeds the maximum size ({size} > {limit} bytes)")]
    TooLarge { size: u64, limit: u64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    /// Terminal error for a strategy's failed outcome.
    pub fn from_outcome<D>(strategy: &'static str, outcome: &FetchOutcome<D>) -> Self {
        match outcome {
            FetchOutcome::NotFound { .. } => ProxyError::NotFound {
                strategy,
                detail: outcome.describe(),
            },
            FetchOutcome::ValidationFailed(_) => ProxyError::NotAPdf {
                strategy,
                reason: outcome.describe(),
            },
            FetchOutcome::UpstreamError { code, .. } => ProxyError::Upstream {
                strategy,
                code: *code,
                message: outcome.describe(),
            },
            FetchOutcome::Success(_) => {
                ProxyError::Internal(format!("strategy {} succeeded but was reported as failed", strategy))
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingIdentifier | ProxyError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::Config(_) | ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::UpstreamAuth(_) | ProxyError::Upstream { .. } | ProxyError::NotAPdf { .. } => {
                StatusCode::BAD_GATEWAY
            }
            ProxyError::NotFound { .. } => StatusCode::NOT_FOUND,
            ProxyError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ProxyError::MissingIdentifier => "MISSING_IDENTIFIER",
            ProxyError::BadRequest(_) => "BAD_REQUEST",
            ProxyError::Config(_) => "CONFIG_ERROR",
            ProxyError::UpstreamAuth(_) => "UPSTREAM_AUTH_ERROR",
            ProxyError::NotFound { .. } => "NOT_FOUND",
            ProxyError::Upstream { .. } => "UPSTREAM_ERROR",
            ProxyError::NotAPdf { .. } => "VALIDATION_FAILED",
            ProxyError::TooLarge { .. } => "PAYLOAD_TOO_LARGE",
            ProxyError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<CredentialError> for ProxyError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::NotConfigured(_) => ProxyError::Config(err.to_string()),
            CredentialError::Rejected(_) | CredentialError::Unreachable(_) => {
                ProxyError::UpstreamAuth(err.to_string())
            }
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorBody {
            error: String,
            code: &'static str,
        }

        let body = ErrorBody {
            error: self.to_string(),
            code: self.code(),
        };

        (self.status(), axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;
