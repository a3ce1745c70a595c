use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Blockchain RPC error: {0}")]
    BlockchainRPC(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Recipient could not be resolved: {0}")]
    RecipientUnresolved(String),

    #[error("External API error: {0}")]
    ExternalAPI(String),

    #[error("Unexpected response shape: {0}")]
    SchemaMismatch(String),

    #[error("{0}")]
    MalformedResponse(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Failure of a single upstream lookup (RPC node, username API, resolver API).
///
/// These never reach HTTP callers directly: the resolver chain logs them and
/// moves on to the next provider, the activity reader degrades the affected
/// token.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("schema mismatch: {0}")]
    Schema(String),

    #[error("upstream returned HTTP {0}")]
    Status(u16),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return ProviderError::Status(status.as_u16());
        }
        if err.is_decode() {
            return ProviderError::Schema(err.to_string());
        }
        ProviderError::Transport(err.to_string())
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Redis(ref e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CACHE_ERROR",
                e.to_string(),
            ),
            AppError::BlockchainRPC(ref msg) => (
                StatusCode::BAD_GATEWAY,
                "BLOCKCHAIN_RPC_ERROR",
                msg.clone(),
            ),
            AppError::BadRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone())
            }
            AppError::RecipientUnresolved(ref msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "RECIPIENT_UNRESOLVED",
                msg.clone(),
            ),
            AppError::ExternalAPI(ref msg) => {
                (StatusCode::BAD_GATEWAY, "EXTERNAL_API_ERROR", msg.clone())
            }
            AppError::SchemaMismatch(ref msg) => {
                (StatusCode::BAD_GATEWAY, "SCHEMA_MISMATCH", msg.clone())
            }
            AppError::MalformedResponse(ref msg) => {
                (StatusCode::BAD_GATEWAY, "MALFORMED_RESPONSE", msg.clone())
            }
            AppError::Internal(ref msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg.clone(),
            ),
        };

        let body = Json(ErrorResponse {
            success: false,
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: None,
            },
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
