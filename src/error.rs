//! Error types for the mail classifier.

use std::time::Duration;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limit reached, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}: invalid API key")]
    AuthFailed { provider: String },

    #[error("Model {model} not available on provider {provider}")]
    ModelNotAvailable { provider: String, model: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of a single email within a batch.
///
/// These never abort the batch; the processor turns them into a
/// `BatchError` entry (plus a degraded result when the email has an id).
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("Email missing ID")]
    MissingId,

    #[error("Empty response from OpenAI")]
    EmptyResponse,

    /// No `{` anywhere in the completion.
    #[error("Invalid JSON response from OpenAI")]
    NoJsonFound,

    /// A candidate object was found but did not parse.
    #[error("Invalid JSON response from OpenAI")]
    InvalidJson,

    #[error("Invalid classification format")]
    InvalidFormat,

    #[error("{0}")]
    Llm(#[from] LlmError),
}

/// Batch-level failures surfaced as an HTTP status plus `{ "error": ... }`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Invalid provider key")]
    InvalidProviderKey,

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::InvalidProviderKey => StatusCode::UNAUTHORIZED,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Classify an opaque failure by what its message mentions.
    pub fn from_failure_message(message: &str) -> Self {
        if message.contains("API key") {
            Self::InvalidProviderKey
        } else if message.contains("rate limit") {
            Self::RateLimited
        } else if message.trim().is_empty() {
            Self::Internal("Failed to classify emails".to_string())
        } else {
            Self::Internal(message.to_string())
        }
    }
}

impl From<LlmError> for ApiError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::AuthFailed { .. } => Self::InvalidProviderKey,
            LlmError::RateLimited { .. } => Self::RateLimited,
            other => Self::from_failure_message(&other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
