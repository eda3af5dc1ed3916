use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lexsrt::{ConfigLoadError, PipelineError};
use serde::{Deserialize, Serialize};
use wikidata::WikidataError;

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// A lookup outside a document run hit an unreachable Wikidata.
    #[error("remote service unavailable: {0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found")]
    NotFound,
}

/// API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    /// Document results gathered before a run stopped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial: Option<serde_json::Value>,
}

impl ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ServerError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Pipeline(err) => match err {
                PipelineError::InvalidLanguageCode(_) => StatusCode::BAD_REQUEST,
                PipelineError::Tokenize(_) => StatusCode::UNPROCESSABLE_ENTITY,
                PipelineError::RemoteServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
                PipelineError::Cancelled { .. } => StatusCode::REQUEST_TIMEOUT,
                PipelineError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ServerError::Upstream(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Internal(_) | ServerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ServerError::Authentication(_) => "AUTH_FAILED",
            ServerError::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            ServerError::BadRequest(_) => "BAD_REQUEST",
            ServerError::Pipeline(err) => match err {
                PipelineError::InvalidLanguageCode(_) => "INVALID_LANGUAGE_CODE",
                PipelineError::Tokenize(_) => "TOKENIZE_ERROR",
                PipelineError::RemoteServiceUnavailable { .. } => "REMOTE_SERVICE_UNAVAILABLE",
                PipelineError::Cancelled { .. } => "CANCELLED",
                PipelineError::Config(_) => "CONFIG_ERROR",
            },
            ServerError::Upstream(_) => "REMOTE_SERVICE_UNAVAILABLE",
            ServerError::Internal(_) => "INTERNAL_ERROR",
            ServerError::Config(_) => "CONFIG_ERROR",
            ServerError::NotFound => "NOT_FOUND",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let partial = match &self {
            ServerError::Pipeline(err) => err
                .partial()
                .and_then(|partial| serde_json::to_value(partial).ok()),
            _ => None,
        };

        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                partial,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ConfigLoadError> for ServerError {
    fn from(err: ConfigLoadError) -> Self {
        ServerError::Config(err.to_string())
    }
}

impl From<WikidataError> for ServerError {
    fn from(err: WikidataError) -> Self {
        match err {
            WikidataError::InvalidLanguageCode(code) => {
                ServerError::Pipeline(PipelineError::InvalidLanguageCode(code))
            }
            WikidataError::InvalidConfig(msg) => ServerError::Config(msg),
            other => ServerError::Upstream(other.to_string()),
        }
    }
}

impl From<matcher::MatchError> for ServerError {
    fn from(err: matcher::MatchError) -> Self {
        ServerError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        ServerError::Internal(format!("JSON encode error: {err}"))
    }
}
