//! エラー型定義
//!
//! 統一エラー型（thiserror使用）
//!
//! # OpenAI互換エラーレスポンス
//!
//! `GatewayError`は`error_type()`と`status_code()`メソッドを提供し、
//! OpenAI互換のエラーレスポンスを生成できます。

use axum::http::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Common layer error type
#[derive(Debug, Error)]
pub enum CommonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parse error
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// gateway error type
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Request body could not be parsed for routing
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Model is not registered (or has no endpoints)
    #[error("The model '{0}' does not exist")]
    ModelNotFound(String),

    /// Endpoint was selected but has no forwarding target
    #[error("No proxy configured for provider '{0}'")]
    NoProxy(String),

    /// Candidates were non-empty but nothing could be selected
    #[error("Failed to select a backend for model '{0}'")]
    SelectionFailed(String),

    /// HTTP client error
    #[error("HTTP client error: {0}")]
    Http(String),

    /// Timeout error
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Request body exceeded the accepted size
    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),
}

impl GatewayError {
    /// Returns a safe error message for external clients.
    ///
    /// Backend addresses and provider names stay in server logs; use the
    /// `Display` implementation for those.
    pub fn external_message(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "Invalid request body",
            Self::ModelNotFound(_) => "Model not found",
            Self::NoProxy(_) => "No proxy available for the selected backend",
            Self::SelectionFailed(_) => "Unable to select a backend for the model",
            Self::Http(_) => "Backend service unavailable",
            Self::Timeout(_) => "Request timeout",
            Self::PayloadTooLarge(_) => "Request body too large",
        }
    }

    /// Message returned to the caller.
    ///
    /// Request-shaped errors echo the caller's own input back; everything
    /// else falls back to [`Self::external_message`].
    pub fn client_message(&self) -> String {
        match self {
            Self::InvalidRequest(_) | Self::ModelNotFound(_) | Self::PayloadTooLarge(_) => {
                self.to_string()
            }
            _ => self.external_message().to_string(),
        }
    }

    /// Returns the OpenAI-compatible error type string.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request_error",
            Self::ModelNotFound(_) => "not_found_error",
            Self::NoProxy(_) => "server_error",
            Self::SelectionFailed(_) => "server_error",
            Self::Http(_) => "service_unavailable",
            Self::Timeout(_) => "server_error",
            Self::PayloadTooLarge(_) => "invalid_request_error",
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::ModelNotFound(_) => StatusCode::NOT_FOUND,
            Self::NoProxy(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::SelectionFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Http(_) => StatusCode::BAD_GATEWAY,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    /// Converts this error to an OpenAI-compatible error response.
    pub fn to_openai_error(&self) -> OpenAIErrorResponse {
        OpenAIErrorResponse {
            error: OpenAIErrorDetail {
                message: self.client_message(),
                error_type: self.error_type().to_string(),
                code: Some(self.status_code().as_u16().to_string()),
            },
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::Http(err.to_string())
        }
    }
}

/// OpenAI互換エラーレスポンス
///
/// # Example
///
/// ```json
/// {
///   "error": {
///     "message": "The model 'gpt-5' does not exist",
///     "type": "not_found_error",
///     "code": "404"
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct OpenAIErrorResponse {
    /// The error details
    pub error: OpenAIErrorDetail,
}

/// OpenAIエラー詳細
#[derive(Debug, Clone, Serialize)]
pub struct OpenAIErrorDetail {
    /// Human-readable error message
    pub message: String,
    /// Error type (e.g., "invalid_request_error", "server_error")
    #[serde(rename = "type")]
    pub error_type: String,
    /// Error code (optional, typically HTTP status as string)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Result type alias (Common)
pub type CommonResult<T> = Result<T, CommonError>;

/// Result type alias (gateway)
pub type GatewayResult<T> = Result<T, GatewayError>;
