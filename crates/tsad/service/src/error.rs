//! Error types for tsad-service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tsad_core::{DetectionError, MethodId};

use crate::smoothing::SmoothingError;

/// Service start-up errors
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server runtime error
    #[error("Server error: {0}")]
    Server(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for ServiceError {
    fn from(e: config::ConfigError) -> Self {
        ServiceError::Config(e.to_string())
    }
}

/// Errors returned to HTTP clients
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or inconsistent request fields
    #[error("{0}")]
    BadRequest(String),

    /// The series failed validation or the parameters are out of range
    #[error("{0}")]
    Validation(String),

    /// Unrecognised detection method, smoothing method or pipeline step
    #[error("{0}")]
    UnknownMethod(String),

    /// Series longer than the configured cap
    #[error("series too long ({len} points, at most {max} allowed)")]
    PayloadTooLarge { len: usize, max: usize },

    /// Series longer than a pairwise detector accepts
    #[error("series too long for {method} ({len} points, at most {max} allowed)")]
    TooLongForMethod {
        method: MethodId,
        len: usize,
        max: usize,
    },

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) | ApiError::UnknownMethod(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::PayloadTooLarge { .. } | ApiError::TooLongForMethod { .. } => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DetectionError> for ApiError {
    fn from(e: DetectionError) -> Self {
        match e {
            DetectionError::UnknownMethod(_) => ApiError::UnknownMethod(e.to_string()),
            DetectionError::Validation(_)
            | DetectionError::InvalidParameter { .. }
            | DetectionError::InvalidParams(_) => ApiError::Validation(e.to_string()),
        }
    }
}

impl From<SmoothingError> for ApiError {
    fn from(e: SmoothingError) -> Self {
        match e {
            SmoothingError::UnsupportedMethod(_) => ApiError::UnknownMethod(e.to_string()),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }

        let body = ErrorResponse {
            success: false,
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for service start-up
pub type ServiceResult<T> = Result<T, ServiceError>;
