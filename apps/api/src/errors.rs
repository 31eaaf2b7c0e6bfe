use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::synthesis::provider::{GenerationError, ProviderError};

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, kind) = match &self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                None,
            ),
            AppError::Generation(e) => {
                let (status, code) = match &e.source {
                    ProviderError::RateLimited => {
                        (StatusCode::TOO_MANY_REQUESTS, "GENERATION_RATE_LIMITED")
                    }
                    ProviderError::Timeout(_) => {
                        (StatusCode::GATEWAY_TIMEOUT, "GENERATION_TIMEOUT")
                    }
                    ProviderError::Cancelled => {
                        (StatusCode::SERVICE_UNAVAILABLE, "GENERATION_CANCELLED")
                    }
                    ProviderError::Unavailable(_)
                    | ProviderError::Rejected { .. }
                    | ProviderError::Malformed(_) => {
                        tracing::error!("Generation error: {e}");
                        (StatusCode::BAD_GATEWAY, "GENERATION_FAILED")
                    }
                };
                (status, code, e.to_string(), Some(e.kind))
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    None,
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(kind) = kind {
            error["kind"] = json!(kind);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
