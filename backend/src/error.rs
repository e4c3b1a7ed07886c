//! HTTP-facing error type.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::auth::AuthError;
use crate::provider::ProviderError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Identity provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Provider(e) => AppError::Provider(e),
            AuthError::Store(e) => AppError::Store(e),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::Provider(_) => (StatusCode::BAD_GATEWAY, "identity_provider_error"),
            AppError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let code = match &self {
            AppError::Provider(e) => e.code().map(str::to_string),
            _ => None,
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "code": code,
                "message": self.to_string()
            }
        }));

        (status, body).into_response()
    }
}
