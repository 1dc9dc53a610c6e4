use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use shared::errors::{ErrorCategory, ServiceError};

use crate::repository::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Data store error: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Service(ServiceError),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::Service(ServiceError::not_found(message))
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        AppError::Service(ServiceError::invalid_input(message))
    }

    pub fn missing_field(field: &str) -> Self {
        AppError::Service(ServiceError::missing_field(field))
    }

    pub fn unauthorized() -> Self {
        AppError::Service(ServiceError::invalid_credentials())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        AppError::Service(ServiceError::configuration(message))
    }

    fn to_service_error(&self) -> ServiceError {
        match self {
            AppError::Store(StoreError::Status { status, body }) => {
                ServiceError::upstream_status(*status, body)
            }
            AppError::Store(e @ StoreError::Transport(_)) => ServiceError::database_unavailable(e),
            AppError::Store(e @ StoreError::Decode(_)) => {
                ServiceError::internal("Unexpected response from database").with_context(e.to_string())
            }
            AppError::Service(error) => error.clone(),
            AppError::Internal(_) => ServiceError::internal("Internal server error"),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(error: ServiceError) -> Self {
        AppError::Service(error)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error = self.to_service_error();

        match error.category.log_level() {
            "error" => tracing::error!(code = %error.code, error = ?self, "Request failed"),
            "warn" => tracing::warn!(code = %error.code, message = %error.message, "Request rejected"),
            _ => tracing::info!(code = %error.code, message = %error.message, "Request rejected"),
        }
        if error.category == ErrorCategory::Upstream || error.category == ErrorCategory::Network {
            metrics::counter!("upstream_errors_total", "code" => error.code.clone()).increment(1);
        }

        let status = StatusCode::from_u16(error.category.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(json!({
            "detail": error.message,
            "error": {
                "code": error.code,
                "message": error.message,
                "category": error.category,
            }
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
