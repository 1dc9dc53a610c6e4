/// Shared error vocabulary for the bolavila services
///
/// - Error codes follow the pattern <CATEGORY>_<SPECIFIC>_<DETAIL>
/// - Categories decide the HTTP status code and the log level
/// - `context` carries debugging detail that is not part of the message
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::UPSTREAM_ERROR_BODY_LIMIT;

/// Error categories that map to HTTP status codes and logging severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    /// Client provided invalid input (400)
    Validation,

    /// Data store or vision API could not be reached (503)
    Network,

    /// Data store answered with a non-success status (502)
    Upstream,

    /// Unexpected failures and misconfiguration (500)
    Internal,

    /// Resource not found (404)
    NotFound,

    /// Bad credentials (401)
    Unauthorized,
}

impl ErrorCategory {
    /// Map error category to HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorCategory::Validation => 400,
            ErrorCategory::Network => 503,
            ErrorCategory::Upstream => 502,
            ErrorCategory::Internal => 500,
            ErrorCategory::NotFound => 404,
            ErrorCategory::Unauthorized => 401,
        }
    }

    /// Map error category to log level
    pub fn log_level(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "warn",
            ErrorCategory::Network => "error",
            ErrorCategory::Upstream => "error",
            ErrorCategory::Internal => "error",
            ErrorCategory::NotFound => "info",
            ErrorCategory::Unauthorized => "warn",
        }
    }
}

/// Standard error codes used across the services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCode(pub &'static str);

impl ErrorCode {
    // Validation errors
    pub const VALIDATION_INVALID_INPUT: ErrorCode = ErrorCode("VALIDATION_INVALID_INPUT");
    pub const VALIDATION_MISSING_FIELD: ErrorCode = ErrorCode("VALIDATION_MISSING_FIELD");
    pub const VALIDATION_INVALID_JSON: ErrorCode = ErrorCode("VALIDATION_INVALID_JSON");
    pub const VALIDATION_UNSUPPORTED_MEDIA: ErrorCode = ErrorCode("VALIDATION_UNSUPPORTED_MEDIA");
    pub const VALIDATION_DUPLICATE_USERNAME: ErrorCode = ErrorCode("VALIDATION_DUPLICATE_USERNAME");

    // Auth errors
    pub const UNAUTHORIZED_INVALID_CREDENTIALS: ErrorCode =
        ErrorCode("UNAUTHORIZED_INVALID_CREDENTIALS");

    // Network errors
    pub const NETWORK_DATABASE_UNAVAILABLE: ErrorCode = ErrorCode("NETWORK_DATABASE_UNAVAILABLE");
    pub const NETWORK_VISION_UNAVAILABLE: ErrorCode = ErrorCode("NETWORK_VISION_UNAVAILABLE");

    // Upstream errors
    pub const UPSTREAM_DATABASE_STATUS: ErrorCode = ErrorCode("UPSTREAM_DATABASE_STATUS");

    // Internal errors
    pub const INTERNAL_UNEXPECTED: ErrorCode = ErrorCode("INTERNAL_UNEXPECTED");
    pub const INTERNAL_DESERIALIZATION: ErrorCode = ErrorCode("INTERNAL_DESERIALIZATION");
    pub const INTERNAL_CONFIGURATION: ErrorCode = ErrorCode("INTERNAL_CONFIGURATION");

    // Resource errors
    pub const NOT_FOUND_RESOURCE: ErrorCode = ErrorCode("NOT_FOUND_RESOURCE");
    pub const NOT_FOUND_TABLE: ErrorCode = ErrorCode("NOT_FOUND_TABLE");
    pub const NOT_FOUND_SESSION: ErrorCode = ErrorCode("NOT_FOUND_SESSION");

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Standardized error structure returned in every error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceError {
    pub category: ErrorCategory,

    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional debugging detail (table names, upstream bodies)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl ServiceError {
    pub fn new(category: ErrorCategory, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            category,
            code: code.as_str().to_string(),
            message: message.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    // Validation error constructors
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCategory::Validation,
            ErrorCode::VALIDATION_INVALID_INPUT,
            message,
        )
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCategory::Validation,
            ErrorCode::VALIDATION_MISSING_FIELD,
            format!("{} is required", field),
        )
        .with_context(field.to_string())
    }

    pub fn duplicate_username() -> Self {
        Self::new(
            ErrorCategory::Validation,
            ErrorCode::VALIDATION_DUPLICATE_USERNAME,
            "Username already exists",
        )
    }

    pub fn unsupported_media(content_type: impl fmt::Display) -> Self {
        Self::new(
            ErrorCategory::Validation,
            ErrorCode::VALIDATION_UNSUPPORTED_MEDIA,
            "Content-Type must be multipart/form-data or application/json",
        )
        .with_context(content_type.to_string())
    }

    pub fn invalid_credentials() -> Self {
        Self::new(
            ErrorCategory::Unauthorized,
            ErrorCode::UNAUTHORIZED_INVALID_CREDENTIALS,
            "Invalid username or password",
        )
    }

    // Data store error constructors
    pub fn database_unavailable(error: impl fmt::Display) -> Self {
        Self::new(
            ErrorCategory::Network,
            ErrorCode::NETWORK_DATABASE_UNAVAILABLE,
            "Database connection error",
        )
        .with_context(error.to_string())
    }

    /// Non-success answer from the data store; the body is truncated
    pub fn upstream_status(status: u16, body: &str) -> Self {
        let excerpt: String = body.chars().take(UPSTREAM_ERROR_BODY_LIMIT).collect();
        Self::new(
            ErrorCategory::Upstream,
            ErrorCode::UPSTREAM_DATABASE_STATUS,
            format!("Database error: HTTP {}: {}", status, excerpt),
        )
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::NotFound, ErrorCode::NOT_FOUND_RESOURCE, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCategory::Internal,
            ErrorCode::INTERNAL_CONFIGURATION,
            message,
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCategory::Internal,
            ErrorCode::INTERNAL_UNEXPECTED,
            message,
        )
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(f, "[{}] {}: {}", self.code, self.message, context)
        } else {
            write!(f, "[{}] {}", self.code, self.message)
        }
    }
}

impl std::error::Error for ServiceError {}

pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_status_codes() {
        assert_eq!(ErrorCategory::Validation.status_code(), 400);
        assert_eq!(ErrorCategory::Unauthorized.status_code(), 401);
        assert_eq!(ErrorCategory::NotFound.status_code(), 404);
        assert_eq!(ErrorCategory::Internal.status_code(), 500);
        assert_eq!(ErrorCategory::Upstream.status_code(), 502);
        assert_eq!(ErrorCategory::Network.status_code(), 503);
    }

    #[test]
    fn test_missing_field_names_the_field() {
        let error = ServiceError::missing_field("title");
        assert_eq!(error.code, "VALIDATION_MISSING_FIELD");
        assert_eq!(error.message, "title is required");
        assert_eq!(error.context.as_deref(), Some("title"));
    }

    #[test]
    fn test_upstream_body_is_truncated() {
        let body = "x".repeat(500);
        let error = ServiceError::upstream_status(500, &body);
        assert_eq!(error.category, ErrorCategory::Upstream);
        assert_eq!(
            error.message,
            format!("Database error: HTTP 500: {}", "x".repeat(200))
        );
    }

    #[test]
    fn test_upstream_truncation_respects_char_boundaries() {
        let body = "שגיאה".repeat(100);
        let error = ServiceError::upstream_status(400, &body);
        let prefix = "Database error: HTTP 400: ";
        assert!(error.message.starts_with(prefix));
        assert_eq!(error.message.chars().count(), prefix.chars().count() + 200);
    }

    #[test]
    fn test_error_serialization() {
        let error = ServiceError::not_found("Task not found");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("NOT_FOUND_RESOURCE"));
        assert!(json.contains("NOT_FOUND\""));
        assert!(!json.contains("context"));
    }
}
