//! Error handling for the dashboard backend
//!
//! This module defines the error type shared by every layer and its mapping
//! onto HTTP responses.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Result type alias for the dashboard
pub type Result<T> = std::result::Result<T, DashboardError>;

/// Field-level validation messages, keyed by the offending field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for a field; the first message for a field wins
    pub fn add<F: Into<String>, M: Into<String>>(&mut self, field: F, message: M) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn single<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Add every message from `other` that is not already present
    pub fn extend(&mut self, other: FieldErrors) {
        for (field, message) in other.0 {
            self.add(field, message);
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Main error type for the dashboard backend
#[derive(Error, Debug)]
pub enum DashboardError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JWT errors
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// Crypto errors
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Missing or invalid credentials
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Authenticated but not allowed
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Field-level input errors
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict errors (existing ids, stale versions)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Bad request errors
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Sign-in lockout
    #[error("Too many failed attempts. Try again in {retry_after} seconds")]
    RateLimit { retry_after: u64 },

    /// The backing store cannot be reached
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Internal server errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ResponseError for DashboardError {
    fn status_code(&self) -> StatusCode {
        match self {
            DashboardError::Auth(_) | DashboardError::Jwt(_) => StatusCode::UNAUTHORIZED,
            DashboardError::Forbidden(_) => StatusCode::FORBIDDEN,
            DashboardError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DashboardError::NotFound(_) => StatusCode::NOT_FOUND,
            DashboardError::Conflict(_) => StatusCode::CONFLICT,
            DashboardError::BadRequest(_) => StatusCode::BAD_REQUEST,
            DashboardError::RateLimit { .. } => StatusCode::TOO_MANY_REQUESTS,
            DashboardError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (code, message) = match self {
            DashboardError::Auth(_) => ("AUTH_ERROR", self.to_string()),
            DashboardError::Jwt(_) => ("AUTH_ERROR", "Invalid or expired session".to_string()),
            DashboardError::Forbidden(_) => ("ACCESS_DENIED", self.to_string()),
            DashboardError::Validation(_) => {
                ("VALIDATION_ERROR", "One or more fields are invalid".to_string())
            }
            DashboardError::NotFound(_) => ("NOT_FOUND", self.to_string()),
            DashboardError::Conflict(_) => ("CONFLICT", self.to_string()),
            DashboardError::BadRequest(_) => ("BAD_REQUEST", self.to_string()),
            DashboardError::RateLimit { .. } => ("RATE_LIMIT_EXCEEDED", self.to_string()),
            DashboardError::Unavailable(_) => (
                "SERVICE_UNAVAILABLE",
                "The data store is unavailable, please retry".to_string(),
            ),
            DashboardError::Database(_) => (
                "DATABASE_ERROR",
                "Database operation failed, please retry".to_string(),
            ),
            DashboardError::Config(_) => ("CONFIG_ERROR", self.to_string()),
            _ => (
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            ),
        };

        let fields = match self {
            DashboardError::Validation(errors) => Some(errors.clone()),
            _ => None,
        };

        let mut builder = HttpResponse::build(self.status_code());
        if let DashboardError::RateLimit { retry_after } = self {
            builder.insert_header(("Retry-After", retry_after.to_string()));
        }

        builder.json(ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                fields,
                timestamp: chrono::Utc::now().timestamp(),
            },
        })
    }
}

/// Standard error response format
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail structure
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
    pub timestamp: i64,
}

/// Helper functions for creating specific errors
impl DashboardError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn auth<S: Into<String>>(message: S) -> Self {
        Self::Auth(message.into())
    }

    pub fn forbidden<S: Into<String>>(message: S) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn access_denied() -> Self {
        Self::Forbidden("Access denied".to_string())
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict<S: Into<String>>(message: S) -> Self {
        Self::Conflict(message.into())
    }

    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn unavailable<S: Into<String>>(message: S) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    pub fn invalid_field<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::Validation(FieldErrors::single(field, message))
    }

    /// Whether the caller may reasonably retry the same operation
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DashboardError::Database(_) | DashboardError::Unavailable(_) | DashboardError::Io(_)
        )
    }
}
