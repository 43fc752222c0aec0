//! Consistent JSON error responses.
//!
//! Every failure leaves the API as `{"error": code, "message": ...}`, plus
//! `"field"` when a validation error names the offending input.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use shelfwise_auth::{AuthzError, PasswordError};
use shelfwise_core::DomainError;
use shelfwise_infra::{AuthError, RealtimeError, StoreError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Validation { field: Option<String>, message: String },

    #[error("{0}")]
    InvalidId(String),

    #[error("{0}")]
    Invariant(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Store(String),

    #[error("{0}")]
    Publish(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(what: &str) -> Self {
        ApiError::NotFound(format!("{what} not found"))
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Validation { .. } => (StatusCode::BAD_REQUEST, "validation_error"),
            ApiError::InvalidId(_) => (StatusCode::BAD_REQUEST, "invalid_id"),
            ApiError::Invariant(_) => (StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            ApiError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store_error"),
            ApiError::Publish(_) => (StatusCode::BAD_GATEWAY, "publish_error"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code, "request failed");
        }

        match self {
            ApiError::Validation {
                field: Some(field),
                message,
            } => (
                status,
                axum::Json(json!({
                    "error": code,
                    "message": message,
                    "field": field,
                })),
            )
                .into_response(),
            other => json_error(status, code, other.to_string()),
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation { field, message } => ApiError::Validation { field, message },
            DomainError::InvariantViolation(msg) => ApiError::Invariant(msg),
            DomainError::InvalidId(msg) => ApiError::InvalidId(msg),
            DomainError::NotFound(what) => ApiError::not_found(what),
            DomainError::Conflict(msg) => ApiError::Conflict(msg),
            DomainError::Forbidden(msg) => ApiError::Forbidden(msg),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ApiError::not_found(what),
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            other => ApiError::Store(other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::Unauthenticated("invalid email or password".to_string()),
            AuthError::Unauthenticated => ApiError::Unauthenticated("authentication required".to_string()),
            AuthError::Token(e) => ApiError::Unauthenticated(e.to_string()),
            AuthError::Domain(e) => e.into(),
            AuthError::Password(e @ PasswordError::TooShort(_)) => ApiError::Validation {
                field: Some("password".to_string()),
                message: e.to_string(),
            },
            AuthError::Password(e) => ApiError::Internal(e.to_string()),
            AuthError::Store(e) => e.into(),
            AuthError::Hashing(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        ApiError::Forbidden(err.to_string())
    }
}

impl From<RealtimeError> for ApiError {
    fn from(err: RealtimeError) -> Self {
        ApiError::Publish(err.to_string())
    }
}
