//! Accounts Error Types
//!
//! Error taxonomy for the accounts service, integrated with the
//! unified `kernel::error::AppError` system. Client-facing variants
//! serialize to the exact body shapes the API contract promises;
//! server faults fall back to the kernel's generic representation.

use std::collections::BTreeMap;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use serde::Serialize;
use thiserror::Error;

/// Accounts-specific result type alias
pub type AccountResult<T> = Result<T, AccountError>;

/// Field-keyed validation messages, reported as one batch.
///
/// Serializes to `{"field": ["message", ...], ...}`. BTreeMap keeps
/// field order stable for clients and tests.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationErrors(BTreeMap<&'static str, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Consume into an error if any message was recorded.
    pub fn into_result(self) -> AccountResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AccountError::Validation(self))
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<&str> = self.0.keys().copied().collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

/// Accounts-specific error variants
#[derive(Debug, Error)]
pub enum AccountError {
    /// Registration input failed one or more validation rules
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Wrong password or unknown email — deliberately indistinguishable
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Refresh token failed to parse/verify, is expired, or is revoked
    #[error("Invalid refresh token")]
    InvalidToken,

    /// Missing/invalid/expired access token
    #[error("Authentication required")]
    Unauthorized,

    /// Authenticated but lacking superuser privilege
    #[error("Superuser privilege required")]
    Forbidden,

    /// Account lookup by nonexistent id
    #[error("Not found")]
    NotFound,

    /// Identity-provider token failed verification (generic by design)
    #[error("Invalid identity provider token")]
    ProviderTokenInvalid,

    /// Authorization-code exchange rejected by the provider
    #[error("Identity provider token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// Userinfo endpoint rejected the exchanged access token
    #[error("Identity provider userinfo request failed: {0}")]
    UserinfoFailed(String),

    /// Provider response carried no email claim
    #[error("Identity provider did not return an email")]
    MissingEmail,

    /// Email uniqueness violated at insert
    #[error("Email is already registered")]
    DuplicateEmail,

    /// Username uniqueness violated at insert
    #[error("Username is already taken")]
    DuplicateUsername,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AccountError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AccountError::Validation(_)
            | AccountError::InvalidCredentials
            | AccountError::InvalidToken
            | AccountError::TokenExchangeFailed(_)
            | AccountError::UserinfoFailed(_)
            | AccountError::MissingEmail
            | AccountError::DuplicateEmail
            | AccountError::DuplicateUsername => StatusCode::BAD_REQUEST,
            AccountError::Unauthorized | AccountError::ProviderTokenInvalid => {
                StatusCode::UNAUTHORIZED
            }
            AccountError::Forbidden => StatusCode::FORBIDDEN,
            AccountError::NotFound => StatusCode::NOT_FOUND,
            AccountError::Database(_) | AccountError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AccountError::Validation(_)
            | AccountError::InvalidCredentials
            | AccountError::InvalidToken
            | AccountError::TokenExchangeFailed(_)
            | AccountError::UserinfoFailed(_)
            | AccountError::MissingEmail => ErrorKind::BadRequest,
            AccountError::DuplicateEmail | AccountError::DuplicateUsername => ErrorKind::Conflict,
            AccountError::Unauthorized | AccountError::ProviderTokenInvalid => {
                ErrorKind::Unauthorized
            }
            AccountError::Forbidden => ErrorKind::Forbidden,
            AccountError::NotFound => ErrorKind::NotFound,
            AccountError::Database(_) | AccountError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string())
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AccountError::Database(e) => {
                tracing::error!(error = %e, "Accounts database error");
            }
            AccountError::Internal(msg) => {
                tracing::error!(message = %msg, "Accounts internal error");
            }
            AccountError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AccountError::TokenExchangeFailed(body) => {
                tracing::warn!(provider_error = %body, "Provider token exchange failed");
            }
            AccountError::UserinfoFailed(body) => {
                tracing::warn!(provider_error = %body, "Provider userinfo request failed");
            }
            AccountError::ProviderTokenInvalid => {
                tracing::warn!("Provider token failed verification");
            }
            _ => {
                tracing::debug!(error = %self, "Accounts error");
            }
        }
    }

    /// Client-facing response body.
    ///
    /// Shapes match the external contract: registration errors as
    /// `{"errors": {field: [..]}}`, login failures as
    /// `{"errors": "invalid credentials"}`, lookups as
    /// `{"error": "not found"}`. Raw provider errors stay in the logs.
    fn body(&self) -> serde_json::Value {
        match self {
            AccountError::Validation(errors) => serde_json::json!({ "errors": errors }),
            AccountError::InvalidCredentials => {
                serde_json::json!({ "errors": "invalid credentials" })
            }
            AccountError::InvalidToken => serde_json::json!({ "error": "invalid refresh token" }),
            AccountError::Unauthorized => {
                serde_json::json!({ "detail": "authentication credentials missing or invalid" })
            }
            AccountError::Forbidden => {
                serde_json::json!({ "detail": "only superusers can access this resource" })
            }
            AccountError::NotFound => serde_json::json!({ "error": "not found" }),
            AccountError::ProviderTokenInvalid => {
                serde_json::json!({ "detail": "invalid identity provider token" })
            }
            AccountError::TokenExchangeFailed(_) => {
                serde_json::json!({ "error": "identity provider token exchange failed" })
            }
            AccountError::UserinfoFailed(_) => {
                serde_json::json!({ "error": "identity provider userinfo request failed" })
            }
            AccountError::MissingEmail => {
                serde_json::json!({ "error": "identity provider did not return an email" })
            }
            AccountError::DuplicateEmail => {
                serde_json::json!({ "errors": { "email": ["This email is already registered."] } })
            }
            AccountError::DuplicateUsername => {
                serde_json::json!({ "errors": { "username": ["This username is already taken."] } })
            }
            AccountError::Database(_) | AccountError::Internal(_) => {
                serde_json::json!({ "detail": "internal server error" })
            }
        }
    }
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        self.log();
        (self.status_code(), Json(self.body())).into_response()
    }
}

impl From<AppError> for AccountError {
    fn from(err: AppError) -> Self {
        AccountError::Internal(err.to_string())
    }
}
