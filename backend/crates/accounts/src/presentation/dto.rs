//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};

use crate::application::token_authority::TokenPair;
use crate::domain::entity::account::Account;

// ============================================================================
// Register
// ============================================================================

/// Registration request
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    /// Defaults to the email local part when absent
    pub username: Option<String>,
    pub password: String,
    /// Confirmation, must match `password`
    pub password2: String,
    /// Optional avatar URL
    pub avatar: Option<String>,
}

// ============================================================================
// Login
// ============================================================================

/// Credential login request
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Logout request carrying the refresh token to revoke
#[derive(Debug, Clone, Deserialize)]
pub struct LogoutRequest {
    pub refresh: String,
}

/// Federated login request. `credential` is the provider artifact —
/// an ID token or an authorization code depending on deployment
/// configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleLoginRequest {
    #[serde(alias = "token")]
    pub credential: String,
}

// ============================================================================
// Responses
// ============================================================================

/// Public shape of an account
#[derive(Debug, Clone, Serialize)]
pub struct UserPayload {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_superuser: bool,
    pub avatar: Option<String>,
}

impl From<&Account> for UserPayload {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            username: account.username.as_str().to_string(),
            email: account.email.as_str().to_string(),
            is_superuser: account.is_superuser,
            avatar: account.avatar.clone(),
        }
    }
}

/// Successful register/login/federated-login response
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: UserPayload,
    pub tokens: TokenPair,
}

impl AuthResponse {
    pub fn new(message: impl Into<String>, account: &Account, tokens: TokenPair) -> Self {
        Self {
            message: message.into(),
            user: account.into(),
            tokens,
        }
    }
}

/// Bare confirmation message
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Admin user listing with pagination metadata
#[derive(Debug, Clone, Serialize)]
pub struct UserListResponse {
    pub count: i64,
    pub results: Vec<UserPayload>,
}

/// Pagination query parameters for the admin listing
#[derive(Debug, Clone, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}
