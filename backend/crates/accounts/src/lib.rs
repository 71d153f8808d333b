//! Accounts (Token Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits
//! - `application/` - Use cases, token authority, configuration
//! - `infra/` - PostgreSQL repositories, identity-provider client
//! - `presentation/` - HTTP handlers, DTOs, access-policy middleware
//!
//! ## Features
//! - Admin-gated registration with batched field validation
//! - Credential login issuing access/refresh token pairs
//! - Logout by durable refresh-token revocation
//! - Google federated login with get-or-create provisioning
//! - Admin user listing, lookup and deletion
//!
//! ## Security Model
//! - Passwords hashed with Argon2id, policy checked on registration
//! - HS256-signed tokens, refresh revocation keyed by `jti`
//! - Access tokens validated statelessly (signature + expiry only)
//! - Three access levels: public, authenticated, admin

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::{AccountsConfig, GoogleAuthMode, GoogleConfig, TokenConfig};
pub use application::token_authority::{TokenAuthority, TokenPair};
pub use error::{AccountError, AccountResult};
pub use infra::google::GoogleResolver;
pub use infra::postgres::{PgAccountRepository, PgTokenBlacklist};
pub use presentation::handlers::AccountsAppState;
pub use presentation::router::accounts_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod handlers {
    pub use crate::presentation::handlers::*;
}

pub mod router {
    pub use crate::presentation::router::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
