//! Repository Traits
//!
//! Interfaces for data persistence. Implementations live in the
//! infrastructure layer.

use chrono::{DateTime, Utc};

use crate::domain::entity::account::{Account, NewAccount};
use crate::domain::value_object::email::Email;
use crate::error::AccountResult;

/// Account repository trait
///
/// Uniqueness of email and username is enforced by the storage layer
/// itself (constraints, not check-then-insert): `create` must fail
/// with `DuplicateEmail`/`DuplicateUsername` when a concurrent request
/// wins the race.
#[trait_variant::make(AccountRepository: Send)]
pub trait LocalAccountRepository {
    /// Insert a new account and return it with its assigned id
    async fn create(&self, account: &NewAccount) -> AccountResult<Account>;

    /// Find account by id
    async fn find_by_id(&self, id: i64) -> AccountResult<Option<Account>>;

    /// Find account by email
    async fn find_by_email(&self, email: &Email) -> AccountResult<Option<Account>>;

    /// Check if an email is already registered
    async fn email_exists(&self, email: &Email) -> AccountResult<bool>;

    /// List accounts newest-first
    async fn list(&self, limit: i64, offset: i64) -> AccountResult<Vec<Account>>;

    /// Total number of accounts
    async fn count(&self) -> AccountResult<i64>;

    /// Hard-delete an account; Ok(false) when the id does not exist
    async fn delete(&self, id: i64) -> AccountResult<bool>;
}

/// Revocation list for refresh tokens.
///
/// Membership is keyed by the token's `jti` claim; entries become
/// garbage once the token itself would have expired.
#[trait_variant::make(TokenBlacklistRepository: Send)]
pub trait LocalTokenBlacklistRepository {
    /// Record a revoked token. Returns false when the jti was already
    /// present — revoking twice is a client error, not a no-op.
    async fn insert(&self, jti: &str, expires_at: DateTime<Utc>) -> AccountResult<bool>;

    /// Whether a jti has been revoked
    async fn contains(&self, jti: &str) -> AccountResult<bool>;

    /// Drop entries whose token has expired anyway
    async fn cleanup_expired(&self) -> AccountResult<u64>;
}
