//! In-Memory Test Doubles
//!
//! Mirror the Postgres implementations closely enough for use-case
//! tests, including the duplicate-key and repeat-revocation behavior
//! the real constraints enforce.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::domain::entity::account::{Account, NewAccount};
use crate::domain::repository::{AccountRepository, TokenBlacklistRepository};
use crate::domain::value_object::email::Email;
use crate::error::{AccountError, AccountResult};

#[derive(Default)]
pub struct MemoryAccountRepository {
    state: Mutex<MemoryAccounts>,
}

#[derive(Default)]
struct MemoryAccounts {
    accounts: Vec<Account>,
    next_id: i64,
}

impl MemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AccountRepository for MemoryAccountRepository {
    async fn create(&self, account: &NewAccount) -> AccountResult<Account> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| AccountError::Internal("lock poisoned".into()))?;

        if state.accounts.iter().any(|a| a.email == account.email) {
            return Err(AccountError::DuplicateEmail);
        }
        if state.accounts.iter().any(|a| a.username == account.username) {
            return Err(AccountError::DuplicateUsername);
        }

        state.next_id += 1;
        let now = Utc::now();
        let created = Account {
            id: state.next_id,
            email: account.email.clone(),
            username: account.username.clone(),
            password_hash: account.password_hash.clone(),
            is_superuser: false,
            avatar: account.avatar.clone(),
            created_at: now,
            updated_at: now,
        };
        state.accounts.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> AccountResult<Option<Account>> {
        let state = self
            .state
            .lock()
            .map_err(|_| AccountError::Internal("lock poisoned".into()))?;
        Ok(state.accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> AccountResult<Option<Account>> {
        let state = self
            .state
            .lock()
            .map_err(|_| AccountError::Internal("lock poisoned".into()))?;
        Ok(state.accounts.iter().find(|a| &a.email == email).cloned())
    }

    async fn email_exists(&self, email: &Email) -> AccountResult<bool> {
        let state = self
            .state
            .lock()
            .map_err(|_| AccountError::Internal("lock poisoned".into()))?;
        Ok(state.accounts.iter().any(|a| &a.email == email))
    }

    async fn list(&self, limit: i64, offset: i64) -> AccountResult<Vec<Account>> {
        let state = self
            .state
            .lock()
            .map_err(|_| AccountError::Internal("lock poisoned".into()))?;
        let mut accounts = state.accounts.clone();
        // Newest first, same order the SQL query promises
        accounts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(accounts
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count(&self) -> AccountResult<i64> {
        let state = self
            .state
            .lock()
            .map_err(|_| AccountError::Internal("lock poisoned".into()))?;
        Ok(state.accounts.len() as i64)
    }

    async fn delete(&self, id: i64) -> AccountResult<bool> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| AccountError::Internal("lock poisoned".into()))?;
        let before = state.accounts.len();
        state.accounts.retain(|a| a.id != id);
        Ok(state.accounts.len() < before)
    }
}

#[derive(Default)]
pub struct MemoryTokenBlacklist {
    entries: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl MemoryTokenBlacklist {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenBlacklistRepository for MemoryTokenBlacklist {
    async fn insert(&self, jti: &str, expires_at: DateTime<Utc>) -> AccountResult<bool> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AccountError::Internal("lock poisoned".into()))?;
        if entries.contains_key(jti) {
            return Ok(false);
        }
        entries.insert(jti.to_string(), expires_at);
        Ok(true)
    }

    async fn contains(&self, jti: &str) -> AccountResult<bool> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| AccountError::Internal("lock poisoned".into()))?;
        Ok(entries.contains_key(jti))
    }

    async fn cleanup_expired(&self) -> AccountResult<u64> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AccountError::Internal("lock poisoned".into()))?;
        let now = Utc::now();
        let before = entries.len();
        entries.retain(|_, expires_at| *expires_at >= now);
        Ok((before - entries.len()) as u64)
    }
}
