//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use platform::password::HashedPassword;
use sqlx::PgPool;

use crate::domain::entity::account::{Account, NewAccount};
use crate::domain::repository::{AccountRepository, TokenBlacklistRepository};
use crate::domain::value_object::{email::Email, username::Username};
use crate::error::{AccountError, AccountResult};

/// PostgreSQL-backed account repository
#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl AccountRepository for PgAccountRepository {
    async fn create(&self, account: &NewAccount) -> AccountResult<Account> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            INSERT INTO accounts (
                email,
                username,
                password_hash,
                avatar
            ) VALUES ($1, $2, $3, $4)
            RETURNING
                id,
                email,
                username,
                password_hash,
                is_superuser,
                avatar,
                created_at,
                updated_at
            "#,
        )
        .bind(account.email.as_str())
        .bind(account.username.as_str())
        .bind(account.password_hash.as_ref().map(HashedPassword::as_phc_string))
        .bind(account.avatar.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        row.into_account()
    }

    async fn find_by_id(&self, id: i64) -> AccountResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT
                id,
                email,
                username,
                password_hash,
                is_superuser,
                avatar,
                created_at,
                updated_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_account()).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> AccountResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT
                id,
                email,
                username,
                password_hash,
                is_superuser,
                avatar,
                created_at,
                updated_at
            FROM accounts
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_account()).transpose()
    }

    async fn email_exists(&self, email: &Email) -> AccountResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE email = $1)",
        )
        .bind(email.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn list(&self, limit: i64, offset: i64) -> AccountResult<Vec<Account>> {
        let rows = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT
                id,
                email,
                username,
                password_hash,
                is_superuser,
                avatar,
                created_at,
                updated_at
            FROM accounts
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AccountRow::into_account).collect()
    }

    async fn count(&self) -> AccountResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn delete(&self, id: i64) -> AccountResult<bool> {
        let deleted = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }
}

/// PostgreSQL-backed refresh-token revocation list
#[derive(Clone)]
pub struct PgTokenBlacklist {
    pool: PgPool,
}

impl PgTokenBlacklist {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl TokenBlacklistRepository for PgTokenBlacklist {
    async fn insert(&self, jti: &str, expires_at: DateTime<Utc>) -> AccountResult<bool> {
        // ON CONFLICT DO NOTHING inserts zero rows for a repeat jti,
        // which callers treat as an already-revoked token
        let inserted = sqlx::query(
            r#"
            INSERT INTO revoked_tokens (jti, expires_at)
            VALUES ($1, $2)
            ON CONFLICT (jti) DO NOTHING
            "#,
        )
        .bind(jti)
        .bind(expires_at)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(inserted > 0)
    }

    async fn contains(&self, jti: &str) -> AccountResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM revoked_tokens WHERE jti = $1)",
        )
        .bind(jti)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn cleanup_expired(&self) -> AccountResult<u64> {
        let deleted = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(tokens_deleted = deleted, "Cleaned up expired revoked tokens");

        Ok(deleted)
    }
}

/// Map a unique-constraint violation to the duplicate it names.
fn map_unique_violation(err: sqlx::Error) -> AccountError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            return match db_err.constraint() {
                Some("accounts_email_key") => AccountError::DuplicateEmail,
                Some("accounts_username_key") => AccountError::DuplicateUsername,
                _ => AccountError::Database(err),
            };
        }
    }
    AccountError::Database(err)
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: i64,
    email: String,
    username: String,
    password_hash: Option<String>,
    is_superuser: bool,
    avatar: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_account(self) -> AccountResult<Account> {
        let password_hash = self
            .password_hash
            .map(HashedPassword::from_phc_string)
            .transpose()
            .map_err(|e| AccountError::Internal(format!("Invalid password hash: {}", e)))?;

        Ok(Account {
            id: self.id,
            email: Email::from_db(self.email),
            username: Username::from_db(self.username),
            password_hash,
            is_superuser: self.is_superuser,
            avatar: self.avatar,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
