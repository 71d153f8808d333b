//! Account Entity

use chrono::{DateTime, Utc};
use platform::password::HashedPassword;

use crate::domain::value_object::{email::Email, username::Username};

/// A registered user account.
///
/// Created either by admin-gated registration (password required) or
/// by external-identity first login (no password). Never soft-deleted.
#[derive(Debug, Clone)]
pub struct Account {
    /// Database-assigned identifier
    pub id: i64,
    /// Unique email, lowercased
    pub email: Email,
    /// Unique username, defaults to the email local part
    pub username: Username,
    /// PHC-format Argon2id hash; None for external-identity accounts
    pub password_hash: Option<HashedPassword>,
    /// Admin flag consulted by the access policy
    pub is_superuser: bool,
    /// Optional avatar reference
    pub avatar: Option<String>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Whether the account can authenticate with a password at all.
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }
}

/// Draft for an account about to be inserted. The store assigns the
/// id and timestamps.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: Email,
    pub username: Username,
    pub password_hash: Option<HashedPassword>,
    pub avatar: Option<String>,
}

impl NewAccount {
    /// Draft for a locally registered account.
    pub fn with_password(
        email: Email,
        username: Username,
        password_hash: HashedPassword,
        avatar: Option<String>,
    ) -> Self {
        Self {
            email,
            username,
            password_hash: Some(password_hash),
            avatar,
        }
    }

    /// Draft for an account provisioned from a verified external
    /// identity: username defaults to the email local part, no
    /// password.
    pub fn from_external_identity(email: Email, username: Username) -> Self {
        Self {
            email,
            username,
            password_hash: None,
            avatar: None,
        }
    }
}
