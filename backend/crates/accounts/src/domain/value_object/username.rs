//! Username Value Object

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::domain::value_object::email::Email;

const USERNAME_MIN_LENGTH: usize = 1;
const USERNAME_MAX_LENGTH: usize = 150;

/// Account username (unique, for display and default identification).
///
/// Accounts registered locally choose one; accounts provisioned from
/// an external identity default to the email's local part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Username(String);

impl Username {
    /// Create a new username with validation
    pub fn new(username: impl Into<String>) -> AppResult<Self> {
        let username = username.into().trim().to_string();

        let char_count = username.chars().count();
        if char_count < USERNAME_MIN_LENGTH {
            return Err(AppError::bad_request("Username cannot be empty"));
        }
        if char_count > USERNAME_MAX_LENGTH {
            return Err(AppError::bad_request(format!(
                "Username must be at most {} characters",
                USERNAME_MAX_LENGTH
            )));
        }

        if !username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | '+' | '@'))
        {
            return Err(AppError::bad_request(
                "Username may only contain letters, digits and . - _ + @",
            ));
        }

        Ok(Self(username))
    }

    /// Default username for an auto-provisioned account: the email's
    /// local part.
    pub fn from_email(email: &Email) -> AppResult<Self> {
        Self::new(email.local_part())
    }

    /// Create from database value (assumed already validated)
    pub fn from_db(username: impl Into<String>) -> Self {
        Self(username.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_db(self) -> String {
        self.0
    }

    /// Derive a variant with a random suffix, used when the default
    /// username is already taken during auto-provisioning.
    pub fn with_suffix(&self, suffix: &str) -> AppResult<Self> {
        Self::new(format!("{}-{}", self.0, suffix))
    }
}

impl std::fmt::Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
