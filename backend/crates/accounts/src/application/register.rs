//! Register Use Case
//!
//! Creates a password-bearing account. Every invalid field is
//! collected and reported in one batch rather than failing on the
//! first problem.

use std::sync::Arc;

use platform::password::{self, ClearTextPassword};

use crate::application::config::AccountsConfig;
use crate::domain::entity::account::{Account, NewAccount};
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::{email::Email, username::Username};
use crate::error::{AccountError, AccountResult, ValidationErrors};

/// Raw registration request fields
#[derive(Debug)]
pub struct RegisterInput {
    pub email: String,
    /// Defaults to the email local part when absent
    pub username: Option<String>,
    pub password: String,
    /// Confirmation, must match `password` exactly
    pub password2: String,
    /// Optional avatar URL
    pub avatar: Option<String>,
}

pub struct RegisterUseCase<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
    config: Arc<AccountsConfig>,
}

impl<R> RegisterUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AccountsConfig>) -> Self {
        Self { repo, config }
    }

    /// Validate the input, hash the password and insert the account.
    ///
    /// The pre-insert `email_exists` check gives a friendly batched
    /// message; the unique constraint at insert is what actually
    /// guarantees uniqueness under concurrency.
    pub async fn execute(&self, input: RegisterInput) -> AccountResult<Account> {
        let mut errors = ValidationErrors::new();

        if input.password != input.password2 {
            errors.push("password2", "Passwords do not match.");
        }

        let email = match Email::new(input.email.as_str()) {
            Ok(email) => {
                if self.repo.email_exists(&email).await? {
                    errors.push("email", "This email is already registered.");
                }
                Some(email)
            }
            Err(e) => {
                errors.push("email", e.message().to_string());
                None
            }
        };

        let username = match &input.username {
            Some(raw) => Username::new(raw.as_str()),
            None => match &email {
                Some(email) => Username::from_email(email),
                // Email already failed; nothing to derive from
                None => Username::new(""),
            },
        };
        let username = match username {
            Ok(username) => Some(username),
            Err(e) => {
                errors.push("username", e.message().to_string());
                None
            }
        };

        let mut attributes: Vec<(&'static str, &str)> = Vec::new();
        if let Some(username) = &username {
            attributes.push(("username", username.as_str()));
        }
        if let Some(email) = &email {
            attributes.push(("email", email.as_str()));
        }
        for violation in password::validate_policy(&input.password, &attributes) {
            errors.push("password", violation.to_string());
        }

        errors.into_result()?;

        // into_result returned Ok, so both parses succeeded
        let (email, username) = match (email, username) {
            (Some(e), Some(u)) => (e, u),
            _ => return Err(AccountError::Internal("validation state mismatch".into())),
        };

        let clear = ClearTextPassword::new(input.password.as_str());
        let hash = clear
            .hash(self.config.pepper())
            .map_err(|e| AccountError::Internal(e.to_string()))?;

        let account = self
            .repo
            .create(&NewAccount::with_password(
                email,
                username,
                hash,
                input.avatar,
            ))
            .await?;

        tracing::info!(account_id = account.id, "Account registered");
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory::MemoryAccountRepository;

    fn use_case() -> RegisterUseCase<MemoryAccountRepository> {
        RegisterUseCase::new(
            Arc::new(MemoryAccountRepository::new()),
            Arc::new(AccountsConfig::default()),
        )
    }

    fn valid_input() -> RegisterInput {
        RegisterInput {
            email: "newuser@example.com".to_string(),
            username: None,
            password: "Django13$".to_string(),
            password2: "Django13$".to_string(),
            avatar: None,
        }
    }

    #[tokio::test]
    async fn registers_with_defaulted_username() {
        let account = use_case().execute(valid_input()).await.unwrap();

        assert_eq!(account.email.as_str(), "newuser@example.com");
        assert_eq!(account.username.as_str(), "newuser");
        assert!(account.has_password());
        assert!(!account.is_superuser);
    }

    #[tokio::test]
    async fn registers_with_explicit_username() {
        let mut input = valid_input();
        input.username = Some("chosen-name".to_string());

        let account = use_case().execute(input).await.unwrap();
        assert_eq!(account.username.as_str(), "chosen-name");
    }

    #[tokio::test]
    async fn mismatched_confirmation_is_reported() {
        let mut input = valid_input();
        input.password2 = "Different13$".to_string();

        let err = use_case().execute(input).await.unwrap_err();
        match err {
            AccountError::Validation(errors) => {
                let messages = errors.field("password2").unwrap();
                assert!(messages.iter().any(|m| m == "Passwords do not match."));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn all_violations_reported_together() {
        let input = RegisterInput {
            email: "not-an-email".to_string(),
            username: Some("bad name!".to_string()),
            password: "1234".to_string(),
            password2: "12345".to_string(),
            avatar: None,
        };

        let err = use_case().execute(input).await.unwrap_err();
        match err {
            AccountError::Validation(errors) => {
                assert!(errors.field("email").is_some());
                assert!(errors.field("username").is_some());
                assert!(errors.field("password2").is_some());
                // Too short plus entirely numeric
                assert!(errors.field("password").unwrap().len() >= 2);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_reported() {
        let use_case = use_case();
        use_case.execute(valid_input()).await.unwrap();

        let mut second = valid_input();
        second.username = Some("someone-else".to_string());
        let err = use_case.execute(second).await.unwrap_err();

        match err {
            AccountError::Validation(errors) => {
                let messages = errors.field("email").unwrap();
                assert!(
                    messages
                        .iter()
                        .any(|m| m == "This email is already registered.")
                );
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn password_similar_to_username_is_rejected() {
        let mut input = valid_input();
        input.password = "newuser99x".to_string();
        input.password2 = "newuser99x".to_string();

        let err = use_case().execute(input).await.unwrap_err();
        match err {
            AccountError::Validation(errors) => {
                assert!(errors.field("password").is_some());
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn stored_hash_verifies_original_password() {
        let account = use_case().execute(valid_input()).await.unwrap();
        let hash = account.password_hash.unwrap();

        assert!(hash.verify(&ClearTextPassword::new("Django13$"), None));
        assert!(!hash.verify(&ClearTextPassword::new("Wrong13$x"), None));
    }
}
