//! Login Use Case
//!
//! Credential login. Every failure path (unknown email, missing
//! password, wrong password) collapses to the same error so responses
//! never reveal whether an email is registered.

use std::sync::Arc;

use platform::password::ClearTextPassword;

use crate::application::config::AccountsConfig;
use crate::application::token_authority::{TokenAuthority, TokenPair};
use crate::domain::entity::account::Account;
use crate::domain::repository::{AccountRepository, TokenBlacklistRepository};
use crate::domain::value_object::email::Email;
use crate::error::{AccountError, AccountResult};

#[derive(Debug)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

pub struct LoginUseCase<R, B>
where
    R: AccountRepository,
    B: TokenBlacklistRepository,
{
    repo: Arc<R>,
    authority: Arc<TokenAuthority<B>>,
    config: Arc<AccountsConfig>,
}

impl<R, B> LoginUseCase<R, B>
where
    R: AccountRepository,
    B: TokenBlacklistRepository,
{
    pub fn new(
        repo: Arc<R>,
        authority: Arc<TokenAuthority<B>>,
        config: Arc<AccountsConfig>,
    ) -> Self {
        Self {
            repo,
            authority,
            config,
        }
    }

    /// Verify credentials and mint a token pair.
    pub async fn execute(&self, input: LoginInput) -> AccountResult<(Account, TokenPair)> {
        let email =
            Email::new(input.email.as_str()).map_err(|_| AccountError::InvalidCredentials)?;

        let account = self
            .repo
            .find_by_email(&email)
            .await?
            .ok_or(AccountError::InvalidCredentials)?;

        // Accounts provisioned from an external identity carry no hash
        let hash = account
            .password_hash
            .as_ref()
            .ok_or(AccountError::InvalidCredentials)?;

        let clear = ClearTextPassword::new(input.password.as_str());
        if !hash.verify(&clear, self.config.pepper()) {
            return Err(AccountError::InvalidCredentials);
        }

        let pair = self.authority.issue(&account)?;
        tracing::info!(account_id = account.id, "Login succeeded");
        Ok((account, pair))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::config::TokenConfig;
    use crate::application::register::{RegisterInput, RegisterUseCase};
    use crate::infra::memory::{MemoryAccountRepository, MemoryTokenBlacklist};

    struct Fixture {
        repo: Arc<MemoryAccountRepository>,
        authority: Arc<TokenAuthority<MemoryTokenBlacklist>>,
        config: Arc<AccountsConfig>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                repo: Arc::new(MemoryAccountRepository::new()),
                authority: Arc::new(TokenAuthority::new(
                    Arc::new(MemoryTokenBlacklist::new()),
                    Arc::new(TokenConfig::development()),
                )),
                config: Arc::new(AccountsConfig::default()),
            }
        }

        async fn register(&self, email: &str, password: &str) {
            RegisterUseCase::new(self.repo.clone(), self.config.clone())
                .execute(RegisterInput {
                    email: email.to_string(),
                    username: None,
                    password: password.to_string(),
                    password2: password.to_string(),
                    avatar: None,
                })
                .await
                .unwrap();
        }

        fn login(&self) -> LoginUseCase<MemoryAccountRepository, MemoryTokenBlacklist> {
            LoginUseCase::new(self.repo.clone(), self.authority.clone(), self.config.clone())
        }
    }

    #[tokio::test]
    async fn login_with_valid_credentials_issues_tokens() {
        let fixture = Fixture::new();
        fixture.register("alice@example.com", "Django13$").await;

        let (account, pair) = fixture
            .login()
            .execute(LoginInput {
                email: "alice@example.com".to_string(),
                password: "Django13$".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(account.email.as_str(), "alice@example.com");
        let claims = fixture.authority.authenticate(&pair.access).unwrap();
        assert_eq!(claims.account_id(), Some(account.id));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_indistinguishable() {
        let fixture = Fixture::new();
        fixture.register("alice@example.com", "Django13$").await;

        let wrong_password = fixture
            .login()
            .execute(LoginInput {
                email: "alice@example.com".to_string(),
                password: "WrongPass1$".to_string(),
            })
            .await
            .unwrap_err();
        let unknown_email = fixture
            .login()
            .execute(LoginInput {
                email: "nobody@example.com".to_string(),
                password: "Django13$".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, AccountError::InvalidCredentials));
        assert!(matches!(unknown_email, AccountError::InvalidCredentials));
    }

    #[tokio::test]
    async fn email_lookup_is_case_insensitive() {
        let fixture = Fixture::new();
        fixture.register("alice@example.com", "Django13$").await;

        let result = fixture
            .login()
            .execute(LoginInput {
                email: "Alice@Example.COM".to_string(),
                password: "Django13$".to_string(),
            })
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn passwordless_account_cannot_login_with_password() {
        use crate::domain::entity::account::NewAccount;
        use crate::domain::repository::AccountRepository;
        use crate::domain::value_object::{email::Email, username::Username};

        let fixture = Fixture::new();
        fixture
            .repo
            .create(&NewAccount::from_external_identity(
                Email::new("federated@example.com").unwrap(),
                Username::new("federated").unwrap(),
            ))
            .await
            .unwrap();

        let err = fixture
            .login()
            .execute(LoginInput {
                email: "federated@example.com".to_string(),
                password: "Whatever13$".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AccountError::InvalidCredentials));
    }
}
