//! Federated Login Use Case
//!
//! Get-or-create login from a verified external identity. First login
//! provisions a passwordless account; later logins reuse it. Both
//! paths end with a freshly issued token pair.

use std::sync::Arc;

use uuid::Uuid;

use crate::application::token_authority::{TokenAuthority, TokenPair};
use crate::domain::entity::account::{Account, NewAccount};
use crate::domain::repository::{AccountRepository, TokenBlacklistRepository};
use crate::domain::value_object::{email::Email, username::Username};
use crate::error::{AccountError, AccountResult};

/// Identity claims extracted from a provider credential.
#[derive(Debug, Clone, Default)]
pub struct ExternalIdentity {
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Turns an opaque provider credential into verified identity claims.
///
/// Verification happens entirely inside the resolver; the use case
/// trusts whatever comes back.
#[trait_variant::make(IdentityResolver: Send)]
pub trait LocalIdentityResolver {
    async fn resolve(&self, credential: &str) -> AccountResult<ExternalIdentity>;
}

pub struct OauthLoginUseCase<R, P, B>
where
    R: AccountRepository,
    P: IdentityResolver,
    B: TokenBlacklistRepository,
{
    repo: Arc<R>,
    resolver: Arc<P>,
    authority: Arc<TokenAuthority<B>>,
}

impl<R, P, B> OauthLoginUseCase<R, P, B>
where
    R: AccountRepository,
    P: IdentityResolver,
    B: TokenBlacklistRepository,
{
    pub fn new(repo: Arc<R>, resolver: Arc<P>, authority: Arc<TokenAuthority<B>>) -> Self {
        Self {
            repo,
            resolver,
            authority,
        }
    }

    /// Resolve the credential, find or provision the account, and
    /// issue a token pair. The bool is true when a new account was
    /// created.
    pub async fn execute(&self, credential: &str) -> AccountResult<(Account, TokenPair, bool)> {
        let identity = self.resolver.resolve(credential).await?;

        let email = identity.email.as_deref().ok_or(AccountError::MissingEmail)?;
        let email = Email::new(email).map_err(|_| AccountError::MissingEmail)?;

        if let Some(account) = self.repo.find_by_email(&email).await? {
            let pair = self.authority.issue(&account)?;
            return Ok((account, pair, false));
        }

        let account = self.provision(&email, identity.picture.clone()).await?;
        let pair = self.authority.issue(&account)?;
        tracing::info!(account_id = account.id, "Account provisioned from external identity");
        Ok((account, pair, true))
    }

    /// Insert a passwordless account for a first-time federated login.
    ///
    /// Uniqueness races resolve in favor of whoever inserted first: a
    /// duplicate email means another request provisioned the same
    /// account concurrently, so reload and reuse it; a duplicate
    /// username gets one retry with a random suffix.
    async fn provision(&self, email: &Email, avatar: Option<String>) -> AccountResult<Account> {
        let base = match Username::from_email(email) {
            Ok(username) => username,
            // Local part not usable as a username; fall back to a
            // generated one
            Err(_) => Username::new(format!("user-{}", random_suffix()))
                .map_err(|e| AccountError::Internal(e.message().to_string()))?,
        };

        let mut username = base.clone();
        for attempt in 0..2 {
            let mut draft = NewAccount::from_external_identity(email.clone(), username.clone());
            draft.avatar = avatar.clone();

            match self.repo.create(&draft).await {
                Ok(account) => return Ok(account),
                Err(AccountError::DuplicateEmail) => {
                    // Lost the get-or-create race; the account exists now
                    return self
                        .repo
                        .find_by_email(email)
                        .await?
                        .ok_or_else(|| AccountError::Internal("account vanished after duplicate email".into()));
                }
                Err(AccountError::DuplicateUsername) if attempt == 0 => {
                    username = base
                        .with_suffix(&random_suffix())
                        .map_err(|e| AccountError::Internal(e.message().to_string()))?;
                }
                Err(e) => return Err(e),
            }
        }

        Err(AccountError::DuplicateUsername)
    }
}

fn random_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}
