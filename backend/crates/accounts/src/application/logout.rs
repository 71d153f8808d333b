//! Logout Use Case
//!
//! Logout is refresh-token revocation. The access token keeps working
//! until it expires on its own; only the long-lived credential is
//! withdrawn.

use std::sync::Arc;

use crate::application::token_authority::TokenAuthority;
use crate::domain::repository::TokenBlacklistRepository;
use crate::error::AccountResult;

pub struct LogoutUseCase<B>
where
    B: TokenBlacklistRepository,
{
    authority: Arc<TokenAuthority<B>>,
}

impl<B> LogoutUseCase<B>
where
    B: TokenBlacklistRepository,
{
    pub fn new(authority: Arc<TokenAuthority<B>>) -> Self {
        Self { authority }
    }

    /// Revoke the presented refresh token. Fails when the token does
    /// not verify or was already revoked.
    pub async fn execute(&self, refresh_token: &str) -> AccountResult<()> {
        self.authority.revoke(refresh_token).await
    }
}
