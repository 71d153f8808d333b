//! Token Authority
//!
//! Mints, validates and revokes the signed token pairs that carry
//! account identity. Refresh tokens move through
//! `issued → active → (revoked | expired)`; only an active refresh
//! token mints new access tokens. Access tokens are validated
//! statelessly — signature and expiry only, no revocation-list lookup.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::config::TokenConfig;
use crate::domain::entity::account::Account;
use crate::domain::repository::TokenBlacklistRepository;
use crate::error::{AccountError, AccountResult};

/// `token_type` claim value for access tokens
pub const TOKEN_TYPE_ACCESS: &str = "access";
/// `token_type` claim value for refresh tokens
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

/// Claims embedded in every token we sign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject — account id as a string
    pub sub: String,
    /// "access" or "refresh"
    pub token_type: String,
    /// Issuer
    pub iss: String,
    /// Issued-at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// Unique token id; the revocation list is keyed by this
    pub jti: String,
    /// Superuser flag, so the access policy needs no store lookup
    pub is_superuser: bool,
}

impl TokenClaims {
    /// Parsed account id, None if the subject is malformed.
    pub fn account_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }

    /// Expiry as a timestamp.
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

/// An access/refresh pair issued for one account at one point in time.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Signs and verifies token pairs against a process-wide secret and
/// consults the durable revocation list for refresh tokens.
pub struct TokenAuthority<B>
where
    B: TokenBlacklistRepository,
{
    blacklist: Arc<B>,
    config: Arc<TokenConfig>,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl<B> TokenAuthority<B>
where
    B: TokenBlacklistRepository,
{
    pub fn new(blacklist: Arc<B>, config: Arc<TokenConfig>) -> Self {
        let encoding = EncodingKey::from_secret(&config.secret);
        let decoding = DecodingKey::from_secret(&config.secret);
        Self {
            blacklist,
            config,
            encoding,
            decoding,
        }
    }

    /// Mint a fresh token pair for an account.
    pub fn issue(&self, account: &Account) -> AccountResult<TokenPair> {
        let access = self.sign(account, TOKEN_TYPE_ACCESS, self.config.access_ttl_secs())?;
        let refresh = self.sign(account, TOKEN_TYPE_REFRESH, self.config.refresh_ttl_secs())?;

        tracing::debug!(account_id = account.id, "Issued token pair");

        Ok(TokenPair { access, refresh })
    }

    /// Validate an access token and return its claims.
    ///
    /// Fails `Unauthorized` on any signature/expiry/type problem. The
    /// revocation list is deliberately not consulted here.
    pub fn authenticate(&self, access_token: &str) -> AccountResult<TokenClaims> {
        self.decode(access_token, TOKEN_TYPE_ACCESS)
            .ok_or(AccountError::Unauthorized)
    }

    /// Exchange an active refresh token for a new access token.
    pub async fn refresh(&self, refresh_token: &str) -> AccountResult<String> {
        let claims = self
            .decode(refresh_token, TOKEN_TYPE_REFRESH)
            .ok_or(AccountError::InvalidToken)?;

        if self.blacklist.contains(&claims.jti).await? {
            return Err(AccountError::InvalidToken);
        }

        let account_id = claims.account_id().ok_or(AccountError::InvalidToken)?;
        self.sign_raw(
            account_id,
            claims.is_superuser,
            TOKEN_TYPE_ACCESS,
            self.config.access_ttl_secs(),
        )
    }

    /// Revoke a refresh token by blacklisting its jti.
    ///
    /// Fails `InvalidToken` when the token does not verify, and also
    /// when it was already revoked: the second revoke is a client
    /// error, matching the issued → revoked state machine (there is no
    /// revoked → revoked edge).
    pub async fn revoke(&self, refresh_token: &str) -> AccountResult<()> {
        let claims = self
            .decode(refresh_token, TOKEN_TYPE_REFRESH)
            .ok_or(AccountError::InvalidToken)?;

        let inserted = self
            .blacklist
            .insert(&claims.jti, claims.expires_at())
            .await?;

        if !inserted {
            return Err(AccountError::InvalidToken);
        }

        tracing::info!(jti = %claims.jti, "Refresh token revoked");
        Ok(())
    }

    fn sign(&self, account: &Account, token_type: &str, ttl_secs: i64) -> AccountResult<String> {
        self.sign_raw(account.id, account.is_superuser, token_type, ttl_secs)
    }

    fn sign_raw(
        &self,
        account_id: i64,
        is_superuser: bool,
        token_type: &str,
        ttl_secs: i64,
    ) -> AccountResult<String> {
        let now = Utc::now().timestamp();
        let claims = TokenClaims {
            sub: account_id.to_string(),
            token_type: token_type.to_string(),
            iss: self.config.issuer.clone(),
            iat: now,
            exp: now + ttl_secs,
            jti: Uuid::new_v4().to_string(),
            is_superuser,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AccountError::Internal(format!("token encode: {e}")))
    }

    /// Decode and verify a token of the expected type. Every failure
    /// mode (bad signature, expired, wrong issuer, wrong type)
    /// collapses to None; callers pick the error for their context.
    fn decode(&self, token: &str, expected_type: &str) -> Option<TokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_required_spec_claims(&["exp", "iat", "iss"]);
        validation.leeway = 0;

        let claims = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .ok()?;

        if claims.token_type != expected_type {
            return None;
        }

        Some(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::{email::Email, username::Username};
    use crate::infra::memory::MemoryTokenBlacklist;

    fn test_account(id: i64, is_superuser: bool) -> Account {
        let now = Utc::now();
        Account {
            id,
            email: Email::new(format!("user{id}@example.com")).unwrap(),
            username: Username::new(format!("user{id}")).unwrap(),
            password_hash: None,
            is_superuser,
            avatar: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn test_authority() -> TokenAuthority<MemoryTokenBlacklist> {
        TokenAuthority::new(
            Arc::new(MemoryTokenBlacklist::new()),
            Arc::new(TokenConfig::development()),
        )
    }

    #[test]
    fn issue_authenticate_roundtrip() {
        let authority = test_authority();
        let account = test_account(42, true);

        let pair = authority.issue(&account).unwrap();
        let claims = authority.authenticate(&pair.access).unwrap();

        assert_eq!(claims.account_id(), Some(42));
        assert!(claims.is_superuser);
        assert_eq!(claims.token_type, TOKEN_TYPE_ACCESS);
    }

    #[test]
    fn jti_is_unique_per_token() {
        let authority = test_authority();
        let account = test_account(1, false);

        let p1 = authority.issue(&account).unwrap();
        let p2 = authority.issue(&account).unwrap();

        let c1 = authority.authenticate(&p1.access).unwrap();
        let c2 = authority.authenticate(&p2.access).unwrap();
        assert_ne!(c1.jti, c2.jti);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let authority = test_authority();
        let pair = authority.issue(&test_account(1, false)).unwrap();

        assert!(matches!(
            authority.authenticate(&pair.refresh),
            Err(AccountError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn access_token_cannot_refresh_or_be_revoked() {
        let authority = test_authority();
        let pair = authority.issue(&test_account(1, false)).unwrap();

        assert!(matches!(
            authority.refresh(&pair.access).await,
            Err(AccountError::InvalidToken)
        ));
        assert!(matches!(
            authority.revoke(&pair.access).await,
            Err(AccountError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn refresh_mints_new_access_token() {
        let authority = test_authority();
        let account = test_account(7, false);
        let pair = authority.issue(&account).unwrap();

        let access = authority.refresh(&pair.refresh).await.unwrap();
        let claims = authority.authenticate(&access).unwrap();
        assert_eq!(claims.account_id(), Some(7));
    }

    #[tokio::test]
    async fn revoked_refresh_token_never_refreshes_again() {
        let authority = test_authority();
        let pair = authority.issue(&test_account(1, false)).unwrap();

        authority.revoke(&pair.refresh).await.unwrap();

        assert!(matches!(
            authority.refresh(&pair.refresh).await,
            Err(AccountError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn revoking_twice_fails() {
        let authority = test_authority();
        let pair = authority.issue(&test_account(1, false)).unwrap();

        authority.revoke(&pair.refresh).await.unwrap();

        assert!(matches!(
            authority.revoke(&pair.refresh).await,
            Err(AccountError::InvalidToken)
        ));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let authority = test_authority();
        let pair = authority.issue(&test_account(1, false)).unwrap();

        let mut tampered = pair.access.clone();
        tampered.pop();
        tampered.push('x');

        assert!(authority.authenticate(&tampered).is_err());
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let authority_a = test_authority();
        let authority_b = test_authority();
        let pair = authority_a.issue(&test_account(1, false)).unwrap();

        assert!(authority_b.authenticate(&pair.access).is_err());
    }

    #[test]
    fn expired_access_token_is_rejected() {
        let config = Arc::new(TokenConfig::development());
        let authority = TokenAuthority::new(Arc::new(MemoryTokenBlacklist::new()), config.clone());

        // Hand-craft an already-expired token with the same secret
        let now = Utc::now().timestamp();
        let claims = TokenClaims {
            sub: "1".to_string(),
            token_type: TOKEN_TYPE_ACCESS.to_string(),
            iss: config.issuer.clone(),
            iat: now - 3600,
            exp: now - 60,
            jti: Uuid::new_v4().to_string(),
            is_superuser: false,
        };
        let expired = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&config.secret),
        )
        .unwrap();

        assert!(matches!(
            authority.authenticate(&expired),
            Err(AccountError::Unauthorized)
        ));
    }
}
