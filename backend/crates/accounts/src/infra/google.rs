//! Google Identity Provider Client
//!
//! Two resolvers for the two credential shapes Google sign-in can
//! produce, behind one enum. A deployment accepts exactly one shape,
//! chosen by configuration.

use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::application::config::{GoogleAuthMode, GoogleConfig};
use crate::application::oauth_login::{ExternalIdentity, IdentityResolver};
use crate::error::{AccountError, AccountResult};

/// Issuer values Google uses for ID tokens
const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Identity claims carried in a Google ID token / userinfo response
#[derive(Debug, Deserialize)]
struct GoogleClaims {
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

impl From<GoogleClaims> for ExternalIdentity {
    fn from(claims: GoogleClaims) -> Self {
        ExternalIdentity {
            email: claims.email,
            name: claims.name,
            picture: claims.picture,
        }
    }
}

/// Configured resolver for the deployment's chosen credential shape
pub enum GoogleResolver {
    IdToken(GoogleIdTokenResolver),
    AuthCode(GoogleAuthCodeResolver),
}

impl GoogleResolver {
    pub fn new(config: Arc<GoogleConfig>) -> AccountResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AccountError::Internal(format!("http client: {e}")))?;

        Ok(match config.mode {
            GoogleAuthMode::IdToken => {
                Self::IdToken(GoogleIdTokenResolver { config, http })
            }
            GoogleAuthMode::AuthCode => {
                Self::AuthCode(GoogleAuthCodeResolver { config, http })
            }
        })
    }
}

impl IdentityResolver for GoogleResolver {
    async fn resolve(&self, credential: &str) -> AccountResult<ExternalIdentity> {
        match self {
            Self::IdToken(resolver) => resolver.resolve(credential).await,
            Self::AuthCode(resolver) => resolver.resolve(credential).await,
        }
    }
}

// ============================================================================
// ID Token Verification
// ============================================================================

/// Verifies a client-supplied ID token against Google's published
/// signing keys. Every failure mode (bad signature, wrong audience,
/// wrong issuer, expired, unknown key, network error) collapses to
/// `ProviderTokenInvalid`; the distinction only matters in the logs.
pub struct GoogleIdTokenResolver {
    config: Arc<GoogleConfig>,
    http: reqwest::Client,
}

impl GoogleIdTokenResolver {
    async fn resolve(&self, id_token: &str) -> AccountResult<ExternalIdentity> {
        let header = jsonwebtoken::decode_header(id_token).map_err(|e| {
            tracing::warn!(error = %e, "ID token header unparseable");
            AccountError::ProviderTokenInvalid
        })?;
        let kid = header.kid.ok_or_else(|| {
            tracing::warn!("ID token carries no kid");
            AccountError::ProviderTokenInvalid
        })?;

        let jwks = self.fetch_jwks().await?;
        let jwk = jwks.find(&kid).ok_or_else(|| {
            tracing::warn!(kid = %kid, "No matching key in provider JWKS");
            AccountError::ProviderTokenInvalid
        })?;

        let key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
            .map_err(|_| AccountError::ProviderTokenInvalid)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.config.client_id]);
        validation.set_issuer(&GOOGLE_ISSUERS);

        let data = jsonwebtoken::decode::<GoogleClaims>(id_token, &key, &validation)
            .map_err(|e| {
                tracing::warn!(error = %e, "ID token failed verification");
                AccountError::ProviderTokenInvalid
            })?;

        Ok(data.claims.into())
    }

    async fn fetch_jwks(&self) -> AccountResult<Jwks> {
        let response = self
            .http
            .get(&self.config.jwks_url)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "JWKS fetch failed");
                AccountError::ProviderTokenInvalid
            })?;

        response.json::<Jwks>().await.map_err(|e| {
            tracing::warn!(error = %e, "JWKS response unparseable");
            AccountError::ProviderTokenInvalid
        })
    }
}

/// JSON Web Key Set as served by the provider's certs endpoint
#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

impl Jwks {
    fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid == kid)
    }
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    /// RSA modulus, base64url
    n: String,
    /// RSA exponent, base64url
    e: String,
}

// ============================================================================
// Authorization-Code Exchange
// ============================================================================

/// Exchanges a one-time authorization code server-side, then reads the
/// userinfo endpoint. Unlike ID-token verification, the raw provider
/// error body is preserved in the error (and the logs) because the two
/// failing round-trips are operationally distinct.
pub struct GoogleAuthCodeResolver {
    config: Arc<GoogleConfig>,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TokenExchangeResponse {
    access_token: String,
}

impl GoogleAuthCodeResolver {
    async fn resolve(&self, code: &str) -> AccountResult<ExternalIdentity> {
        let access_token = self.exchange_code(code).await?;
        self.fetch_userinfo(&access_token).await
    }

    async fn exchange_code(&self, code: &str) -> AccountResult<String> {
        let params = [
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AccountError::TokenExchangeFailed(e.to_string()))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AccountError::TokenExchangeFailed(body));
        }

        let exchange = response
            .json::<TokenExchangeResponse>()
            .await
            .map_err(|e| AccountError::TokenExchangeFailed(e.to_string()))?;

        Ok(exchange.access_token)
    }

    async fn fetch_userinfo(&self, access_token: &str) -> AccountResult<ExternalIdentity> {
        let response = self
            .http
            .get(&self.config.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AccountError::UserinfoFailed(e.to_string()))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AccountError::UserinfoFailed(body));
        }

        let claims = response
            .json::<GoogleClaims>()
            .await
            .map_err(|e| AccountError::UserinfoFailed(e.to_string()))?;

        Ok(claims.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jwks_parses_and_finds_by_kid() {
        let jwks: Jwks = serde_json::from_str(
            r#"{
                "keys": [
                    {"kty": "RSA", "alg": "RS256", "use": "sig",
                     "kid": "abc123", "n": "modulus-a", "e": "AQAB"},
                    {"kty": "RSA", "alg": "RS256", "use": "sig",
                     "kid": "def456", "n": "modulus-b", "e": "AQAB"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(jwks.find("def456").unwrap().n, "modulus-b");
        assert!(jwks.find("missing").is_none());
    }

    #[test]
    fn claims_convert_to_external_identity() {
        let claims: GoogleClaims = serde_json::from_str(
            r#"{
                "sub": "10987654321",
                "email": "newuser@example.com",
                "email_verified": true,
                "name": "New User",
                "picture": "https://example.com/avatar.png"
            }"#,
        )
        .unwrap();

        let identity: ExternalIdentity = claims.into();
        assert_eq!(identity.email.as_deref(), Some("newuser@example.com"));
        assert_eq!(identity.name.as_deref(), Some("New User"));
        assert_eq!(
            identity.picture.as_deref(),
            Some("https://example.com/avatar.png")
        );
    }

    #[test]
    fn claims_tolerate_missing_optional_fields() {
        let claims: GoogleClaims = serde_json::from_str(r#"{"sub": "10987654321"}"#).unwrap();
        let identity: ExternalIdentity = claims.into();
        assert!(identity.email.is_none());
        assert!(identity.picture.is_none());
    }
}
