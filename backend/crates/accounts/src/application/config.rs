//! Application Configuration
//!
//! Explicit configuration structs for the accounts service. Nothing
//! in the core reads ambient process state; `main` builds these from
//! the environment and passes them in.

use std::time::Duration;

/// General accounts configuration
#[derive(Debug, Clone)]
pub struct AccountsConfig {
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// Default admin-list page size
    pub default_page_size: i64,
    /// Hard cap on admin-list page size
    pub max_page_size: i64,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            password_pepper: None,
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

impl AccountsConfig {
    /// Password pepper as a slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}

/// Token signing configuration
///
/// The signing secret is process-wide and supplied at construction;
/// token lifetimes follow the usual short-access/long-refresh split.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// HMAC-SHA256 signing secret (32 bytes recommended)
    pub secret: Vec<u8>,
    /// `iss` claim, validated on every decode
    pub issuer: String,
    /// Access token lifetime (15 minutes)
    pub access_ttl: Duration,
    /// Refresh token lifetime (7 days)
    pub refresh_ttl: Duration,
}

impl TokenConfig {
    pub fn new(secret: Vec<u8>) -> Self {
        Self {
            secret,
            issuer: "accounts-api".to_string(),
            access_ttl: Duration::from_secs(15 * 60),
            refresh_ttl: Duration::from_secs(7 * 24 * 3600),
        }
    }

    /// Config with a random secret (for development and tests)
    pub fn development() -> Self {
        use uuid::Uuid;
        let mut secret = Vec::with_capacity(32);
        secret.extend_from_slice(Uuid::new_v4().as_bytes());
        secret.extend_from_slice(Uuid::new_v4().as_bytes());
        Self::new(secret)
    }

    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl.as_secs() as i64
    }

    pub fn refresh_ttl_secs(&self) -> i64 {
        self.refresh_ttl.as_secs() as i64
    }
}

/// Which OAuth artifact the deployment accepts.
///
/// The two variants are materially different trust models; a
/// deployment picks exactly one, they are never merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoogleAuthMode {
    /// Client sends a signed ID token; we verify it against Google's
    /// published keys
    IdToken,
    /// Client sends a one-time authorization code; we exchange it
    /// server-side
    AuthCode,
}

/// Google identity provider configuration
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// OAuth client id (the expected `aud` of ID tokens)
    pub client_id: String,
    /// OAuth client secret (authorization-code variant only)
    pub client_secret: String,
    /// Redirect URI registered with the provider (authorization-code
    /// variant only)
    pub redirect_uri: String,
    /// Which artifact this deployment accepts
    pub mode: GoogleAuthMode,
    /// Network timeout for provider calls; fail closed, never hang
    pub timeout: Duration,
    /// JWKS endpoint
    pub jwks_url: String,
    /// Token endpoint (authorization-code variant)
    pub token_url: String,
    /// Userinfo endpoint (authorization-code variant)
    pub userinfo_url: String,
}

impl GoogleConfig {
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            mode: GoogleAuthMode::IdToken,
            timeout: Duration::from_secs(10),
            jwks_url: "https://www.googleapis.com/oauth2/v3/certs".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_url: "https://openidconnect.googleapis.com/v1/userinfo".to_string(),
        }
    }

    pub fn with_mode(mut self, mode: GoogleAuthMode) -> Self {
        self.mode = mode;
        self
    }
}
