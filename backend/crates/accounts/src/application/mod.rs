//! Application Layer
//!
//! Use cases and application services.

pub mod config;
pub mod login;
pub mod logout;
pub mod oauth_login;
pub mod register;
pub mod token_authority;

// Re-exports
pub use config::{AccountsConfig, GoogleAuthMode, GoogleConfig, TokenConfig};
pub use login::{LoginInput, LoginUseCase};
pub use logout::LogoutUseCase;
pub use oauth_login::{ExternalIdentity, IdentityResolver, OauthLoginUseCase};
pub use register::{RegisterInput, RegisterUseCase};
pub use token_authority::{TokenAuthority, TokenClaims, TokenPair};
