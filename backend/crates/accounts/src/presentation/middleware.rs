//! Access-Policy Middleware
//!
//! Three levels: public (no middleware), authenticated (valid Bearer
//! access token), admin (authenticated and superuser). A missing or
//! invalid token is 401; a valid token without superuser is 403 — the
//! two outcomes are distinct.

use axum::body::Body;
use axum::http::{Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::application::token_authority::TokenAuthority;
use crate::domain::repository::TokenBlacklistRepository;
use crate::error::AccountError;

/// Middleware state
pub struct AuthMiddlewareState<B>
where
    B: TokenBlacklistRepository + Send + Sync + 'static,
{
    pub authority: Arc<TokenAuthority<B>>,
}

impl<B> Clone for AuthMiddlewareState<B>
where
    B: TokenBlacklistRepository + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            authority: self.authority.clone(),
        }
    }
}

/// Validated identity stored in request extensions
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub account_id: i64,
    pub is_superuser: bool,
}

/// Middleware that requires a valid access token
pub async fn require_auth<B>(
    state: AuthMiddlewareState<B>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response>
where
    B: TokenBlacklistRepository + Send + Sync + 'static,
{
    let current_user = authenticate_request(&state, &req).map_err(|e| e.into_response())?;

    req.extensions_mut().insert(current_user);
    Ok(next.run(req).await)
}

/// Middleware that additionally requires the superuser flag
pub async fn require_admin<B>(
    state: AuthMiddlewareState<B>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response>
where
    B: TokenBlacklistRepository + Send + Sync + 'static,
{
    let current_user = authenticate_request(&state, &req).map_err(|e| e.into_response())?;

    if !current_user.is_superuser {
        return Err(AccountError::Forbidden.into_response());
    }

    req.extensions_mut().insert(current_user);
    Ok(next.run(req).await)
}

fn authenticate_request<B>(
    state: &AuthMiddlewareState<B>,
    req: &Request<Body>,
) -> Result<CurrentUser, AccountError>
where
    B: TokenBlacklistRepository + Send + Sync + 'static,
{
    let token = bearer_token(req).ok_or(AccountError::Unauthorized)?;
    let claims = state.authority.authenticate(token)?;
    let account_id = claims.account_id().ok_or(AccountError::Unauthorized)?;

    Ok(CurrentUser {
        account_id,
        is_superuser: claims.is_superuser,
    })
}

fn bearer_token(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
