//! HTTP Handlers

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use std::sync::Arc;

use crate::application::config::AccountsConfig;
use crate::application::oauth_login::{IdentityResolver, OauthLoginUseCase};
use crate::application::token_authority::TokenAuthority;
use crate::application::{LoginInput, LoginUseCase, LogoutUseCase, RegisterInput, RegisterUseCase};
use crate::domain::repository::{AccountRepository, TokenBlacklistRepository};
use crate::error::{AccountError, AccountResult};
use crate::presentation::dto::{
    AuthResponse, GoogleLoginRequest, LoginRequest, LogoutRequest, MessageResponse, PageQuery,
    RegisterRequest, UserListResponse, UserPayload,
};
use crate::presentation::middleware::CurrentUser;

/// Shared state for accounts handlers
pub struct AccountsAppState<R, P, B>
where
    R: AccountRepository + Send + Sync + 'static,
    P: IdentityResolver + Send + Sync + 'static,
    B: TokenBlacklistRepository + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub resolver: Arc<P>,
    pub authority: Arc<TokenAuthority<B>>,
    pub config: Arc<AccountsConfig>,
}

impl<R, P, B> Clone for AccountsAppState<R, P, B>
where
    R: AccountRepository + Send + Sync + 'static,
    P: IdentityResolver + Send + Sync + 'static,
    B: TokenBlacklistRepository + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            resolver: self.resolver.clone(),
            authority: self.authority.clone(),
            config: self.config.clone(),
        }
    }
}

// ============================================================================
// Register
// ============================================================================

/// POST /api/accounts/register (admin)
pub async fn register<R, P, B>(
    State(state): State<AccountsAppState<R, P, B>>,
    Json(req): Json<RegisterRequest>,
) -> AccountResult<impl IntoResponse>
where
    R: AccountRepository + Send + Sync + 'static,
    P: IdentityResolver + Send + Sync + 'static,
    B: TokenBlacklistRepository + Send + Sync + 'static,
{
    let use_case = RegisterUseCase::new(state.repo.clone(), state.config.clone());

    let account = use_case
        .execute(RegisterInput {
            email: req.email,
            username: req.username,
            password: req.password,
            password2: req.password2,
            avatar: req.avatar,
        })
        .await?;

    let tokens = state.authority.issue(&account)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse::new(
            "user registered successfully",
            &account,
            tokens,
        )),
    ))
}

// ============================================================================
// Login / Logout
// ============================================================================

/// POST /api/accounts/login (public)
pub async fn login<R, P, B>(
    State(state): State<AccountsAppState<R, P, B>>,
    Json(req): Json<LoginRequest>,
) -> AccountResult<Json<AuthResponse>>
where
    R: AccountRepository + Send + Sync + 'static,
    P: IdentityResolver + Send + Sync + 'static,
    B: TokenBlacklistRepository + Send + Sync + 'static,
{
    let use_case = LoginUseCase::new(
        state.repo.clone(),
        state.authority.clone(),
        state.config.clone(),
    );

    let (account, tokens) = use_case
        .execute(LoginInput {
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok(Json(AuthResponse::new(
        "login successful",
        &account,
        tokens,
    )))
}

/// POST /api/accounts/logout (authenticated)
pub async fn logout<R, P, B>(
    State(state): State<AccountsAppState<R, P, B>>,
    Json(req): Json<LogoutRequest>,
) -> AccountResult<Json<MessageResponse>>
where
    R: AccountRepository + Send + Sync + 'static,
    P: IdentityResolver + Send + Sync + 'static,
    B: TokenBlacklistRepository + Send + Sync + 'static,
{
    LogoutUseCase::new(state.authority.clone())
        .execute(&req.refresh)
        .await?;

    Ok(Json(MessageResponse {
        message: "logout successful".to_string(),
    }))
}

// ============================================================================
// Federated Login
// ============================================================================

/// POST /api/accounts/google (public)
pub async fn google_login<R, P, B>(
    State(state): State<AccountsAppState<R, P, B>>,
    Json(req): Json<GoogleLoginRequest>,
) -> AccountResult<Json<AuthResponse>>
where
    R: AccountRepository + Send + Sync + 'static,
    P: IdentityResolver + Send + Sync + 'static,
    B: TokenBlacklistRepository + Send + Sync + 'static,
{
    let use_case = OauthLoginUseCase::new(
        state.repo.clone(),
        state.resolver.clone(),
        state.authority.clone(),
    );

    let (account, tokens, created) = use_case.execute(&req.credential).await?;

    let message = if created {
        "account created"
    } else {
        "login successful"
    };

    Ok(Json(AuthResponse::new(message, &account, tokens)))
}

// ============================================================================
// Current Account
// ============================================================================

/// GET /api/accounts/me (authenticated)
pub async fn me<R, P, B>(
    State(state): State<AccountsAppState<R, P, B>>,
    Extension(current_user): Extension<CurrentUser>,
) -> AccountResult<Json<UserPayload>>
where
    R: AccountRepository + Send + Sync + 'static,
    P: IdentityResolver + Send + Sync + 'static,
    B: TokenBlacklistRepository + Send + Sync + 'static,
{
    // A valid token for a since-deleted account is no longer usable
    let account = state
        .repo
        .find_by_id(current_user.account_id)
        .await?
        .ok_or(AccountError::Unauthorized)?;

    Ok(Json(UserPayload::from(&account)))
}

// ============================================================================
// Admin: User Management
// ============================================================================

/// GET /api/admin/users (admin)
pub async fn admin_list_users<R, P, B>(
    State(state): State<AccountsAppState<R, P, B>>,
    Query(query): Query<PageQuery>,
) -> AccountResult<Json<UserListResponse>>
where
    R: AccountRepository + Send + Sync + 'static,
    P: IdentityResolver + Send + Sync + 'static,
    B: TokenBlacklistRepository + Send + Sync + 'static,
{
    let (limit, offset) = page_window(&state.config, &query);

    let count = state.repo.count().await?;
    let accounts = state.repo.list(limit, offset).await?;

    Ok(Json(UserListResponse {
        count,
        results: accounts.iter().map(UserPayload::from).collect(),
    }))
}

/// GET /api/admin/users/{id} (admin)
pub async fn admin_get_user<R, P, B>(
    State(state): State<AccountsAppState<R, P, B>>,
    Path(id): Path<i64>,
) -> AccountResult<Json<UserPayload>>
where
    R: AccountRepository + Send + Sync + 'static,
    P: IdentityResolver + Send + Sync + 'static,
    B: TokenBlacklistRepository + Send + Sync + 'static,
{
    let account = state
        .repo
        .find_by_id(id)
        .await?
        .ok_or(AccountError::NotFound)?;

    Ok(Json(UserPayload::from(&account)))
}

/// DELETE /api/admin/users/{id} (admin)
pub async fn admin_delete_user<R, P, B>(
    State(state): State<AccountsAppState<R, P, B>>,
    Path(id): Path<i64>,
) -> AccountResult<StatusCode>
where
    R: AccountRepository + Send + Sync + 'static,
    P: IdentityResolver + Send + Sync + 'static,
    B: TokenBlacklistRepository + Send + Sync + 'static,
{
    if !state.repo.delete(id).await? {
        return Err(AccountError::NotFound);
    }

    tracing::info!(account_id = id, "Account deleted by admin");
    Ok(StatusCode::NO_CONTENT)
}

/// Resolve page/page_size query parameters into a limit/offset window,
/// clamped to the configured maximum.
fn page_window(config: &AccountsConfig, query: &PageQuery) -> (i64, i64) {
    let page = query.page.unwrap_or(1).max(1);
    let page_size = query
        .page_size
        .unwrap_or(config.default_page_size)
        .clamp(1, config.max_page_size);
    // page comes straight from the query string; an absurdly large
    // value must not overflow the offset computation
    (page_size, (page - 1).saturating_mul(page_size))
}
