//! Accounts Router

use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post},
};

use crate::application::oauth_login::IdentityResolver;
use crate::domain::repository::{AccountRepository, TokenBlacklistRepository};
use crate::presentation::handlers::{self, AccountsAppState};
use crate::presentation::middleware::{AuthMiddlewareState, require_admin, require_auth};

/// Create the accounts router.
///
/// Routes are grouped by access level; the caller nests the result
/// under `/api`. Registration sits behind the admin gate alongside the
/// user-management routes.
pub fn accounts_router<R, P, B>(state: AccountsAppState<R, P, B>) -> Router
where
    R: AccountRepository + Send + Sync + 'static,
    P: IdentityResolver + Send + Sync + 'static,
    B: TokenBlacklistRepository + Send + Sync + 'static,
{
    let auth_state = AuthMiddlewareState {
        authority: state.authority.clone(),
    };
    let admin_state = auth_state.clone();

    let public = Router::new()
        .route("/accounts/login", post(handlers::login::<R, P, B>))
        .route("/accounts/google", post(handlers::google_login::<R, P, B>));

    let authenticated = Router::new()
        .route("/accounts/logout", post(handlers::logout::<R, P, B>))
        .route("/accounts/me", get(handlers::me::<R, P, B>))
        .route_layer(from_fn(move |req, next| {
            require_auth(auth_state.clone(), req, next)
        }));

    let admin = Router::new()
        .route("/accounts/register", post(handlers::register::<R, P, B>))
        .route("/admin/users", get(handlers::admin_list_users::<R, P, B>))
        .route(
            "/admin/users/{id}",
            get(handlers::admin_get_user::<R, P, B>)
                .delete(handlers::admin_delete_user::<R, P, B>),
        )
        .route_layer(from_fn(move |req, next| {
            require_admin(admin_state.clone(), req, next)
        }));

    Router::new()
        .merge(public)
        .merge(authenticated)
        .merge(admin)
        .with_state(state)
}
