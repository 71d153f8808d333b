//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use accounts::{
    AccountsAppState, AccountsConfig, GoogleAuthMode, GoogleConfig, GoogleResolver,
    PgAccountRepository, PgTokenBlacklist, TokenAuthority, TokenConfig, accounts_router,
    domain::repository::TokenBlacklistRepository,
};
use axum::{
    Router, http,
    http::{Method, header},
};
use base64::Engine;
use base64::engine::general_purpose;
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,accounts=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Startup cleanup: drop blacklist entries whose token has expired
    // Errors here should not prevent server startup
    let blacklist = PgTokenBlacklist::new(pool.clone());
    match blacklist.cleanup_expired().await {
        Ok(deleted) => {
            tracing::info!(tokens_deleted = deleted, "Revoked-token cleanup completed");
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Revoked-token cleanup failed, continuing anyway"
            );
        }
    }

    // Token signing configuration
    let token_config = if cfg!(debug_assertions) {
        TokenConfig::development()
    } else {
        // In production, load secret from environment
        let secret_b64 =
            env::var("TOKEN_SECRET").expect("TOKEN_SECRET must be set in production");
        let secret = Engine::decode(&general_purpose::STANDARD, &secret_b64)?;
        TokenConfig::new(secret)
    };

    // Accounts configuration (optional base64 pepper)
    let mut accounts_config = AccountsConfig::default();
    if let Ok(pepper_b64) = env::var("PASSWORD_PEPPER") {
        accounts_config.password_pepper =
            Some(Engine::decode(&general_purpose::STANDARD, &pepper_b64)?);
    }

    // Google identity provider configuration
    let google_config = GoogleConfig::new(
        env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
        env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
        env::var("GOOGLE_REDIRECT_URI").unwrap_or_default(),
    )
    .with_mode(match env::var("GOOGLE_AUTH_MODE").as_deref() {
        Ok("auth_code") => GoogleAuthMode::AuthCode,
        _ => GoogleAuthMode::IdToken,
    });

    let authority = Arc::new(TokenAuthority::new(
        Arc::new(blacklist),
        Arc::new(token_config),
    ));
    let resolver = Arc::new(GoogleResolver::new(Arc::new(google_config))?);

    let state = AccountsAppState {
        repo: Arc::new(PgAccountRepository::new(pool.clone())),
        resolver,
        authority,
        config: Arc::new(accounts_config),
    };

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .nest("/api", accounts_router(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
