//! Homestead - A lightweight real-estate listing platform

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use homestead::{
    api::{self, AppState},
    config::Config,
    db::{
        self,
        repositories::{SqlxListingRepository, SqlxUserRepository},
    },
    services::{ListingService, SigninRateLimiter, TokenService, UserService},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "homestead=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Homestead...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Create repositories and services
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let listing_repo = SqlxListingRepository::boxed(pool.clone());

    let user_service = Arc::new(UserService::new(user_repo));
    let listing_service = Arc::new(ListingService::new(listing_repo));
    let token_service = TokenService::new(
        &config.auth.token_secret,
        config.auth.token_expiration_days,
    );

    let rate_limiter = Arc::new(SigninRateLimiter::new());

    let state = AppState {
        user_service,
        listing_service,
        token_service,
        rate_limiter: rate_limiter.clone(),
        upload_config: Arc::new(config.upload.clone()),
    };

    // Start rate limiter cleanup task (runs every 5 minutes)
    {
        let limiter = rate_limiter.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(300));
            loop {
                interval.tick().await;
                limiter.cleanup().await;
            }
        });
    }

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    pool.close().await;

    Ok(())
}
