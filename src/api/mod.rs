//! API layer - HTTP handlers and routing
//!
//! All HTTP endpoints for the Homestead API:
//! - Auth endpoints (signup, signin, federated signin, signout)
//! - User endpoints (profile, account deletion, own listings)
//! - Listing endpoints (CRUD and search)
//! - Upload endpoint (self-hosted images)

pub mod auth;
pub mod listings;
pub mod middleware;
pub mod upload;
pub mod users;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Routes that need a valid access token
    let protected_routes = Router::new()
        .nest("/user", users::protected_router())
        .nest("/listing", listings::protected_router())
        .nest("/upload", upload::router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .nest("/auth", auth::router())
        .nest("/user", users::public_router())
        .nest("/listing", listings::public_router())
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    // CORS must allow credentials so the token cookie travels
    let cors = CorsLayer::new()
        .allow_origin(
            cors_origin
                .parse::<HeaderValue>()
                .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:5173")),
        )
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    Router::new()
        .nest("/api", build_api_router(state.clone()))
        .route("/uploads/{filename}", get(upload::serve_upload))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
