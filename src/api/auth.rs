//! Authentication API endpoints
//!
//! Handles HTTP requests for authentication:
//! - POST /api/auth/signup - Account registration
//! - POST /api/auth/signin - Email/password sign-in
//! - POST /api/auth/google - Provider-asserted sign-in
//! - GET /api/auth/signout - Clear the access token cookie

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState, TOKEN_COOKIE};
use crate::models::User;
use crate::services::{GoogleInput, SigninInput, SignupInput, ThrottleDecision};

/// Build the auth router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/google", post(google))
        .route("/signout", get(signout))
}

/// POST /api/auth/signup - Register a new account
///
/// Registration does not sign the user in; the client follows up with
/// a signin request.
async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupInput>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.user_service.signup(body).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /api/auth/signin - Sign in with email and password
///
/// Sets the `access_token` cookie on success. Sign-in attempts are
/// rate limited per email and per client IP.
async fn signin(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SigninInput>,
) -> Result<impl IntoResponse, ApiError> {
    let ip = extract_ip_address(&headers).and_then(|s| s.parse().ok());
    match state.rate_limiter.check_signin(&body.email, ip).await {
        ThrottleDecision::IpLimited => {
            return Err(ApiError::too_many_requests(
                "Too many requests, please try again later",
            ));
        }
        ThrottleDecision::EmailLimited => {
            return Err(ApiError::too_many_requests(
                "Too many failed attempts, please try again in 15 minutes",
            ));
        }
        ThrottleDecision::Allowed => {}
    }

    let email = body.email.clone();
    let user = match state.user_service.signin(body).await {
        Ok(user) => user,
        Err(e) => {
            state.rate_limiter.record_failed_attempt(&email).await;
            return Err(e.into());
        }
    };

    state.rate_limiter.clear_email_attempts(&email).await;
    signed_in_response(&state, user)
}

/// POST /api/auth/google - Sign in with a provider-asserted profile
///
/// Signs in an existing account by email or provisions a new one, then
/// sets the cookie like a normal sign-in.
async fn google(
    State(state): State<AppState>,
    Json(body): Json<GoogleInput>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.user_service.google(body).await?;
    signed_in_response(&state, user)
}

/// GET /api/auth/signout - Clear the access token cookie
///
/// Tokens are stateless, so signing out is purely a client-side cookie
/// removal.
async fn signout() -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_static(
            "access_token=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        ),
    );

    (
        headers,
        Json(serde_json::json!({ "message": "Signed out" })),
    )
}

/// Issue a token for the user and attach it as the cookie
fn signed_in_response(
    state: &AppState,
    user: User,
) -> Result<(HeaderMap, Json<User>), ApiError> {
    let token = state
        .token_service
        .issue(user.id)
        .map_err(|e| ApiError::internal_error(format!("Failed to issue token: {}", e)))?;

    let max_age = state.token_service.expiration_days() * 24 * 60 * 60;
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        TOKEN_COOKIE, token, max_age
    );

    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie)
            .map_err(|e| ApiError::internal_error(format!("Invalid cookie value: {}", e)))?,
    );

    Ok((headers, Json(user)))
}

/// Extract the client IP from proxy headers.
///
/// Checks X-Forwarded-For first (first hop), then X-Real-IP.
fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            if let Some(ip) = forwarded_str.split(',').next() {
                return Some(ip.trim().to_string());
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return Some(ip_str.to_string());
        }
    }

    None
}
