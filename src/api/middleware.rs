//! API middleware
//!
//! Contains:
//! - Shared application state
//! - The normalized API error type
//! - Authentication middleware (access token validation)

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::models::User;
use crate::services::{
    ListingService, ListingServiceError, SigninRateLimiter, TokenService, UserService,
    UserServiceError,
};

/// Cookie name carrying the access token
pub const TOKEN_COOKIE: &str = "access_token";

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub listing_service: Arc<ListingService>,
    pub token_service: TokenService,
    pub rate_limiter: Arc<SigninRateLimiter>,
    pub upload_config: Arc<crate::config::UploadConfig>,
}

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> axum::extract::FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Error response for API errors.
///
/// Renders as `{"success": false, "statusCode": N, "message": "..."}`
/// for every failure the API can produce.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "success": false,
            "statusCode": self.status.as_u16(),
            "message": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::AuthenticationError(msg) => ApiError::unauthorized(msg),
            UserServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            UserServiceError::UserExists(msg) => ApiError::conflict(msg),
            UserServiceError::Forbidden => {
                ApiError::forbidden("You can only manage your own account")
            }
            UserServiceError::NotFound => ApiError::not_found("User not found"),
            UserServiceError::InternalError(e) => {
                tracing::error!(error = %e, "User service error");
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

impl From<ListingServiceError> for ApiError {
    fn from(err: ListingServiceError) -> Self {
        match err {
            ListingServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            ListingServiceError::Forbidden => {
                ApiError::forbidden("You can only manage your own listings")
            }
            ListingServiceError::NotFound => ApiError::not_found("Listing not found"),
            ListingServiceError::InternalError(e) => {
                tracing::error!(error = %e, "Listing service error");
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

/// Extract the access token from a request.
///
/// Prefers the Authorization header, then falls back to the cookie the
/// signin handler sets.
fn extract_access_token(request: &Request) -> Option<String> {
    if let Some(auth_header) = request.headers().get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie_header) = request.headers().get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(value) = cookie.strip_prefix(TOKEN_COOKIE) {
                    if let Some(token) = value.strip_prefix('=') {
                        return Some(token.to_string());
                    }
                }
            }
        }
    }

    None
}

/// Authentication middleware
///
/// Verifies the access token and loads the user it names. A token for
/// a deleted account is rejected even before expiry.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_access_token(&request)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let user_id = state
        .token_service
        .verify(&token)
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired token"))?;

    let user = state
        .user_service
        .get(user_id)
        .await
        .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};

    fn create_request_with_auth(token: &str) -> Request<Body> {
        Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    }

    fn create_request_with_cookie(token: &str) -> Request<Body> {
        Request::builder()
            .uri("/test")
            .header(header::COOKIE, format!("access_token={}", token))
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_extract_access_token_from_bearer() {
        let request = create_request_with_auth("test-token-123");
        assert_eq!(
            extract_access_token(&request),
            Some("test-token-123".to_string())
        );
    }

    #[test]
    fn test_extract_access_token_from_cookie() {
        let request = create_request_with_cookie("test-token-456");
        assert_eq!(
            extract_access_token(&request),
            Some("test-token-456".to_string())
        );
    }

    #[test]
    fn test_extract_access_token_bearer_priority() {
        let request = Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, "Bearer bearer-token")
            .header(header::COOKIE, "access_token=cookie-token")
            .body(Body::empty())
            .unwrap();
        assert_eq!(
            extract_access_token(&request),
            Some("bearer-token".to_string())
        );
    }

    #[test]
    fn test_extract_access_token_none() {
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        assert!(extract_access_token(&request).is_none());
    }

    #[test]
    fn test_extract_access_token_ignores_other_cookies() {
        let request = Request::builder()
            .uri("/test")
            .header(header::COOKIE, "theme=dark; locale=en")
            .body(Body::empty())
            .unwrap();
        assert!(extract_access_token(&request).is_none());
    }

    #[test]
    fn test_api_error_wire_shape() {
        let error = ApiError::not_found("Listing not found");
        assert_eq!(error.status, StatusCode::NOT_FOUND);

        let body = json!({
            "success": false,
            "statusCode": error.status.as_u16(),
            "message": error.message,
        });
        assert_eq!(body["success"], false);
        assert_eq!(body["statusCode"], 404);
    }

    #[test]
    fn test_service_error_mapping() {
        let err: ApiError = UserServiceError::Forbidden.into();
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        let err: ApiError = UserServiceError::UserExists("taken".to_string()).into();
        assert_eq!(err.status, StatusCode::CONFLICT);

        let err: ApiError = ListingServiceError::ValidationError("bad".to_string()).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
