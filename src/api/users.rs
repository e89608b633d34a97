//! User API endpoints
//!
//! - POST /api/user/update/{id} - Update own profile
//! - DELETE /api/user/delete/{id} - Delete own account
//! - GET /api/user/listings/{id} - Own listings, newest first
//! - GET /api/user/{id} - Public contact info for any user

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{Listing, UpdateUserInput, User};

/// Public view of a user, for the "contact landlord" flow
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            avatar: user.avatar,
        }
    }
}

/// Build protected user routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/update/{id}", post(update_user))
        .route("/delete/{id}", delete(delete_user))
        .route("/listings/{id}", get(user_listings))
}

/// Build public user routes (no auth required)
pub fn public_router() -> Router<AppState> {
    Router::new().route("/{id}", get(get_user))
}

/// POST /api/user/update/{id} - Update own profile
async fn update_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateUserInput>,
) -> Result<Json<User>, ApiError> {
    let updated = state.user_service.update_profile(user.0.id, id, body).await?;
    Ok(Json(updated))
}

/// DELETE /api/user/delete/{id} - Delete own account
///
/// The account's listings go with it. The access token cookie is
/// cleared so the client does not keep presenting a token for a
/// deleted user.
async fn delete_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.user_service.delete_account(user.0.id, id).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_static(
            "access_token=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        ),
    );

    Ok((
        headers,
        Json(serde_json::json!({ "message": "Account deleted" })),
    ))
}

/// GET /api/user/listings/{id} - Listings owned by the user
///
/// Only the owner may see their own listing roster.
async fn user_listings(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Listing>>, ApiError> {
    if !user.0.owns(id) {
        return Err(ApiError::forbidden("You can only view your own listings"));
    }

    let listings = state.listing_service.list_by_owner(id).await?;
    Ok(Json(listings))
}

/// GET /api/user/{id} - Public contact info for any user
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PublicUser>, ApiError> {
    let user = state.user_service.get(id).await?;
    Ok(Json(user.into()))
}
