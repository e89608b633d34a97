//! Listing API endpoints
//!
//! - POST /api/listing/create - Create a listing (auth)
//! - POST /api/listing/update/{id} - Update own listing (auth)
//! - DELETE /api/listing/delete/{id} - Delete own listing (auth)
//! - GET /api/listing/get/{id} - Fetch a listing
//! - GET /api/listing/get - Filtered search

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{
    CreateListingInput, Listing, ListingFilter, ListingKind, ListingSort, SortOrder,
    UpdateListingInput,
};

/// Raw query parameters for the browse endpoint.
///
/// Everything arrives as strings; flags carry "true"/"false" text from
/// the search form.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(rename = "searchTerm")]
    pub search_term: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub offer: Option<String>,
    pub parking: Option<String>,
    pub furnished: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub limit: Option<i64>,
    #[serde(rename = "startIndex")]
    pub start_index: Option<i64>,
}

impl SearchQuery {
    /// Resolve the raw query into a typed filter.
    ///
    /// An absent or `false` flag means no constraint, and `type=all`
    /// (or anything unrecognized) matches both kinds. Unknown sort
    /// fields fall back to creation time.
    pub fn into_filter(self) -> ListingFilter {
        ListingFilter {
            search_term: self.search_term.filter(|s| !s.is_empty()),
            kind: self.kind.as_deref().and_then(ListingKind::from_str),
            offer: parse_flag(self.offer.as_deref()),
            parking: parse_flag(self.parking.as_deref()),
            furnished: parse_flag(self.furnished.as_deref()),
            sort: match self.sort.as_deref() {
                Some("regularPrice") => ListingSort::RegularPrice,
                _ => ListingSort::CreatedAt,
            },
            order: match self.order.as_deref() {
                Some("asc") => SortOrder::Asc,
                _ => SortOrder::Desc,
            },
            limit: self.limit.unwrap_or(ListingFilter::DEFAULT_LIMIT).max(0),
            start_index: self.start_index.unwrap_or(0).max(0),
        }
    }
}

/// Only an explicit `true` becomes a constraint
fn parse_flag(value: Option<&str>) -> Option<bool> {
    match value {
        Some("true") => Some(true),
        _ => None,
    }
}

/// Build protected listing routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_listing))
        .route("/update/{id}", post(update_listing))
        .route("/delete/{id}", delete(delete_listing))
}

/// Build public listing routes (no auth required)
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/get/{id}", get(get_listing))
        .route("/get", get(search_listings))
}

/// POST /api/listing/create - Create a listing
///
/// Ownership comes from the authenticated user, never the body.
async fn create_listing(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<CreateListingInput>,
) -> Result<impl IntoResponse, ApiError> {
    let listing = state.listing_service.create(user.0.id, body).await?;
    Ok((StatusCode::CREATED, Json(listing)))
}

/// POST /api/listing/update/{id} - Update own listing
async fn update_listing(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateListingInput>,
) -> Result<Json<Listing>, ApiError> {
    let listing = state.listing_service.update(user.0.id, id, body).await?;
    Ok(Json(listing))
}

/// DELETE /api/listing/delete/{id} - Delete own listing
async fn delete_listing(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.listing_service.delete(user.0.id, id).await?;
    Ok(Json(serde_json::json!({ "message": "Listing deleted" })))
}

/// GET /api/listing/get/{id} - Fetch a listing
async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Listing>, ApiError> {
    let listing = state.listing_service.get(id).await?;
    Ok(Json(listing))
}

/// GET /api/listing/get - Filtered search
async fn search_listings(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Listing>>, ApiError> {
    let filter = query.into_filter();
    let listings = state.listing_service.search(&filter).await?;
    Ok(Json(listings))
}
