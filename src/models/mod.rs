//! Data models
//!
//! This module contains all data structures used throughout Homestead.
//! Models represent:
//! - Database entities (User, Listing)
//! - API request/response types
//! - Internal data transfer objects

mod listing;
mod user;

pub use listing::{
    CreateListingInput, Listing, ListingFilter, ListingKind, ListingSort, SortOrder,
    UpdateListingInput, MAX_IMAGES,
};
pub use user::{UpdateUserInput, User};
