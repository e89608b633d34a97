//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod listing;
pub mod user;

pub use listing::{ListingRepository, SqlxListingRepository};
pub use user::{SqlxUserRepository, UserRepository};
