//! Listing model
//!
//! This module provides:
//! - `Listing` entity representing a property record
//! - `ListingKind` enum for the sale/rent type tag
//! - Input types for creating and updating listings
//! - `ListingFilter` for search queries
//!
//! Wire field names follow the established client contract (camelCase,
//! `type` for the kind tag, `userRef` for the owner reference).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of image references per listing.
pub const MAX_IMAGES: usize = 6;

/// Listing entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    /// Unique identifier
    pub id: i64,
    /// Listing title
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Street address
    pub address: String,
    /// Asking price
    pub regular_price: i64,
    /// Discounted price, only meaningful when `offer` is set
    pub discount_price: i64,
    /// Bathroom count
    pub bathrooms: i64,
    /// Bedroom count
    pub bedrooms: i64,
    /// Comes furnished
    pub furnished: bool,
    /// Has parking
    pub parking: bool,
    /// Sale or rent
    #[serde(rename = "type")]
    pub kind: ListingKind,
    /// Listed with a discount offer
    pub offer: bool,
    /// Ordered image URL references; first entry is the cover
    pub image_urls: Vec<String>,
    /// Owning user ID
    #[serde(rename = "userRef")]
    pub owner_id: i64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Listing type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    /// For sale
    Sale,
    /// For rent
    Rent,
}

impl ListingKind {
    /// Convert to the database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingKind::Sale => "sale",
            ListingKind::Rent => "rent",
        }
    }

    /// Parse from the database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sale" => Some(ListingKind::Sale),
            "rent" => Some(ListingKind::Rent),
            _ => None,
        }
    }
}

impl std::fmt::Display for ListingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input for creating a new listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingInput {
    /// Listing title
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Street address
    pub address: String,
    /// Asking price
    pub regular_price: i64,
    /// Discounted price (defaults to 0)
    #[serde(default)]
    pub discount_price: i64,
    /// Bathroom count
    pub bathrooms: i64,
    /// Bedroom count
    pub bedrooms: i64,
    /// Comes furnished
    #[serde(default)]
    pub furnished: bool,
    /// Has parking
    #[serde(default)]
    pub parking: bool,
    /// Sale or rent
    #[serde(rename = "type")]
    pub kind: ListingKind,
    /// Listed with a discount offer
    #[serde(default)]
    pub offer: bool,
    /// Image URL references
    #[serde(default)]
    pub image_urls: Vec<String>,
}

impl CreateListingInput {
    /// Materialize a `Listing` owned by the given user.
    pub fn into_listing(self, owner_id: i64) -> Listing {
        let now = Utc::now();
        Listing {
            id: 0, // Will be set by the database
            name: self.name,
            description: self.description,
            address: self.address,
            regular_price: self.regular_price,
            discount_price: self.discount_price,
            bathrooms: self.bathrooms,
            bedrooms: self.bedrooms,
            furnished: self.furnished,
            parking: self.parking,
            kind: self.kind,
            offer: self.offer,
            image_urls: self.image_urls,
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for updating a listing; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateListingInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub regular_price: Option<i64>,
    pub discount_price: Option<i64>,
    pub bathrooms: Option<i64>,
    pub bedrooms: Option<i64>,
    pub furnished: Option<bool>,
    pub parking: Option<bool>,
    #[serde(rename = "type")]
    pub kind: Option<ListingKind>,
    pub offer: Option<bool>,
    pub image_urls: Option<Vec<String>>,
}

impl UpdateListingInput {
    /// Apply this update on top of an existing listing.
    pub fn apply(self, mut listing: Listing) -> Listing {
        if let Some(name) = self.name {
            listing.name = name;
        }
        if let Some(description) = self.description {
            listing.description = description;
        }
        if let Some(address) = self.address {
            listing.address = address;
        }
        if let Some(regular_price) = self.regular_price {
            listing.regular_price = regular_price;
        }
        if let Some(discount_price) = self.discount_price {
            listing.discount_price = discount_price;
        }
        if let Some(bathrooms) = self.bathrooms {
            listing.bathrooms = bathrooms;
        }
        if let Some(bedrooms) = self.bedrooms {
            listing.bedrooms = bedrooms;
        }
        if let Some(furnished) = self.furnished {
            listing.furnished = furnished;
        }
        if let Some(parking) = self.parking {
            listing.parking = parking;
        }
        if let Some(kind) = self.kind {
            listing.kind = kind;
        }
        if let Some(offer) = self.offer {
            listing.offer = offer;
        }
        if let Some(image_urls) = self.image_urls {
            listing.image_urls = image_urls;
        }
        listing.updated_at = Utc::now();
        listing
    }
}

/// Sort field for listing searches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingSort {
    /// Sort by creation time (default)
    #[default]
    CreatedAt,
    /// Sort by asking price
    RegularPrice,
}

impl ListingSort {
    /// Column name used in ORDER BY clauses
    pub fn column(&self) -> &'static str {
        match self {
            ListingSort::CreatedAt => "created_at",
            ListingSort::RegularPrice => "regular_price",
        }
    }
}

/// Sort direction for listing searches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// SQL keyword for this direction
    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Filter for browsing listings.
///
/// `None` on a flag means "no constraint", matching the search page
/// semantics where an unchecked box must not exclude anything.
#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    /// Case-insensitive substring match on the listing name
    pub search_term: Option<String>,
    /// Restrict to sale or rent; `None` means both
    pub kind: Option<ListingKind>,
    /// Require the offer flag
    pub offer: Option<bool>,
    /// Require parking
    pub parking: Option<bool>,
    /// Require furnished
    pub furnished: Option<bool>,
    /// Sort field
    pub sort: ListingSort,
    /// Sort direction
    pub order: SortOrder,
    /// Maximum number of rows
    pub limit: i64,
    /// Row offset
    pub start_index: i64,
}

impl ListingFilter {
    /// Default page size for the browse endpoint.
    pub const DEFAULT_LIMIT: i64 = 9;
}
