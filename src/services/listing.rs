//! Listing service
//!
//! Business logic for property listings:
//! - Create/update/delete with ownership checks
//! - Field validation (prices, rooms, image list bounds)
//! - Public fetch and filtered search

use crate::db::repositories::ListingRepository;
use crate::models::{
    CreateListingInput, Listing, ListingFilter, UpdateListingInput, MAX_IMAGES,
};
use anyhow::Context;
use std::sync::Arc;

/// Error types for listing service operations
#[derive(Debug, thiserror::Error)]
pub enum ListingServiceError {
    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Caller does not own the listing
    #[error("You can only manage your own listings")]
    Forbidden,

    /// Listing not found
    #[error("Listing not found")]
    NotFound,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Listing service
pub struct ListingService {
    listing_repo: Arc<dyn ListingRepository>,
}

impl ListingService {
    /// Create a new listing service
    pub fn new(listing_repo: Arc<dyn ListingRepository>) -> Self {
        Self { listing_repo }
    }

    /// Create a listing owned by the authenticated user
    ///
    /// # Errors
    ///
    /// - `ValidationError` if a field is out of bounds
    /// - `InternalError` for database errors
    pub async fn create(
        &self,
        owner_id: i64,
        input: CreateListingInput,
    ) -> Result<Listing, ListingServiceError> {
        let listing = input.into_listing(owner_id);
        validate_listing(&listing)?;

        let created = self
            .listing_repo
            .create(&listing)
            .await
            .context("Failed to create listing")?;

        tracing::info!(listing_id = created.id, owner_id, "Listing created");
        Ok(created)
    }

    /// Update a listing. Only the owner may do this.
    ///
    /// The merged record is validated again so a partial update cannot
    /// break the price or image invariants.
    pub async fn update(
        &self,
        caller_id: i64,
        listing_id: i64,
        input: UpdateListingInput,
    ) -> Result<Listing, ListingServiceError> {
        let listing = self.get(listing_id).await?;
        if listing.owner_id != caller_id {
            return Err(ListingServiceError::Forbidden);
        }

        let merged = input.apply(listing);
        validate_listing(&merged)?;

        let updated = self
            .listing_repo
            .update(&merged)
            .await
            .context("Failed to update listing")?;

        tracing::info!(listing_id = updated.id, "Listing updated");
        Ok(updated)
    }

    /// Delete a listing. Only the owner may do this.
    pub async fn delete(&self, caller_id: i64, listing_id: i64) -> Result<(), ListingServiceError> {
        let listing = self.get(listing_id).await?;
        if listing.owner_id != caller_id {
            return Err(ListingServiceError::Forbidden);
        }

        self.listing_repo
            .delete(listing_id)
            .await
            .context("Failed to delete listing")?;

        tracing::info!(listing_id, "Listing deleted");
        Ok(())
    }

    /// Fetch a listing by ID
    pub async fn get(&self, id: i64) -> Result<Listing, ListingServiceError> {
        self.listing_repo
            .get_by_id(id)
            .await
            .context("Failed to get listing")?
            .ok_or(ListingServiceError::NotFound)
    }

    /// All listings owned by a user, newest first
    pub async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Listing>, ListingServiceError> {
        Ok(self
            .listing_repo
            .list_by_owner(owner_id)
            .await
            .context("Failed to list listings")?)
    }

    /// Search listings with the given filter
    pub async fn search(&self, filter: &ListingFilter) -> Result<Vec<Listing>, ListingServiceError> {
        Ok(self
            .listing_repo
            .search(filter)
            .await
            .context("Failed to search listings")?)
    }
}

/// Validate listing fields against the domain bounds
fn validate_listing(listing: &Listing) -> Result<(), ListingServiceError> {
    if listing.name.trim().is_empty() {
        return Err(ListingServiceError::ValidationError(
            "Name cannot be empty".to_string(),
        ));
    }
    if listing.description.trim().is_empty() {
        return Err(ListingServiceError::ValidationError(
            "Description cannot be empty".to_string(),
        ));
    }
    if listing.address.trim().is_empty() {
        return Err(ListingServiceError::ValidationError(
            "Address cannot be empty".to_string(),
        ));
    }
    if listing.regular_price < 1 {
        return Err(ListingServiceError::ValidationError(
            "Regular price must be at least 1".to_string(),
        ));
    }
    if listing.discount_price < 0 {
        return Err(ListingServiceError::ValidationError(
            "Discount price cannot be negative".to_string(),
        ));
    }
    if listing.discount_price > listing.regular_price {
        return Err(ListingServiceError::ValidationError(
            "Discount price must be lower than regular price".to_string(),
        ));
    }
    if listing.bedrooms < 1 || listing.bathrooms < 1 {
        return Err(ListingServiceError::ValidationError(
            "Listings must have at least one bedroom and bathroom".to_string(),
        ));
    }
    if listing.image_urls.is_empty() {
        return Err(ListingServiceError::ValidationError(
            "At least one image is required".to_string(),
        ));
    }
    if listing.image_urls.len() > MAX_IMAGES {
        return Err(ListingServiceError::ValidationError(format!(
            "At most {} images are allowed",
            MAX_IMAGES
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxListingRepository, SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{ListingKind, User};
    use crate::services::password::hash_password;
    use proptest::prelude::*;

    async fn setup() -> (ListingService, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user_repo = SqlxUserRepository::new(pool.clone());
        let owner = user_repo
            .create(&User::new(
                "owner".to_string(),
                "owner@example.com".to_string(),
                hash_password("pw").expect("hash"),
            ))
            .await
            .expect("Failed to create owner");

        (
            ListingService::new(SqlxListingRepository::boxed(pool)),
            owner.id,
        )
    }

    fn valid_input(name: &str) -> CreateListingInput {
        CreateListingInput {
            name: name.to_string(),
            description: "Roomy and bright".to_string(),
            address: "1 Test Lane".to_string(),
            regular_price: 1500,
            discount_price: 0,
            bathrooms: 1,
            bedrooms: 2,
            furnished: true,
            parking: false,
            kind: ListingKind::Rent,
            offer: false,
            image_urls: vec!["https://img.example/1.jpg".to_string()],
        }
    }

    #[tokio::test]
    async fn test_create_listing() {
        let (service, owner_id) = setup().await;
        let listing = service
            .create(owner_id, valid_input("Test flat"))
            .await
            .expect("Create should succeed");

        assert_eq!(listing.owner_id, owner_id);
        assert_eq!(listing.name, "Test flat");
    }

    #[tokio::test]
    async fn test_create_rejects_discount_above_regular() {
        let (service, owner_id) = setup().await;
        let mut input = valid_input("Bad deal");
        input.offer = true;
        input.discount_price = 2000;

        let result = service.create(owner_id, input).await;
        assert!(matches!(
            result,
            Err(ListingServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_images() {
        let (service, owner_id) = setup().await;
        let mut input = valid_input("No photos");
        input.image_urls.clear();

        let result = service.create(owner_id, input).await;
        assert!(matches!(
            result,
            Err(ListingServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_too_many_images() {
        let (service, owner_id) = setup().await;
        let mut input = valid_input("Photo dump");
        input.image_urls = (0..=MAX_IMAGES)
            .map(|i| format!("https://img.example/{}.jpg", i))
            .collect();

        let result = service.create(owner_id, input).await;
        assert!(matches!(
            result,
            Err(ListingServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_update_owner_only() {
        let (service, owner_id) = setup().await;
        let listing = service
            .create(owner_id, valid_input("Mine"))
            .await
            .expect("Create should succeed");

        let result = service
            .update(
                owner_id + 1,
                listing.id,
                UpdateListingInput {
                    name: Some("Stolen".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(ListingServiceError::Forbidden)));
    }

    #[tokio::test]
    async fn test_update_revalidates_merged_record() {
        let (service, owner_id) = setup().await;
        let listing = service
            .create(owner_id, valid_input("Fine"))
            .await
            .expect("Create should succeed");

        // Partial update that would push discount above regular
        let result = service
            .update(
                owner_id,
                listing.id,
                UpdateListingInput {
                    discount_price: Some(5000),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(
            result,
            Err(ListingServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let (service, owner_id) = setup().await;
        let listing = service
            .create(owner_id, valid_input("Before"))
            .await
            .expect("Create should succeed");

        let updated = service
            .update(
                owner_id,
                listing.id,
                UpdateListingInput {
                    name: Some("After".to_string()),
                    parking: Some(true),
                    ..Default::default()
                },
            )
            .await
            .expect("Update should succeed");

        assert_eq!(updated.name, "After");
        assert!(updated.parking);
        // Untouched fields survive
        assert_eq!(updated.description, "Roomy and bright");
    }

    #[tokio::test]
    async fn test_delete_owner_only() {
        let (service, owner_id) = setup().await;
        let listing = service
            .create(owner_id, valid_input("Keep out"))
            .await
            .expect("Create should succeed");

        let result = service.delete(owner_id + 1, listing.id).await;
        assert!(matches!(result, Err(ListingServiceError::Forbidden)));

        service
            .delete(owner_id, listing.id)
            .await
            .expect("Owner delete should succeed");
        assert!(matches!(
            service.get(listing.id).await,
            Err(ListingServiceError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let (service, _owner_id) = setup().await;
        assert!(matches!(
            service.get(12345).await,
            Err(ListingServiceError::NotFound)
        ));
    }

    proptest! {
        #[test]
        fn prop_discount_never_exceeds_regular(regular in 1i64..1_000_000, discount in 0i64..2_000_000) {
            let mut listing = valid_input("Prop").into_listing(1);
            listing.regular_price = regular;
            listing.discount_price = discount;

            let result = validate_listing(&listing);
            if discount > regular {
                prop_assert!(result.is_err());
            } else {
                prop_assert!(result.is_ok());
            }
        }

        #[test]
        fn prop_image_count_bounds(count in 0usize..12) {
            let mut listing = valid_input("Prop").into_listing(1);
            listing.image_urls = (0..count)
                .map(|i| format!("https://img.example/{}.jpg", i))
                .collect();

            let result = validate_listing(&listing);
            if count == 0 || count > MAX_IMAGES {
                prop_assert!(result.is_err());
            } else {
                prop_assert!(result.is_ok());
            }
        }
    }
}
