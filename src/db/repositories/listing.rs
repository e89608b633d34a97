//! Listing repository
//!
//! Database operations for property listings.
//!
//! This module provides:
//! - `ListingRepository` trait defining the interface for listing data access
//! - `SqlxListingRepository` implementing the trait for SQLite and MySQL
//!
//! Search filters are compiled into a WHERE clause with positional
//! placeholders; both backends use `?` so the clause builder is shared.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Listing, ListingFilter, ListingKind};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const LISTING_COLUMNS: &str = "id, name, description, address, regular_price, discount_price, \
     bathrooms, bedrooms, furnished, parking, kind, offer, image_urls, owner_id, \
     created_at, updated_at";

/// Listing repository trait
#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// Create a new listing
    async fn create(&self, listing: &Listing) -> Result<Listing>;

    /// Get listing by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Listing>>;

    /// Update a listing
    async fn update(&self, listing: &Listing) -> Result<Listing>;

    /// Delete a listing
    async fn delete(&self, id: i64) -> Result<()>;

    /// All listings owned by a user, newest first
    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Listing>>;

    /// Search listings with the given filter
    async fn search(&self, filter: &ListingFilter) -> Result<Vec<Listing>>;
}

/// SQLx-based listing repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxListingRepository {
    pool: DynDatabasePool,
}

impl SqlxListingRepository {
    /// Create a new SQLx listing repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a shared repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ListingRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ListingRepository for SqlxListingRepository {
    async fn create(&self, listing: &Listing) -> Result<Listing> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_listing_sqlite(self.pool.as_sqlite().unwrap(), listing).await
            }
            DatabaseDriver::Mysql => {
                create_listing_mysql(self.pool.as_mysql().unwrap(), listing).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Listing>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_listing_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => {
                get_listing_by_id_mysql(self.pool.as_mysql().unwrap(), id).await
            }
        }
    }

    async fn update(&self, listing: &Listing) -> Result<Listing> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_listing_sqlite(self.pool.as_sqlite().unwrap(), listing).await
            }
            DatabaseDriver::Mysql => {
                update_listing_mysql(self.pool.as_mysql().unwrap(), listing).await
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_listing_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => delete_listing_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Listing>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_by_owner_sqlite(self.pool.as_sqlite().unwrap(), owner_id).await
            }
            DatabaseDriver::Mysql => {
                list_by_owner_mysql(self.pool.as_mysql().unwrap(), owner_id).await
            }
        }
    }

    async fn search(&self, filter: &ListingFilter) -> Result<Vec<Listing>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                search_listings_sqlite(self.pool.as_sqlite().unwrap(), filter).await
            }
            DatabaseDriver::Mysql => {
                search_listings_mysql(self.pool.as_mysql().unwrap(), filter).await
            }
        }
    }
}

// ============================================================================
// Search clause builder (shared; both drivers use `?` placeholders)
// ============================================================================

/// Bind value for a dynamically built search query
enum SearchBind {
    Text(String),
    Flag(bool),
}

/// Build the SQL text and bind list for a listing search.
///
/// Absent flags add no constraint, so an unchecked search box never
/// excludes rows. The sort column and direction come from closed enums
/// and are interpolated directly.
fn build_search_sql(filter: &ListingFilter) -> (String, Vec<SearchBind>) {
    let mut sql = format!("SELECT {} FROM listings WHERE 1=1", LISTING_COLUMNS);
    let mut binds = Vec::new();

    if let Some(term) = filter.search_term.as_deref() {
        if !term.is_empty() {
            sql.push_str(" AND LOWER(name) LIKE ?");
            binds.push(SearchBind::Text(format!("%{}%", term.to_lowercase())));
        }
    }

    if let Some(kind) = filter.kind {
        sql.push_str(" AND kind = ?");
        binds.push(SearchBind::Text(kind.as_str().to_string()));
    }

    if let Some(offer) = filter.offer {
        sql.push_str(" AND offer = ?");
        binds.push(SearchBind::Flag(offer));
    }

    if let Some(parking) = filter.parking {
        sql.push_str(" AND parking = ?");
        binds.push(SearchBind::Flag(parking));
    }

    if let Some(furnished) = filter.furnished {
        sql.push_str(" AND furnished = ?");
        binds.push(SearchBind::Flag(furnished));
    }

    sql.push_str(&format!(
        " ORDER BY {} {} LIMIT ? OFFSET ?",
        filter.sort.column(),
        filter.order.keyword()
    ));

    (sql, binds)
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_listing_sqlite(pool: &SqlitePool, listing: &Listing) -> Result<Listing> {
    let now = Utc::now();
    let image_urls =
        serde_json::to_string(&listing.image_urls).context("Failed to encode image URLs")?;

    let result = sqlx::query(
        r#"
        INSERT INTO listings
            (name, description, address, regular_price, discount_price, bathrooms, bedrooms,
             furnished, parking, kind, offer, image_urls, owner_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&listing.name)
    .bind(&listing.description)
    .bind(&listing.address)
    .bind(listing.regular_price)
    .bind(listing.discount_price)
    .bind(listing.bathrooms)
    .bind(listing.bedrooms)
    .bind(listing.furnished)
    .bind(listing.parking)
    .bind(listing.kind.as_str())
    .bind(listing.offer)
    .bind(&image_urls)
    .bind(listing.owner_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create listing")?;

    let id = result.last_insert_rowid();

    Ok(Listing {
        id,
        created_at: now,
        updated_at: now,
        ..listing.clone()
    })
}

async fn get_listing_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Listing>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM listings WHERE id = ?",
        LISTING_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get listing by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_listing_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn update_listing_sqlite(pool: &SqlitePool, listing: &Listing) -> Result<Listing> {
    let now = Utc::now();
    let image_urls =
        serde_json::to_string(&listing.image_urls).context("Failed to encode image URLs")?;

    sqlx::query(
        r#"
        UPDATE listings
        SET name = ?, description = ?, address = ?, regular_price = ?, discount_price = ?,
            bathrooms = ?, bedrooms = ?, furnished = ?, parking = ?, kind = ?, offer = ?,
            image_urls = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&listing.name)
    .bind(&listing.description)
    .bind(&listing.address)
    .bind(listing.regular_price)
    .bind(listing.discount_price)
    .bind(listing.bathrooms)
    .bind(listing.bedrooms)
    .bind(listing.furnished)
    .bind(listing.parking)
    .bind(listing.kind.as_str())
    .bind(listing.offer)
    .bind(&image_urls)
    .bind(now)
    .bind(listing.id)
    .execute(pool)
    .await
    .context("Failed to update listing")?;

    get_listing_by_id_sqlite(pool, listing.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Listing not found after update"))
}

async fn delete_listing_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM listings WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete listing")?;

    Ok(())
}

async fn list_by_owner_sqlite(pool: &SqlitePool, owner_id: i64) -> Result<Vec<Listing>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM listings WHERE owner_id = ? ORDER BY created_at DESC",
        LISTING_COLUMNS
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await
    .context("Failed to list listings by owner")?;

    let mut listings = Vec::new();
    for row in rows {
        listings.push(row_to_listing_sqlite(&row)?);
    }

    Ok(listings)
}

async fn search_listings_sqlite(pool: &SqlitePool, filter: &ListingFilter) -> Result<Vec<Listing>> {
    let (sql, binds) = build_search_sql(filter);

    let mut query = sqlx::query(&sql);
    for bind in &binds {
        query = match bind {
            SearchBind::Text(s) => query.bind(s),
            SearchBind::Flag(b) => query.bind(b),
        };
    }
    query = query.bind(filter.limit).bind(filter.start_index);

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to search listings")?;

    let mut listings = Vec::new();
    for row in rows {
        listings.push(row_to_listing_sqlite(&row)?);
    }

    Ok(listings)
}

fn row_to_listing_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Listing> {
    let kind_str: String = row.get("kind");
    let kind = ListingKind::from_str(&kind_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid listing kind in database: {}", kind_str))?;

    let image_urls_raw: String = row.get("image_urls");
    let image_urls: Vec<String> =
        serde_json::from_str(&image_urls_raw).context("Invalid image URL list in database")?;

    Ok(Listing {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        address: row.get("address"),
        regular_price: row.get("regular_price"),
        discount_price: row.get("discount_price"),
        bathrooms: row.get("bathrooms"),
        bedrooms: row.get("bedrooms"),
        furnished: row.get("furnished"),
        parking: row.get("parking"),
        kind,
        offer: row.get("offer"),
        image_urls,
        owner_id: row.get("owner_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_listing_mysql(pool: &MySqlPool, listing: &Listing) -> Result<Listing> {
    let now = Utc::now();
    let image_urls =
        serde_json::to_string(&listing.image_urls).context("Failed to encode image URLs")?;

    let result = sqlx::query(
        r#"
        INSERT INTO listings
            (name, description, address, regular_price, discount_price, bathrooms, bedrooms,
             furnished, parking, kind, offer, image_urls, owner_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&listing.name)
    .bind(&listing.description)
    .bind(&listing.address)
    .bind(listing.regular_price)
    .bind(listing.discount_price)
    .bind(listing.bathrooms)
    .bind(listing.bedrooms)
    .bind(listing.furnished)
    .bind(listing.parking)
    .bind(listing.kind.as_str())
    .bind(listing.offer)
    .bind(&image_urls)
    .bind(listing.owner_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create listing")?;

    let id = result.last_insert_id() as i64;

    Ok(Listing {
        id,
        created_at: now,
        updated_at: now,
        ..listing.clone()
    })
}

async fn get_listing_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Listing>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM listings WHERE id = ?",
        LISTING_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get listing by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_listing_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn update_listing_mysql(pool: &MySqlPool, listing: &Listing) -> Result<Listing> {
    let now = Utc::now();
    let image_urls =
        serde_json::to_string(&listing.image_urls).context("Failed to encode image URLs")?;

    sqlx::query(
        r#"
        UPDATE listings
        SET name = ?, description = ?, address = ?, regular_price = ?, discount_price = ?,
            bathrooms = ?, bedrooms = ?, furnished = ?, parking = ?, kind = ?, offer = ?,
            image_urls = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&listing.name)
    .bind(&listing.description)
    .bind(&listing.address)
    .bind(listing.regular_price)
    .bind(listing.discount_price)
    .bind(listing.bathrooms)
    .bind(listing.bedrooms)
    .bind(listing.furnished)
    .bind(listing.parking)
    .bind(listing.kind.as_str())
    .bind(listing.offer)
    .bind(&image_urls)
    .bind(now)
    .bind(listing.id)
    .execute(pool)
    .await
    .context("Failed to update listing")?;

    get_listing_by_id_mysql(pool, listing.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Listing not found after update"))
}

async fn delete_listing_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM listings WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete listing")?;

    Ok(())
}

async fn list_by_owner_mysql(pool: &MySqlPool, owner_id: i64) -> Result<Vec<Listing>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM listings WHERE owner_id = ? ORDER BY created_at DESC",
        LISTING_COLUMNS
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await
    .context("Failed to list listings by owner")?;

    let mut listings = Vec::new();
    for row in rows {
        listings.push(row_to_listing_mysql(&row)?);
    }

    Ok(listings)
}

async fn search_listings_mysql(pool: &MySqlPool, filter: &ListingFilter) -> Result<Vec<Listing>> {
    let (sql, binds) = build_search_sql(filter);

    let mut query = sqlx::query(&sql);
    for bind in &binds {
        query = match bind {
            SearchBind::Text(s) => query.bind(s),
            SearchBind::Flag(b) => query.bind(b),
        };
    }
    query = query.bind(filter.limit).bind(filter.start_index);

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to search listings")?;

    let mut listings = Vec::new();
    for row in rows {
        listings.push(row_to_listing_mysql(&row)?);
    }

    Ok(listings)
}

fn row_to_listing_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Listing> {
    let kind_str: String = row.get("kind");
    let kind = ListingKind::from_str(&kind_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid listing kind in database: {}", kind_str))?;

    let image_urls_raw: String = row.get("image_urls");
    let image_urls: Vec<String> =
        serde_json::from_str(&image_urls_raw).context("Invalid image URL list in database")?;

    Ok(Listing {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        address: row.get("address"),
        regular_price: row.get("regular_price"),
        discount_price: row.get("discount_price"),
        bathrooms: row.get("bathrooms"),
        bedrooms: row.get("bedrooms"),
        furnished: row.get("furnished"),
        parking: row.get("parking"),
        kind,
        offer: row.get("offer"),
        image_urls,
        owner_id: row.get("owner_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
