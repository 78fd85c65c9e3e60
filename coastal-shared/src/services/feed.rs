/// Public listing feed
///
/// Read-only and unauthenticated. Only live (non-archived) properties are
/// visible here, whoever owns them.

use sqlx::PgPool;
use tracing::debug;

use crate::error::{ServiceError, ServiceResult};
use crate::models::{Listing, Property};

/// Lists every live property with its images, newest first
pub async fn list(pool: &PgPool) -> ServiceResult<Vec<Listing>> {
    let mut tx = pool.begin().await?;

    let properties = Property::list_active(&mut tx).await?;
    let listings = Listing::load_many(&mut tx, properties).await?;

    tx.commit().await?;

    debug!(count = listings.len(), "Listed public properties");
    Ok(listings)
}

/// Fetches one live property
///
/// An archived property is reported as missing.
pub async fn get(pool: &PgPool, id: i64) -> ServiceResult<Listing> {
    let mut tx = pool.begin().await?;

    let property = Property::find_active_by_id(&mut tx, id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Property not found".to_string()))?;
    let listing = Listing::load(&mut tx, property).await?;

    tx.commit().await?;
    Ok(listing)
}
