/// Property listing operations for brokers and agents
///
/// Agents manage the properties they own. Brokers manage their own plus those
/// of their agents. Archived properties drop out of every list but stay
/// reachable by id for whoever may manage them; images can only be changed
/// on a live listing.

use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info};

use super::{deserialize_null_default, deserialize_some, required_change};
use crate::auth::authorization::{self, Action, Principal};
use crate::error::{ServiceError, ServiceResult};
use crate::models::{Listing, NewImage, Property, PropertyFields, PropertyImage, UpdateProperty};

/// Input for creating a listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewListing {
    #[serde(flatten)]
    pub fields: PropertyFields,

    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub images: Vec<NewImage>,
}

/// Partial listing update
///
/// Absent fields stay as they are. An explicit null clears a nullable
/// column and is rejected for a required one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingChanges {
    #[serde(default, deserialize_with = "deserialize_some")]
    pub mls_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub state: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub zip_code: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub price: Option<Option<f64>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub beds: Option<Option<i32>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub baths: Option<Option<f64>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub sqft: Option<Option<i32>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub is_archived: Option<Option<bool>>,
}

fn non_blank(field: &str, value: String) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::InvalidInput(format!("{} cannot be empty", field)));
    }
    Ok(trimmed.to_string())
}

fn state_code(value: String) -> ServiceResult<String> {
    let code = value.trim().to_ascii_uppercase();
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ServiceError::InvalidInput(
            "state must be a two-letter code".to_string(),
        ));
    }
    Ok(code)
}

fn zip(value: String) -> ServiceResult<String> {
    let zip = non_blank("zip_code", value)?;
    if zip.len() > 10 {
        return Err(ServiceError::InvalidInput("zip_code is too long".to_string()));
    }
    Ok(zip)
}

fn non_negative<T: PartialOrd + Default>(field: &str, value: Option<T>) -> ServiceResult<Option<T>> {
    match value {
        Some(v) if v < T::default() => Err(ServiceError::InvalidInput(format!(
            "{} cannot be negative",
            field
        ))),
        other => Ok(other),
    }
}

fn clean_fields(fields: PropertyFields) -> ServiceResult<PropertyFields> {
    Ok(PropertyFields {
        mls_id: fields.mls_id.map(|m| m.trim().to_string()).filter(|m| !m.is_empty()),
        address: non_blank("address", fields.address)?,
        city: non_blank("city", fields.city)?,
        state: state_code(fields.state)?,
        zip_code: zip(fields.zip_code)?,
        price: non_negative("price", fields.price)?,
        beds: non_negative("beds", fields.beds)?,
        baths: non_negative("baths", fields.baths)?,
        sqft: non_negative("sqft", fields.sqft)?,
    })
}

fn clean_images(images: Vec<NewImage>) -> ServiceResult<Vec<NewImage>> {
    images
        .into_iter()
        .map(|image| {
            Ok(NewImage {
                url: non_blank("url", image.url)?,
                ..image
            })
        })
        .collect()
}

fn clean_changes(changes: ListingChanges) -> ServiceResult<UpdateProperty> {
    Ok(UpdateProperty {
        mls_id: changes
            .mls_id
            .map(|m| m.map(|m| m.trim().to_string()).filter(|m| !m.is_empty())),
        address: required_change("address", changes.address)?
            .map(|v| non_blank("address", v))
            .transpose()?,
        city: required_change("city", changes.city)?
            .map(|v| non_blank("city", v))
            .transpose()?,
        state: required_change("state", changes.state)?.map(state_code).transpose()?,
        zip_code: required_change("zip_code", changes.zip_code)?.map(zip).transpose()?,
        price: changes.price.map(|v| non_negative("price", v)).transpose()?,
        beds: changes.beds.map(|v| non_negative("beds", v)).transpose()?,
        baths: changes.baths.map(|v| non_negative("baths", v)).transpose()?,
        sqft: changes.sqft.map(|v| non_negative("sqft", v)).transpose()?,
        is_archived: required_change("is_archived", changes.is_archived)?,
    })
}

/// Loads a property and authorizes `action` on it
///
/// With `live_only`, an archived property is reported as missing.
async fn load_authorized(
    conn: &mut PgConnection,
    principal: &Principal,
    id: i64,
    action: Action,
    live_only: bool,
) -> ServiceResult<Property> {
    authorization::require_broker_or_agent(principal)?;

    let property = if live_only {
        Property::find_active_by_id(conn, id).await?
    } else {
        Property::find_by_id(conn, id).await?
    }
    .ok_or_else(|| ServiceError::NotFound("Property not found".to_string()))?;

    authorization::authorize_property(conn, principal, &property, action).await?;
    Ok(property)
}

/// Creates a property owned by the principal, with its initial images
///
/// The property and every image land together or not at all.
pub async fn create(pool: &PgPool, principal: &Principal, listing: NewListing) -> ServiceResult<Listing> {
    authorization::require_broker_or_agent(principal)?;

    let fields = clean_fields(listing.fields)?;
    let images = clean_images(listing.images)?;

    let mut tx = pool.begin().await?;

    let property = Property::create(&mut tx, principal.id, fields).await?;
    PropertyImage::create_many(&mut tx, property.id, images).await?;
    let listing = Listing::load(&mut tx, property).await?;

    tx.commit().await?;

    info!(
        property_id = listing.property.id,
        owner_id = principal.id,
        images = listing.images.len(),
        "Created property"
    );
    Ok(listing)
}

/// Fetches one property the principal may manage, archived or not
pub async fn get(pool: &PgPool, principal: &Principal, id: i64) -> ServiceResult<Listing> {
    let mut tx = pool.begin().await?;

    let property = load_authorized(&mut tx, principal, id, Action::Read, false).await?;
    let listing = Listing::load(&mut tx, property).await?;

    tx.commit().await?;
    Ok(listing)
}

/// Lists live properties in the principal's scope, newest first
pub async fn list(pool: &PgPool, principal: &Principal) -> ServiceResult<Vec<Listing>> {
    let mut tx = pool.begin().await?;

    let owners = authorization::property_owner_scope(&mut tx, principal).await?;
    let properties = Property::list_active_by_owners(&mut tx, &owners).await?;
    let listings = Listing::load_many(&mut tx, properties).await?;

    tx.commit().await?;

    debug!(
        principal_id = principal.id,
        owners = owners.len(),
        count = listings.len(),
        "Listed properties"
    );
    Ok(listings)
}

/// Applies a partial update
///
/// Works on archived properties too, so `is_archived: false` restores one.
pub async fn update(
    pool: &PgPool,
    principal: &Principal,
    id: i64,
    changes: ListingChanges,
) -> ServiceResult<Listing> {
    let changes = clean_changes(changes)?;

    let mut tx = pool.begin().await?;

    load_authorized(&mut tx, principal, id, Action::Write, false).await?;

    let property = Property::update(&mut tx, id, changes)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Property not found".to_string()))?;
    let listing = Listing::load(&mut tx, property).await?;

    tx.commit().await?;

    info!(property_id = id, updated_by = principal.id, "Updated property");
    Ok(listing)
}

/// Archives a property
///
/// Archiving an already archived property succeeds and changes nothing.
pub async fn archive(pool: &PgPool, principal: &Principal, id: i64) -> ServiceResult<()> {
    let mut tx = pool.begin().await?;

    let property = load_authorized(&mut tx, principal, id, Action::Delete, false).await?;

    if property.is_archived {
        debug!(property_id = id, "Property already archived");
    } else {
        Property::archive(&mut tx, id).await?;
        info!(property_id = id, archived_by = principal.id, "Archived property");
    }

    tx.commit().await?;
    Ok(())
}

/// Appends images to a live property
pub async fn add_images(
    pool: &PgPool,
    principal: &Principal,
    id: i64,
    images: Vec<NewImage>,
) -> ServiceResult<Vec<PropertyImage>> {
    let images = clean_images(images)?;

    let mut tx = pool.begin().await?;

    load_authorized(&mut tx, principal, id, Action::Write, true).await?;
    let created = PropertyImage::create_many(&mut tx, id, images).await?;

    tx.commit().await?;

    info!(property_id = id, count = created.len(), "Added property images");
    Ok(created)
}

/// Deletes one image of a live property
pub async fn remove_image(
    pool: &PgPool,
    principal: &Principal,
    id: i64,
    image_id: i64,
) -> ServiceResult<()> {
    let mut tx = pool.begin().await?;

    load_authorized(&mut tx, principal, id, Action::Write, true).await?;

    if !PropertyImage::delete(&mut tx, id, image_id).await? {
        return Err(ServiceError::NotFound("Image not found".to_string()));
    }

    tx.commit().await?;

    info!(property_id = id, image_id, "Removed property image");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> PropertyFields {
        PropertyFields {
            mls_id: Some("  ".to_string()),
            address: " 5 Meeting St ".to_string(),
            city: "Charleston".to_string(),
            state: "sc".to_string(),
            zip_code: "29401".to_string(),
            price: Some(450000.0),
            beds: Some(3),
            baths: Some(2.5),
            sqft: None,
        }
    }

    #[test]
    fn test_clean_fields() {
        let cleaned = clean_fields(fields()).unwrap();
        assert_eq!(cleaned.mls_id, None);
        assert_eq!(cleaned.address, "5 Meeting St");
        assert_eq!(cleaned.state, "SC");
    }

    #[test]
    fn test_clean_fields_rejections() {
        let mut f = fields();
        f.state = "South Carolina".to_string();
        assert!(matches!(clean_fields(f), Err(ServiceError::InvalidInput(_))));

        let mut f = fields();
        f.city = "   ".to_string();
        assert!(matches!(clean_fields(f), Err(ServiceError::InvalidInput(_))));

        let mut f = fields();
        f.beds = Some(-1);
        assert!(matches!(clean_fields(f), Err(ServiceError::InvalidInput(_))));
    }

    #[test]
    fn test_new_listing_deserializes_flat() {
        let listing: NewListing = serde_json::from_str(
            r#"{"address": "1 A St", "city": "Greenville", "state": "SC", "zip_code": "29601",
                "price": 199000, "images": [{"url": "/media/a.jpg", "order_index": 0}]}"#,
        )
        .unwrap();

        assert_eq!(listing.fields.city, "Greenville");
        assert_eq!(listing.fields.price, Some(199000.0));
        assert_eq!(listing.images.len(), 1);
        assert_eq!(listing.images[0].order_index, Some(0));
    }

    #[test]
    fn test_new_listing_null_images() {
        let listing: NewListing = serde_json::from_str(
            r#"{"address": "1 A St", "city": "Aiken", "state": "SC", "zip_code": "29801", "images": null}"#,
        )
        .unwrap();
        assert!(listing.images.is_empty());
    }

    #[test]
    fn test_changes_leave_absent_fields_alone() {
        let changes: ListingChanges = serde_json::from_str(r#"{"beds": 4}"#).unwrap();
        let update = clean_changes(changes).unwrap();

        assert_eq!(update.beds, Some(Some(4)));
        assert_eq!(update.price, None);
        assert_eq!(update.address, None);
    }

    #[test]
    fn test_changes_null_clears_nullable() {
        let changes: ListingChanges = serde_json::from_str(r#"{"price": null}"#).unwrap();
        let update = clean_changes(changes).unwrap();
        assert_eq!(update.price, Some(None));
    }

    #[test]
    fn test_changes_null_on_required_is_invalid() {
        for field in ["address", "city", "state", "zip_code", "is_archived"] {
            let json = format!(r#"{{"{}": null}}"#, field);
            let changes: ListingChanges = serde_json::from_str(&json).unwrap();
            assert!(
                matches!(clean_changes(changes), Err(ServiceError::InvalidInput(_))),
                "{} null should be rejected",
                field
            );
        }
    }
}
