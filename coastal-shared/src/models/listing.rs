/// A property with its images
///
/// Serializes flat: the property's columns plus an `images` array.

use serde::{Deserialize, Serialize};
use sqlx::PgConnection;

use super::{Property, PropertyImage};

/// Property plus ordered images
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    #[serde(flatten)]
    pub property: Property,

    pub images: Vec<PropertyImage>,
}

impl Listing {
    /// Loads the images of one property
    pub async fn load(conn: &mut PgConnection, property: Property) -> Result<Self, sqlx::Error> {
        let images = PropertyImage::list_for_property(conn, property.id).await?;
        Ok(Self { property, images })
    }

    /// Loads images for a page of properties with a single query, keeping
    /// the properties' order
    pub async fn load_many(
        conn: &mut PgConnection,
        properties: Vec<Property>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        if properties.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = properties.iter().map(|p| p.id).collect();
        let mut images = PropertyImage::list_for_properties(conn, &ids).await?;

        Ok(properties
            .into_iter()
            .map(|property| {
                let images = images.remove(&property.id).unwrap_or_default();
                Self { property, images }
            })
            .collect())
    }
}
