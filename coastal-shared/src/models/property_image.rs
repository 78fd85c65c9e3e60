/// Property image model
///
/// # Schema
///
/// ```sql
/// CREATE TABLE property_images (
///     id BIGSERIAL PRIMARY KEY,
///     property_id BIGINT NOT NULL REFERENCES properties(id) ON DELETE CASCADE,
///     url TEXT NOT NULL,
///     caption TEXT,
///     order_index INTEGER
/// );
/// ```
///
/// Display order is `order_index` ascending with unset indexes last, ties
/// broken by id. Indexes are neither unique nor contiguous.

use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use std::collections::HashMap;

/// An image attached to a property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PropertyImage {
    /// Image id
    pub id: i64,

    /// Owning property
    pub property_id: i64,

    /// Reference returned by the media store
    pub url: String,

    /// Optional caption
    pub caption: Option<String>,

    /// Display position
    pub order_index: Option<i32>,
}

/// Input for attaching an image
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewImage {
    pub url: String,
    pub caption: Option<String>,
    pub order_index: Option<i32>,
}

impl PropertyImage {
    /// Inserts images for a property, in input order
    pub async fn create_many(
        conn: &mut PgConnection,
        property_id: i64,
        images: Vec<NewImage>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut created = Vec::with_capacity(images.len());

        for image in images {
            let row = sqlx::query_as::<_, PropertyImage>(
                r#"
                INSERT INTO property_images (property_id, url, caption, order_index)
                VALUES ($1, $2, $3, $4)
                RETURNING id, property_id, url, caption, order_index
                "#,
            )
            .bind(property_id)
            .bind(image.url)
            .bind(image.caption)
            .bind(image.order_index)
            .fetch_one(&mut *conn)
            .await?;

            created.push(row);
        }

        Ok(created)
    }

    /// Lists a property's images in display order
    pub async fn list_for_property(
        conn: &mut PgConnection,
        property_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, PropertyImage>(
            r#"
            SELECT id, property_id, url, caption, order_index
            FROM property_images
            WHERE property_id = $1
            ORDER BY order_index ASC NULLS LAST, id ASC
            "#,
        )
        .bind(property_id)
        .fetch_all(conn)
        .await
    }

    /// Loads images for several properties at once, grouped by property id
    pub async fn list_for_properties(
        conn: &mut PgConnection,
        property_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<Self>>, sqlx::Error> {
        let rows = sqlx::query_as::<_, PropertyImage>(
            r#"
            SELECT id, property_id, url, caption, order_index
            FROM property_images
            WHERE property_id = ANY($1)
            ORDER BY order_index ASC NULLS LAST, id ASC
            "#,
        )
        .bind(property_ids)
        .fetch_all(conn)
        .await?;

        let mut grouped: HashMap<i64, Vec<Self>> = HashMap::new();
        for row in rows {
            grouped.entry(row.property_id).or_default().push(row);
        }

        Ok(grouped)
    }

    /// Deletes one image of one property
    ///
    /// Returns false if no image with that id belongs to that property.
    pub async fn delete(
        conn: &mut PgConnection,
        property_id: i64,
        image_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM property_images WHERE id = $1 AND property_id = $2")
            .bind(image_id)
            .bind(property_id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
