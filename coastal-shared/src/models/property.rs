/// Property model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE properties (
///     id BIGSERIAL PRIMARY KEY,
///     mls_id VARCHAR(50),
///     address TEXT NOT NULL,
///     city TEXT NOT NULL,
///     state VARCHAR(2) NOT NULL,
///     zip_code VARCHAR(10) NOT NULL,
///     price DOUBLE PRECISION,
///     beds INTEGER,
///     baths DOUBLE PRECISION,
///     sqft INTEGER,
///     owner_id BIGINT NOT NULL REFERENCES users(id),
///     is_archived BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Properties are archived, never deleted. Every list query here excludes
/// archived rows; the id lookup does not, so callers decide.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, Postgres, QueryBuilder};

const PROPERTY_COLUMNS: &str = "id, mls_id, address, city, state, zip_code, price, beds, baths, \
                                sqft, owner_id, is_archived, created_at";

/// A property listing row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Property {
    /// Property id
    pub id: i64,

    /// External MLS identifier
    pub mls_id: Option<String>,

    /// Street address
    pub address: String,

    /// City
    pub city: String,

    /// Two-letter state code
    pub state: String,

    /// ZIP code
    pub zip_code: String,

    /// Asking price
    pub price: Option<f64>,

    /// Bedrooms
    pub beds: Option<i32>,

    /// Bathrooms (halves allowed)
    pub baths: Option<f64>,

    /// Living area in square feet
    pub sqft: Option<i32>,

    /// Broker or agent managing the listing
    pub owner_id: i64,

    /// Soft-delete flag
    pub is_archived: bool,

    /// When the listing was created
    pub created_at: DateTime<Utc>,
}

/// Listing fields supplied on creation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyFields {
    pub mls_id: Option<String>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub price: Option<f64>,
    pub beds: Option<i32>,
    pub baths: Option<f64>,
    pub sqft: Option<i32>,
}

/// Column changes for an existing property
///
/// Outer `None` leaves a column untouched. For nullable columns `Some(None)`
/// writes NULL.
#[derive(Debug, Clone, Default)]
pub struct UpdateProperty {
    pub mls_id: Option<Option<String>>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub price: Option<Option<f64>>,
    pub beds: Option<Option<i32>>,
    pub baths: Option<Option<f64>>,
    pub sqft: Option<Option<i32>>,
    pub is_archived: Option<bool>,
}

impl UpdateProperty {
    /// True when no column would change
    pub fn is_empty(&self) -> bool {
        self.mls_id.is_none()
            && self.address.is_none()
            && self.city.is_none()
            && self.state.is_none()
            && self.zip_code.is_none()
            && self.price.is_none()
            && self.beds.is_none()
            && self.baths.is_none()
            && self.sqft.is_none()
            && self.is_archived.is_none()
    }
}

impl Property {
    /// Inserts a property owned by `owner_id`
    pub async fn create(
        conn: &mut PgConnection,
        owner_id: i64,
        fields: PropertyFields,
    ) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO properties \
             (mls_id, address, city, state, zip_code, price, beds, baths, sqft, owner_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {}",
            PROPERTY_COLUMNS
        );

        sqlx::query_as::<_, Property>(&query)
            .bind(fields.mls_id)
            .bind(fields.address)
            .bind(fields.city)
            .bind(fields.state)
            .bind(fields.zip_code)
            .bind(fields.price)
            .bind(fields.beds)
            .bind(fields.baths)
            .bind(fields.sqft)
            .bind(owner_id)
            .fetch_one(conn)
            .await
    }

    /// Finds a property by id, archived or not
    pub async fn find_by_id(conn: &mut PgConnection, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM properties WHERE id = $1", PROPERTY_COLUMNS);

        sqlx::query_as::<_, Property>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Finds a non-archived property by id
    pub async fn find_active_by_id(
        conn: &mut PgConnection,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM properties WHERE id = $1 AND is_archived = FALSE",
            PROPERTY_COLUMNS
        );

        sqlx::query_as::<_, Property>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Lists non-archived properties owned by any of `owner_ids`, newest first
    pub async fn list_active_by_owners(
        conn: &mut PgConnection,
        owner_ids: &[i64],
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM properties \
             WHERE is_archived = FALSE AND owner_id = ANY($1) \
             ORDER BY created_at DESC, id DESC",
            PROPERTY_COLUMNS
        );

        sqlx::query_as::<_, Property>(&query)
            .bind(owner_ids)
            .fetch_all(conn)
            .await
    }

    /// Lists every non-archived property, newest first
    pub async fn list_active(conn: &mut PgConnection) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM properties WHERE is_archived = FALSE ORDER BY created_at DESC, id DESC",
            PROPERTY_COLUMNS
        );

        sqlx::query_as::<_, Property>(&query).fetch_all(conn).await
    }

    /// Applies column changes and returns the updated row
    pub async fn update(
        conn: &mut PgConnection,
        id: i64,
        data: UpdateProperty,
    ) -> Result<Option<Self>, sqlx::Error> {
        if data.is_empty() {
            return Self::find_by_id(conn, id).await;
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE properties SET ");
        let mut columns = builder.separated(", ");

        if let Some(mls_id) = data.mls_id {
            columns.push("mls_id = ").push_bind_unseparated(mls_id);
        }
        if let Some(address) = data.address {
            columns.push("address = ").push_bind_unseparated(address);
        }
        if let Some(city) = data.city {
            columns.push("city = ").push_bind_unseparated(city);
        }
        if let Some(state) = data.state {
            columns.push("state = ").push_bind_unseparated(state);
        }
        if let Some(zip_code) = data.zip_code {
            columns.push("zip_code = ").push_bind_unseparated(zip_code);
        }
        if let Some(price) = data.price {
            columns.push("price = ").push_bind_unseparated(price);
        }
        if let Some(beds) = data.beds {
            columns.push("beds = ").push_bind_unseparated(beds);
        }
        if let Some(baths) = data.baths {
            columns.push("baths = ").push_bind_unseparated(baths);
        }
        if let Some(sqft) = data.sqft {
            columns.push("sqft = ").push_bind_unseparated(sqft);
        }
        if let Some(is_archived) = data.is_archived {
            columns.push("is_archived = ").push_bind_unseparated(is_archived);
        }

        builder.push(" WHERE id = ").push_bind(id);
        builder.push(" RETURNING ").push(PROPERTY_COLUMNS);

        builder
            .build_query_as::<Property>()
            .fetch_optional(conn)
            .await
    }

    /// Sets the archived flag
    ///
    /// Returns true if the property exists.
    pub async fn archive(conn: &mut PgConnection, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE properties SET is_archived = TRUE WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
