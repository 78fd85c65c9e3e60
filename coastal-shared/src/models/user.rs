/// User model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('broker', 'agent');
///
/// CREATE TABLE users (
///     id BIGSERIAL PRIMARY KEY,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     password_hash TEXT NOT NULL,
///     role user_role NOT NULL DEFAULT 'agent',
///     broker_id BIGINT REFERENCES users(id),
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CHECK (role = 'agent' OR broker_id IS NULL)
/// );
/// ```
///
/// Users are never deleted; [`User::deactivate`] clears `is_active`.
///
/// All operations take a `&mut PgConnection` so they can run inside the
/// caller's transaction (`&mut *tx`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, Postgres, QueryBuilder};

const USER_COLUMNS: &str = "id, email, password_hash, role, broker_id, is_active, created_at";

/// Role in the brokerage hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Manages their own agents and everything those agents own
    Broker,

    /// Scoped to what they directly own
    Agent,
}

impl Role {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Broker => "broker",
            Role::Agent => "agent",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Agent
    }
}

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// User id
    pub id: i64,

    /// Unique login email
    pub email: String,

    /// Argon2id PHC hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Broker or agent
    pub role: Role,

    /// The broker this agent reports to
    pub broker_id: Option<i64>,

    /// False once the account has been deactivated
    pub is_active: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

/// Input for inserting a user row
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Login email
    pub email: String,

    /// Already-hashed password
    pub password_hash: String,

    /// Role
    pub role: Role,

    /// Reporting broker
    pub broker_id: Option<i64>,
}

/// Column changes for an existing user
///
/// `None` leaves a column untouched. `broker_id: Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    /// New email
    pub email: Option<String>,

    /// New password hash
    pub password_hash: Option<String>,

    /// New role
    pub role: Option<Role>,

    /// New broker (use Some(None) to clear)
    pub broker_id: Option<Option<i64>>,
}

impl UpdateUser {
    /// True when no column would change
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.password_hash.is_none()
            && self.role.is_none()
            && self.broker_id.is_none()
    }
}

impl User {
    /// Inserts a new user
    ///
    /// # Errors
    ///
    /// Fails on a duplicate email (unique violation), a dangling `broker_id`
    /// (foreign key) or a broker row carrying a `broker_id` (check).
    pub async fn create(conn: &mut PgConnection, data: CreateUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, password_hash, role, broker_id) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(data.email)
            .bind(data.password_hash)
            .bind(data.role)
            .bind(data.broker_id)
            .fetch_one(conn)
            .await
    }

    /// Finds a user by id
    pub async fn find_by_id(conn: &mut PgConnection, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Finds a user by exact email
    pub async fn find_by_email(
        conn: &mut PgConnection,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(conn)
            .await
    }

    /// Returns true if `email` is taken by any user other than `except_id`
    pub async fn email_taken(
        conn: &mut PgConnection,
        email: &str,
        except_id: Option<i64>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(except_id)
        .fetch_one(conn)
        .await
    }

    /// Lists a broker and the users reporting to them, newest first
    pub async fn list_for_broker(
        conn: &mut PgConnection,
        broker_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM users WHERE id = $1 OR broker_id = $1 ORDER BY created_at DESC, id DESC",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(broker_id)
            .fetch_all(conn)
            .await
    }

    /// Ids of every user reporting to `broker_id`
    pub async fn agent_ids(conn: &mut PgConnection, broker_id: i64) -> Result<Vec<i64>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM users WHERE broker_id = $1")
            .bind(broker_id)
            .fetch_all(conn)
            .await
    }

    /// Looks up the broker of `user_id`
    ///
    /// Outer `None`: no such user. Inner `None`: the user has no broker.
    pub async fn broker_of(
        conn: &mut PgConnection,
        user_id: i64,
    ) -> Result<Option<Option<i64>>, sqlx::Error> {
        sqlx::query_scalar("SELECT broker_id FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(conn)
            .await
    }

    /// Applies column changes and returns the updated row
    ///
    /// Returns `None` if the user does not exist.
    pub async fn update(
        conn: &mut PgConnection,
        id: i64,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        if data.is_empty() {
            return Self::find_by_id(conn, id).await;
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE users SET ");
        let mut columns = builder.separated(", ");

        if let Some(email) = data.email {
            columns.push("email = ").push_bind_unseparated(email);
        }
        if let Some(password_hash) = data.password_hash {
            columns.push("password_hash = ").push_bind_unseparated(password_hash);
        }
        if let Some(role) = data.role {
            columns.push("role = ").push_bind_unseparated(role);
        }
        if let Some(broker_id) = data.broker_id {
            columns.push("broker_id = ").push_bind_unseparated(broker_id);
        }

        builder.push(" WHERE id = ").push_bind(id);
        builder.push(" RETURNING ").push(USER_COLUMNS);

        builder
            .build_query_as::<User>()
            .fetch_optional(conn)
            .await
    }

    /// Marks a user inactive
    ///
    /// Returns true if the user exists. The row and everything it owns stay.
    pub async fn deactivate(conn: &mut PgConnection, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET is_active = FALSE WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
