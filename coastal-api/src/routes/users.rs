/// Broker-managed user endpoints
///
/// Every route here requires a bearer token for an active broker. A broker
/// reaches themselves and the agents reporting to them.
///
/// - `GET /users` - List the broker and their agents
/// - `POST /users` - Create an account (agents are attached to the caller)
/// - `GET /users/:id` - Fetch one
/// - `PUT /users/:id` - Partial update
/// - `DELETE /users/:id` - Deactivate (204)

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Extension, Json,
};
use coastal_shared::{
    auth::authorization::Principal,
    models::{Role, User},
    services::{
        deserialize_some,
        users::{self, AccountChanges, NewAccount},
    },
};
use serde::Deserialize;
use validator::Validate;

/// Create user request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[serde(default)]
    pub role: Role,

    /// Ignored: agents always report to the creating broker
    #[serde(default)]
    pub broker_id: Option<i64>,
}

/// Update user request
///
/// `broker_id: null` clears the broker; leaving it out keeps it.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[serde(default)]
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[serde(default)]
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,

    #[serde(default)]
    pub role: Option<Role>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub broker_id: Option<Option<i64>>,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(users::list(&state.db, &principal).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<Json<User>> {
    let Json(req) = payload?;
    req.validate()?;

    let account = NewAccount {
        email: req.email,
        password: req.password,
        role: req.role,
        broker_id: req.broker_id,
    };

    let user = users::create(&state.db, &state.credentials, &principal, account).await?;
    Ok(Json(user))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<User>> {
    let Path(id) = path?;
    Ok(Json(users::get(&state.db, &principal, id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<Json<User>> {
    let Path(id) = path?;
    let Json(req) = payload?;
    req.validate()?;

    let changes = AccountChanges {
        email: req.email,
        password: req.password,
        role: req.role,
        broker_id: req.broker_id,
    };

    let user = users::update(&state.db, &state.credentials, &principal, id, changes).await?;
    Ok(Json(user))
}

/// Deactivates a user; the row and its properties remain
pub async fn deactivate(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = path?;
    users::deactivate(&state.db, &principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
