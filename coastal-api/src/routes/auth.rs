/// Authentication endpoints
///
/// - `POST /auth/register` - Register a broker or agent (JSON)
/// - `POST /auth/login` - Exchange credentials for a bearer token (form-encoded
///   `username` and `password`, as OAuth2 password-flow clients send them)
/// - `GET /auth/me` - The authenticated user

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        State,
    },
    Extension, Form, Json,
};
use coastal_shared::{
    auth::authorization::Principal,
    models::{Role, User},
    services::users::{self, NewAccount},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Role (defaults to agent)
    #[serde(default)]
    pub role: Role,

    /// Broker the new agent reports to
    #[serde(default)]
    pub broker_id: Option<i64>,
}

impl From<RegisterRequest> for NewAccount {
    fn from(req: RegisterRequest) -> Self {
        NewAccount {
            email: req.email,
            password: req.password,
            role: req.role,
            broker_id: req.broker_id,
        }
    }
}

/// Login form
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    /// Email address
    pub username: String,

    /// Password
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Bearer token
    pub access_token: String,

    /// Always "bearer"
    pub token_type: String,
}

/// Registers a new account
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed, email taken or invalid broker link
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<Json<User>> {
    let Json(req) = payload?;
    req.validate()?;

    let user = users::register(&state.db, &state.credentials, req.into()).await?;
    Ok(Json(user))
}

/// Issues a bearer token
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown email, wrong password or inactive account
pub async fn login(
    State(state): State<AppState>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> ApiResult<Json<TokenResponse>> {
    let Form(form) = form?;

    let access_token = users::login(&state.db, &state.credentials, &form.username, &form.password).await?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

/// Returns the authenticated user
pub async fn me(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<User>> {
    let user = users::current_user(&state.db, &principal).await?;
    Ok(Json(user))
}
