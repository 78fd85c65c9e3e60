/// Bearer authentication middleware for Axum
///
/// Extracts the `Authorization: Bearer <token>` header, resolves the token to
/// an active user and inserts the resulting [`Principal`] into the request
/// extensions. Handlers take it with `Extension<Principal>`.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use axum::{middleware, routing::get, Extension, Router};
/// use coastal_shared::auth::authorization::Principal;
/// use coastal_shared::auth::credentials::CredentialService;
/// use coastal_shared::auth::middleware::create_principal_middleware;
/// use sqlx::PgPool;
///
/// async fn me(Extension(principal): Extension<Principal>) -> String {
///     format!("user {}", principal.id)
/// }
///
/// fn router(pool: PgPool, credentials: Arc<CredentialService>) -> Router {
///     Router::new()
///         .route("/me", get(me))
///         .route_layer(middleware::from_fn(create_principal_middleware(pool, credentials)))
/// }
/// ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqlx::PgPool;

use super::credentials::CredentialService;
use crate::error::ServiceError;
use crate::services::users;

/// Error type for authentication middleware
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Missing authorization header
    MissingCredentials,

    /// Authorization header is not a bearer token
    InvalidFormat(String),

    /// Token did not resolve to an active user
    InvalidToken(String),

    /// Store failure while resolving the token
    Internal,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingCredentials => write!(f, "Missing credentials"),
            AuthError::InvalidFormat(msg) | AuthError::InvalidToken(msg) => write!(f, "{}", msg),
            AuthError::Internal => write!(f, "Internal server error"),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = self.to_string();

        match self {
            AuthError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal_error", "message": message })),
            )
                .into_response(),
            // Malformed headers are still authentication failures, not bad requests
            _ => {
                let mut response = (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "error": "unauthorized", "message": message })),
                )
                    .into_response();
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                response
            }
        }
    }
}

/// Reads the bearer token out of request headers
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::InvalidFormat("Authorization header is not valid text".to_string()))?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidFormat("Expected Bearer token".to_string()));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidFormat("Empty bearer token".to_string()));
    }

    Ok(token)
}

/// Bearer authentication middleware
///
/// # Errors
///
/// Returns 401 Unauthorized if:
/// - Authorization header is missing or not a bearer token
/// - Token is malformed, expired or signed with another secret
/// - The subject does not exist or is inactive
pub async fn principal_auth_middleware(
    pool: PgPool,
    credentials: Arc<CredentialService>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(req.headers())?;

    let principal = users::resolve_principal(&pool, &credentials, token)
        .await
        .map_err(|e| match e {
            ServiceError::AuthenticationFailed(msg) => AuthError::InvalidToken(msg),
            other => {
                tracing::error!(error = %other, "Failed to resolve bearer token");
                AuthError::Internal
            }
        })?;

    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}

type MiddlewareFuture = Pin<Box<dyn Future<Output = Result<Response, AuthError>> + Send>>;

/// Creates a bearer authentication middleware closure
///
/// Captures the pool and credential service for `middleware::from_fn`.
pub fn create_principal_middleware(
    pool: PgPool,
    credentials: Arc<CredentialService>,
) -> impl Fn(Request, Next) -> MiddlewareFuture + Clone {
    move |req, next| {
        let pool = pool.clone();
        let credentials = credentials.clone();
        Box::pin(principal_auth_middleware(pool, credentials, req, next))
    }
}
