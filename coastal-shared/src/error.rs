/// Service error taxonomy
///
/// Every service operation returns `Result<T, ServiceError>`. The four domain
/// categories map one-to-one onto HTTP statuses in the API crate; anything
/// else is a server fault.
///
/// | Variant | Meaning | HTTP |
/// |---------|---------|------|
/// | `AuthenticationFailed` | Missing/invalid/expired token, unknown or inactive subject, bad credentials | 401 |
/// | `AuthorizationDenied` | Authenticated, but lacks the role or ownership | 403 |
/// | `NotFound` | Entity absent, or filtered out by archival state | 404 |
/// | `InvalidInput` | Duplicate email, malformed or contradictory fields | 400 |
/// | `Database` / `Internal` | Unexpected store or crypto failure | 500 |

use crate::auth::authorization::AuthzError;
use crate::auth::jwt::JwtError;
use crate::auth::password::PasswordError;
use crate::media::MediaError;

/// Result alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Error returned by service operations
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Caller could not be authenticated
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Caller is authenticated but not allowed
    #[error("Authorization denied: {0}")]
    AuthorizationDenied(String),

    /// Target entity does not exist (or is hidden)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request data violates a business rule
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unexpected database failure
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// Other unexpected failure (hashing, token signing, file storage)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            // Races past the pre-insert email check end up here
            if db_err.is_unique_violation() {
                return match db_err.constraint() {
                    Some(c) if c.contains("email") => {
                        ServiceError::InvalidInput("Email already registered".to_string())
                    }
                    _ => ServiceError::InvalidInput("Duplicate value".to_string()),
                };
            }
            if db_err.is_foreign_key_violation() {
                return ServiceError::InvalidInput("Referenced entity does not exist".to_string());
            }
            if db_err.is_check_violation() {
                return ServiceError::InvalidInput(format!(
                    "Constraint violation: {}",
                    db_err.constraint().unwrap_or("check")
                ));
            }
        }

        ServiceError::Database(err)
    }
}

impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Inactive => {
                ServiceError::AuthenticationFailed("Inactive or unknown user".to_string())
            }
            AuthzError::RoleRequired(_) | AuthzError::NotAuthorized(_) => {
                ServiceError::AuthorizationDenied(err.to_string())
            }
            AuthzError::Database(e) => ServiceError::from(e),
        }
    }
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        ServiceError::Internal(format!("Password operation failed: {}", err))
    }
}

impl From<JwtError> for ServiceError {
    fn from(err: JwtError) -> Self {
        ServiceError::Internal(format!("Token operation failed: {}", err))
    }
}

impl From<MediaError> for ServiceError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::Empty => ServiceError::InvalidInput(err.to_string()),
            MediaError::Io(_) => ServiceError::Internal(format!("Media storage failed: {}", err)),
        }
    }
}
