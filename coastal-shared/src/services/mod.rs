/// Service operations
///
/// Each operation opens one transaction, authorizes the principal before it
/// touches any row, and commits at the end. An early `?` drops the
/// transaction, which rolls it back.
///
/// - [`users`]: Registration, login, principal resolution and broker-managed accounts
/// - [`listings`]: Property and image management for brokers and agents
/// - [`feed`]: Unauthenticated read-only listing feed

pub mod feed;
pub mod listings;
pub mod users;

use serde::{Deserialize, Deserializer};

use crate::error::{ServiceError, ServiceResult};

/// Deserializes a present field into `Some`, so `Option<Option<T>>` can tell
/// an absent field (`None`) from an explicit null (`Some(None)`)
///
/// Use together with `#[serde(default)]`.
pub fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Deserializes an explicit null as the type's default
pub fn deserialize_null_default<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: Deserialize<'de> + Default,
    D: Deserializer<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Unwraps a change to a column that cannot be NULL
pub(crate) fn required_change<T>(field: &str, change: Option<Option<T>>) -> ServiceResult<Option<T>> {
    match change {
        None => Ok(None),
        Some(Some(value)) => Ok(Some(value)),
        Some(None) => Err(ServiceError::InvalidInput(format!("{} cannot be null", field))),
    }
}
