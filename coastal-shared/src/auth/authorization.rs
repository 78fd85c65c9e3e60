/// Ownership-scoped authorization
///
/// Every service operation asks this module before it touches the store.
///
/// # Permission Model
///
/// 1. **Active principal**: an inactive principal is denied everything
/// 2. **Role gate**: only brokers manage users; brokers and agents both
///    manage properties
/// 3. **Ownership**: a principal reaches a row they own, or a row owned by one
///    of their agents if they are a broker
///
/// | Principal | User `T` | Property `P` |
/// |-----------|----------|--------------|
/// | agent `A` | denied (role) | `P.owner_id == A.id` |
/// | broker `B` | `T.id == B.id` or `T.broker_id == B.id` | `P.owner_id == B.id` or `owner(P).broker_id == B.id` |
///
/// The rules are pure functions over ids. Only [`authorize_property`] and
/// [`property_owner_scope`] read the store, to find the owner's broker.
///
/// # Example
///
/// ```no_run
/// use coastal_shared::auth::authorization::{authorize_property, Action, Principal};
/// use coastal_shared::models::Property;
/// use sqlx::PgConnection;
///
/// async fn check(
///     conn: &mut PgConnection,
///     principal: &Principal,
///     property: &Property,
/// ) -> Result<(), coastal_shared::auth::authorization::AuthzError> {
///     authorize_property(conn, principal, property, Action::Write).await
/// }
/// ```

use serde::{Deserialize, Serialize};
use sqlx::PgConnection;

use crate::models::{Property, Role, User};

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Principal is deactivated
    #[error("User is inactive")]
    Inactive,

    /// Principal lacks the role the operation needs
    #[error("Requires {0} role")]
    RoleRequired(&'static str),

    /// Principal does not own the target, directly or through an agent
    #[error("Not authorized to access this {0}")]
    NotAuthorized(String),

    /// Database error while resolving ownership
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// What the caller wants to do with a target
///
/// Every action currently needs the same ownership; the variant is carried
/// so decisions and logs say what was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Read,
    Write,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Write => "write",
            Action::Delete => "delete",
        }
    }
}

/// The authenticated user an operation runs as
///
/// Built from the user row loaded at request time, so a deactivation takes
/// effect on the next request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// User id
    pub id: i64,

    /// Broker or agent
    pub role: Role,

    /// Broker this principal reports to
    pub broker_id: Option<i64>,

    /// Whether the account is active
    pub is_active: bool,
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            role: user.role,
            broker_id: user.broker_id,
            is_active: user.is_active,
        }
    }
}

impl Principal {
    pub fn is_broker(&self) -> bool {
        self.role == Role::Broker
    }
}

/// Rejects inactive principals
pub fn require_active(principal: &Principal) -> Result<(), AuthzError> {
    if !principal.is_active {
        return Err(AuthzError::Inactive);
    }

    Ok(())
}

/// Requires an active broker
pub fn require_broker(principal: &Principal) -> Result<(), AuthzError> {
    require_active(principal)?;

    if !principal.is_broker() {
        return Err(AuthzError::RoleRequired(Role::Broker.as_str()));
    }

    Ok(())
}

/// Requires an active broker or agent
pub fn require_broker_or_agent(principal: &Principal) -> Result<(), AuthzError> {
    require_active(principal)?;

    match principal.role {
        Role::Broker | Role::Agent => Ok(()),
    }
}

/// Whether `principal` may reach the user `target_id`
///
/// True for the principal themselves and for users who report to them.
pub fn can_access_user(principal: &Principal, target_id: i64, target_broker_id: Option<i64>) -> bool {
    target_id == principal.id || target_broker_id == Some(principal.id)
}

/// Whether `principal` may reach a property
///
/// `owner_broker_id` is the broker of the property's owner. Agents only
/// reach what they own; the owner's broker is ignored for them.
pub fn can_access_property(principal: &Principal, owner_id: i64, owner_broker_id: Option<i64>) -> bool {
    if owner_id == principal.id {
        return true;
    }

    match principal.role {
        Role::Broker => owner_broker_id == Some(principal.id),
        Role::Agent => false,
    }
}

/// Authorizes an action on a user row
///
/// Broker only, then ownership.
pub fn authorize_user(principal: &Principal, target: &User, action: Action) -> Result<(), AuthzError> {
    require_broker(principal)?;

    if !can_access_user(principal, target.id, target.broker_id) {
        tracing::debug!(
            principal_id = principal.id,
            target_id = target.id,
            action = action.as_str(),
            "User access denied"
        );
        return Err(AuthzError::NotAuthorized("user".to_string()));
    }

    Ok(())
}

/// Authorizes an action on a property
///
/// A broker who does not own the property directly needs the owner's row,
/// which is read through `conn` at decision time.
pub async fn authorize_property(
    conn: &mut PgConnection,
    principal: &Principal,
    property: &Property,
    action: Action,
) -> Result<(), AuthzError> {
    require_broker_or_agent(principal)?;

    let owner_broker_id = if property.owner_id != principal.id && principal.is_broker() {
        User::broker_of(conn, property.owner_id).await?.flatten()
    } else {
        None
    };

    if !can_access_property(principal, property.owner_id, owner_broker_id) {
        tracing::debug!(
            principal_id = principal.id,
            property_id = property.id,
            owner_id = property.owner_id,
            action = action.as_str(),
            "Property access denied"
        );
        return Err(AuthzError::NotAuthorized("property".to_string()));
    }

    Ok(())
}

/// Owner ids whose properties `principal` may list
///
/// An agent sees their own; a broker sees their own plus their agents'.
pub async fn property_owner_scope(
    conn: &mut PgConnection,
    principal: &Principal,
) -> Result<Vec<i64>, AuthzError> {
    require_broker_or_agent(principal)?;

    let mut owners = vec![principal.id];
    if principal.is_broker() {
        owners.extend(User::agent_ids(conn, principal.id).await?);
    }

    Ok(owners)
}
