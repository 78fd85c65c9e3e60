/// Account operations
///
/// Public registration and login, bearer token resolution, and the
/// broker-only user management operations. Brokers manage themselves and the
/// agents reporting to them; agents cannot reach this surface at all.
///
/// # Account invariants
///
/// - Emails are unique (enforced again by the `users_email_key` constraint)
/// - A broker never has a `broker_id`
/// - A `broker_id` always references an existing broker
/// - Passwords are at least [`MIN_PASSWORD_LENGTH`](crate::auth::password::MIN_PASSWORD_LENGTH) characters

use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info, warn};

use super::deserialize_some;
use crate::auth::authorization::{self, Action, Principal};
use crate::auth::credentials::CredentialService;
use crate::auth::password::validate_password_length;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{CreateUser, Role, UpdateUser, User};

/// Input for registering or creating an account
#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub broker_id: Option<i64>,
}

/// Partial account update
///
/// `broker_id` distinguishes an absent field from an explicit null.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountChanges {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub broker_id: Option<Option<i64>>,
}

fn normalize_email(email: &str) -> ServiceResult<String> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ServiceError::InvalidInput("Invalid email address".to_string()));
    }
    Ok(email.to_string())
}

fn check_password(password: &str) -> ServiceResult<()> {
    validate_password_length(password).map_err(ServiceError::InvalidInput)
}

/// Checks the broker invariant for a (role, broker_id) pair about to be
/// written for user `user_id` (None when inserting)
async fn check_broker_link(
    conn: &mut PgConnection,
    user_id: Option<i64>,
    role: Role,
    broker_id: Option<i64>,
) -> ServiceResult<()> {
    let Some(broker_id) = broker_id else {
        return Ok(());
    };

    if role == Role::Broker {
        return Err(ServiceError::InvalidInput(
            "A broker cannot report to another broker".to_string(),
        ));
    }

    if user_id == Some(broker_id) {
        return Err(ServiceError::InvalidInput(
            "A user cannot be their own broker".to_string(),
        ));
    }

    match User::find_by_id(conn, broker_id).await? {
        Some(broker) if broker.role == Role::Broker => Ok(()),
        Some(_) => Err(ServiceError::InvalidInput(format!(
            "User {} is not a broker",
            broker_id
        ))),
        None => Err(ServiceError::InvalidInput(format!(
            "Broker {} does not exist",
            broker_id
        ))),
    }
}

/// Validates a new account and hashes its password
///
/// Runs before any transaction opens so no pooled connection waits on the
/// hash.
fn prepare_account(credentials: &CredentialService, account: NewAccount) -> ServiceResult<CreateUser> {
    let email = normalize_email(&account.email)?;
    check_password(&account.password)?;
    let password_hash = credentials.hash(&account.password)?;

    Ok(CreateUser {
        email,
        password_hash,
        role: account.role,
        broker_id: account.broker_id,
    })
}

async fn insert_account(conn: &mut PgConnection, account: CreateUser) -> ServiceResult<User> {
    check_broker_link(conn, None, account.role, account.broker_id).await?;

    if User::email_taken(conn, &account.email, None).await? {
        return Err(ServiceError::InvalidInput("Email already registered".to_string()));
    }

    Ok(User::create(conn, account).await?)
}

/// Registers a new account without authentication
///
/// # Errors
///
/// `InvalidInput` on a duplicate email, a short password, a broker carrying
/// a `broker_id` or a `broker_id` that is not a broker.
pub async fn register(
    pool: &PgPool,
    credentials: &CredentialService,
    account: NewAccount,
) -> ServiceResult<User> {
    let account = prepare_account(credentials, account)?;

    let mut tx = pool.begin().await?;

    let user = insert_account(&mut tx, account).await?;

    tx.commit().await?;

    info!(user_id = user.id, role = user.role.as_str(), "Registered user");
    Ok(user)
}

/// Checks credentials and issues a bearer token
///
/// Unknown email, wrong password and inactive account all fail the same way.
pub async fn login(
    pool: &PgPool,
    credentials: &CredentialService,
    email: &str,
    password: &str,
) -> ServiceResult<String> {
    let failed = || ServiceError::AuthenticationFailed("Incorrect email or password".to_string());

    let mut conn = pool.acquire().await?;
    let user = User::find_by_email(&mut conn, email.trim())
        .await?
        .ok_or_else(failed)?;

    if !credentials.verify(password, &user.password_hash) {
        debug!(user_id = user.id, "Login rejected: wrong password");
        return Err(failed());
    }

    if !user.is_active {
        warn!(user_id = user.id, "Login rejected: inactive user");
        return Err(failed());
    }

    let token = credentials.issue_token(user.id)?;

    info!(user_id = user.id, "User logged in");
    Ok(token)
}

/// Resolves a bearer token to the principal it was issued for
///
/// The subject must still exist and be active.
pub async fn resolve_principal(
    pool: &PgPool,
    credentials: &CredentialService,
    token: &str,
) -> ServiceResult<Principal> {
    let user_id = credentials
        .decode_token(token)
        .ok_or_else(|| ServiceError::AuthenticationFailed("Could not validate credentials".to_string()))?;

    let mut conn = pool.acquire().await?;
    let user = User::find_by_id(&mut conn, user_id).await?.ok_or_else(|| {
        ServiceError::AuthenticationFailed("Could not validate credentials".to_string())
    })?;

    let principal = Principal::from(&user);
    authorization::require_active(&principal)?;

    Ok(principal)
}

/// Loads the principal's own account
pub async fn current_user(pool: &PgPool, principal: &Principal) -> ServiceResult<User> {
    authorization::require_active(principal)?;

    let mut conn = pool.acquire().await?;
    User::find_by_id(&mut conn, principal.id)
        .await?
        .ok_or_else(|| ServiceError::AuthenticationFailed("User no longer exists".to_string()))
}

/// Creates an account on behalf of a broker
///
/// A created agent always reports to the creating broker, whatever
/// `broker_id` was supplied. A created broker never has one.
pub async fn create(
    pool: &PgPool,
    credentials: &CredentialService,
    principal: &Principal,
    mut account: NewAccount,
) -> ServiceResult<User> {
    authorization::require_broker(principal)?;

    account.broker_id = match account.role {
        Role::Agent => Some(principal.id),
        Role::Broker => None,
    };

    let account = prepare_account(credentials, account)?;

    let mut tx = pool.begin().await?;

    let user = insert_account(&mut tx, account).await?;

    tx.commit().await?;

    info!(
        user_id = user.id,
        created_by = principal.id,
        role = user.role.as_str(),
        "Created user"
    );
    Ok(user)
}

async fn load_authorized(
    conn: &mut PgConnection,
    principal: &Principal,
    id: i64,
    action: Action,
) -> ServiceResult<User> {
    authorization::require_broker(principal)?;

    let user = User::find_by_id(conn, id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

    authorization::authorize_user(principal, &user, action)?;
    Ok(user)
}

/// Fetches a user the broker manages (or the broker themselves)
pub async fn get(pool: &PgPool, principal: &Principal, id: i64) -> ServiceResult<User> {
    let mut conn = pool.acquire().await?;
    load_authorized(&mut conn, principal, id, Action::Read).await
}

/// Lists the broker and their agents, newest first
pub async fn list(pool: &PgPool, principal: &Principal) -> ServiceResult<Vec<User>> {
    authorization::require_broker(principal)?;

    let mut conn = pool.acquire().await?;
    let users = User::list_for_broker(&mut conn, principal.id).await?;

    debug!(broker_id = principal.id, count = users.len(), "Listed users");
    Ok(users)
}

/// Applies a partial update to a managed user
///
/// The resulting row must still satisfy the account invariants. A broker who
/// still has agents cannot be turned into an agent.
pub async fn update(
    pool: &PgPool,
    credentials: &CredentialService,
    principal: &Principal,
    id: i64,
    changes: AccountChanges,
) -> ServiceResult<User> {
    authorization::require_broker(principal)?;

    let mut update = UpdateUser::default();

    if let Some(password) = changes.password {
        check_password(&password)?;
        update.password_hash = Some(credentials.hash(&password)?);
    }

    let mut tx = pool.begin().await?;

    let current = load_authorized(&mut tx, principal, id, Action::Write).await?;

    if let Some(email) = changes.email {
        let email = normalize_email(&email)?;
        if User::email_taken(&mut tx, &email, Some(id)).await? {
            return Err(ServiceError::InvalidInput("Email already registered".to_string()));
        }
        update.email = Some(email);
    }

    let role = changes.role.unwrap_or(current.role);
    let broker_id = match changes.broker_id {
        Some(broker_id) => broker_id,
        None => current.broker_id,
    };

    if role != current.role || broker_id != current.broker_id {
        check_broker_link(&mut tx, Some(id), role, broker_id).await?;

        if current.role == Role::Broker
            && role == Role::Agent
            && !User::agent_ids(&mut tx, id).await?.is_empty()
        {
            return Err(ServiceError::InvalidInput(
                "A broker with agents cannot become an agent".to_string(),
            ));
        }
    }

    update.role = changes.role;
    update.broker_id = changes.broker_id;

    let user = User::update(&mut tx, id, update)
        .await?
        .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

    tx.commit().await?;

    info!(user_id = id, updated_by = principal.id, "Updated user");
    Ok(user)
}

/// Deactivates a managed user
///
/// The row and the properties it owns stay. Tokens issued to the user stop
/// resolving on their next use.
pub async fn deactivate(pool: &PgPool, principal: &Principal, id: i64) -> ServiceResult<()> {
    let mut tx = pool.begin().await?;

    load_authorized(&mut tx, principal, id, Action::Delete).await?;

    if !User::deactivate(&mut tx, id).await? {
        return Err(ServiceError::NotFound("User not found".to_string()));
    }

    tx.commit().await?;

    info!(user_id = id, deactivated_by = principal.id, "Deactivated user");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  agent@example.com ").unwrap(), "agent@example.com");
        assert!(normalize_email("").is_err());
        assert!(normalize_email("not-an-email").is_err());
    }

    #[test]
    fn test_check_password() {
        assert!(check_password("longenough").is_ok());
        assert!(matches!(check_password("short"), Err(ServiceError::InvalidInput(_))));
    }

    #[test]
    fn test_new_account_defaults_to_agent() {
        let account: NewAccount =
            serde_json::from_str(r#"{"email": "a@example.com", "password": "password1"}"#).unwrap();
        assert_eq!(account.role, Role::Agent);
        assert_eq!(account.broker_id, None);
    }

    #[test]
    fn test_account_changes_broker_id_null() {
        let changes: AccountChanges = serde_json::from_str(r#"{"broker_id": null}"#).unwrap();
        assert_eq!(changes.broker_id, Some(None));

        let changes: AccountChanges = serde_json::from_str(r#"{"role": "broker"}"#).unwrap();
        assert_eq!(changes.broker_id, None);
        assert_eq!(changes.role, Some(Role::Broker));
    }
}
