/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: HS256 bearer token encoding and validation
/// - [`credentials`]: The credential service handed to the HTTP layer at startup
/// - [`authorization`]: The broker/agent ownership rules
/// - [`middleware`]: Bearer header parsing and authentication errors
///
/// # Example
///
/// ```no_run
/// use coastal_shared::auth::credentials::{CredentialConfig, CredentialService};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let credentials = CredentialService::new(CredentialConfig {
///     signing_secret: "a-signing-secret-of-at-least-32-bytes".to_string(),
///     token_ttl_minutes: 1440,
/// });
///
/// let hash = credentials.hash("correct horse battery")?;
/// assert!(credentials.verify("correct horse battery", &hash));
///
/// let token = credentials.issue_token(42)?;
/// assert_eq!(credentials.decode_token(&token), Some(42));
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod credentials;
pub mod jwt;
pub mod middleware;
pub mod password;
