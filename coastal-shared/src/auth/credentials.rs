/// Credential service
///
/// Bundles password hashing and token handling behind the small contract the
/// rest of the system depends on:
///
/// - `hash(password) -> opaque hash`
/// - `verify(password, hash) -> bool`
/// - `issue_token(subject)` / `issue_token_with_ttl(subject, ttl) -> token`
/// - `decode_token(token) -> Option<subject>`
///
/// The signing secret and default token lifetime come from an explicit
/// [`CredentialConfig`] built at startup.

use chrono::Duration;
use tracing::{debug, warn};

use super::jwt::{self, Claims, JwtError};
use super::password::{self, PasswordError};

/// Default bearer token lifetime (one day)
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 1440;

/// Configuration for [`CredentialService`]
#[derive(Debug, Clone)]
pub struct CredentialConfig {
    /// HMAC secret used to sign and verify tokens
    pub signing_secret: String,

    /// Lifetime of tokens issued by [`CredentialService::issue_token`]
    pub token_ttl_minutes: i64,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            signing_secret: String::new(),
            token_ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
        }
    }
}

/// Password and token operations
#[derive(Debug, Clone)]
pub struct CredentialService {
    config: CredentialConfig,
}

impl CredentialService {
    /// Creates a credential service
    pub fn new(config: CredentialConfig) -> Self {
        Self { config }
    }

    /// Default lifetime of issued tokens
    pub fn token_ttl(&self) -> Duration {
        Duration::minutes(self.config.token_ttl_minutes)
    }

    /// Hashes a password
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        password::hash_password(password)
    }

    /// Checks a password against a stored hash
    ///
    /// A stored hash that cannot be parsed never verifies.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        match password::verify_password(password, hash) {
            Ok(valid) => valid,
            Err(e) => {
                warn!(error = %e, "Stored password hash is unusable");
                false
            }
        }
    }

    /// Issues a token for `subject` with the configured lifetime
    pub fn issue_token(&self, subject: i64) -> Result<String, JwtError> {
        self.issue_token_with_ttl(subject, self.token_ttl())
    }

    /// Issues a token for `subject` with an explicit lifetime
    pub fn issue_token_with_ttl(&self, subject: i64, ttl: Duration) -> Result<String, JwtError> {
        jwt::create_token(&Claims::new(subject, ttl), &self.config.signing_secret)
    }

    /// Decodes a token into its subject
    ///
    /// Returns `None` for malformed, tampered, foreign or expired tokens.
    pub fn decode_token(&self, token: &str) -> Option<i64> {
        match jwt::validate_token(token, &self.config.signing_secret) {
            Ok(claims) => claims.user_id(),
            Err(e) => {
                debug!(error = %e, "Rejected bearer token");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> CredentialService {
        CredentialService::new(CredentialConfig {
            signing_secret: "unit-test-signing-secret-0123456789".to_string(),
            token_ttl_minutes: 30,
        })
    }

    #[test]
    fn test_default_config_ttl() {
        assert_eq!(CredentialConfig::default().token_ttl_minutes, 1440);
    }

    #[test]
    fn test_token_roundtrip() {
        let creds = service();
        let token = creds.issue_token(314).unwrap();
        assert_eq!(creds.decode_token(&token), Some(314));
    }

    #[test]
    fn test_expired_token_decodes_to_none() {
        let creds = service();
        let token = creds.issue_token_with_ttl(5, Duration::seconds(-1)).unwrap();
        assert_eq!(creds.decode_token(&token), None);
    }

    #[test]
    fn test_tampered_token_decodes_to_none() {
        let creds = service();
        let token = creds.issue_token(5).unwrap();

        // Swap the payload for one claiming another subject
        let forged_claims = Claims::new(6, Duration::minutes(30));
        let forged = jwt::create_token(&forged_claims, "some-other-secret").unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged.split('.').collect();
        parts[1] = forged_parts[1];
        let tampered = parts.join(".");

        assert_eq!(creds.decode_token(&tampered), None);
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let other = CredentialService::new(CredentialConfig {
            signing_secret: "a-completely-different-signing-secret".to_string(),
            token_ttl_minutes: 30,
        });
        let token = other.issue_token(1).unwrap();
        assert_eq!(service().decode_token(&token), None);
    }

    #[test]
    fn test_hash_and_verify() {
        let creds = service();
        let hash = creds.hash("open-house-2024").unwrap();
        assert!(creds.verify("open-house-2024", &hash));
        assert!(!creds.verify("open-house-2025", &hash));
        assert!(!creds.verify("open-house-2024", "not-a-phc-string"));
    }
}
