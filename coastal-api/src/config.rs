/// Configuration management for the API server
///
/// Loaded once at startup from environment variables (a `.env` file is read
/// first if present) and passed explicitly to everything that needs it.
///
/// # Environment Variables
///
/// | Variable | Default |
/// |----------|---------|
/// | `API_HOST` | `0.0.0.0` |
/// | `API_PORT` | `8000` |
/// | `PRODUCTION` | `false` (enables HSTS when true) |
/// | `CORS_ORIGINS` | local dev origins and the production site; `*` allows any |
/// | `DATABASE_URL` | required |
/// | `DATABASE_MAX_CONNECTIONS` | `10` |
/// | `RUN_MIGRATIONS` | `true` |
/// | `JWT_SECRET` | required, at least 32 characters |
/// | `TOKEN_TTL_MINUTES` | `1440` |
/// | `MEDIA_DIR` | `media` |
/// | `MEDIA_URL_PREFIX` | `/media` |
/// | `MAX_UPLOAD_BYTES` | `10485760` |
///
/// # Example
///
/// ```no_run
/// use coastal_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Origins allowed when `CORS_ORIGINS` is unset
pub const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://127.0.0.1:3000",
    "https://coastalvision.netlify.app",
];

/// Default upload cap (10 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Shortest accepted signing secret
pub const MIN_SECRET_LENGTH: usize = 32;

/// Longest accepted token lifetime (one year)
pub const MAX_TOKEN_TTL_MINUTES: i64 = 365 * 24 * 60;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Token configuration
    pub auth: AuthConfig,

    /// Upload storage configuration
    pub media: MediaConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins (`*` = any)
    pub cors_origins: Vec<String>,

    /// Production mode (HSTS on)
    pub production: bool,

    /// Largest accepted upload body
    pub max_upload_bytes: usize,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,

    /// Apply embedded migrations at startup
    pub run_migrations: bool,
}

/// Token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for signing bearer tokens
    ///
    /// Generate with: `openssl rand -hex 32`
    #[serde(skip_serializing)]
    pub signing_secret: String,

    /// Bearer token lifetime
    pub token_ttl_minutes: i64,
}

/// Upload storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Directory uploads are written to
    pub dir: String,

    /// URL prefix the directory is served under
    pub url_prefix: String,
}

fn var_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("{} has an invalid value", name)),
        Err(_) => Ok(default),
    }
}

/// Splits a comma-separated origin list, dropping blanks
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/').to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}

/// Normalizes a URL prefix to `/segment` form
pub fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/media".to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// Bounds the token lifetime to (0, one year]
pub fn check_token_ttl(minutes: i64) -> anyhow::Result<i64> {
    if minutes <= 0 {
        anyhow::bail!("TOKEN_TTL_MINUTES must be positive");
    }
    if minutes > MAX_TOKEN_TTL_MINUTES {
        anyhow::bail!("TOKEN_TTL_MINUTES must be at most {}", MAX_TOKEN_TTL_MINUTES);
    }
    Ok(minutes)
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `DATABASE_URL` or `JWT_SECRET` is missing
    /// - `JWT_SECRET` is shorter than 32 characters
    /// - `TOKEN_TTL_MINUTES` is not within one minute to one year
    /// - A numeric or boolean variable does not parse
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let cors_origins = match env::var("CORS_ORIGINS") {
            Ok(raw) => parse_origins(&raw),
            Err(_) => DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let signing_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if signing_secret.len() < MIN_SECRET_LENGTH {
            anyhow::bail!("JWT_SECRET must be at least {} characters long", MIN_SECRET_LENGTH);
        }

        let token_ttl_minutes = check_token_ttl(var_or("TOKEN_TTL_MINUTES", 1440)?)?;

        Ok(Self {
            api: ApiConfig {
                host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: var_or("API_PORT", 8000)?,
                cors_origins,
                production: var_or("PRODUCTION", false)?,
                max_upload_bytes: var_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: var_or("DATABASE_MAX_CONNECTIONS", 10)?,
                run_migrations: var_or("RUN_MIGRATIONS", true)?,
            },
            auth: AuthConfig {
                signing_secret,
                token_ttl_minutes,
            },
            media: MediaConfig {
                dir: env::var("MEDIA_DIR").unwrap_or_else(|_| "media".to_string()),
                url_prefix: normalize_prefix(
                    &env::var("MEDIA_URL_PREFIX").unwrap_or_else(|_| "/media".to_string()),
                ),
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// True when any origin may call the API
    pub fn allows_any_origin(&self) -> bool {
        self.api.cors_origins.iter().any(|o| o == "*")
    }
}
