/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use coastal_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let app = build_router(AppState::new(pool, config));
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, post},
    Router,
};
use coastal_shared::auth::credentials::{CredentialConfig, CredentialService};
use coastal_shared::auth::middleware::create_principal_middleware;
use coastal_shared::media::{LocalMediaStore, MediaStore};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Room for multipart boundaries and headers on top of the file itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Password hashing and bearer tokens
    pub credentials: Arc<CredentialService>,

    /// Upload destination
    pub media: Arc<dyn MediaStore>,
}

impl AppState {
    /// Creates application state with local-disk media storage
    pub fn new(db: PgPool, config: Config) -> Self {
        let media = LocalMediaStore::new(&config.media.dir, &config.media.url_prefix);
        Self::with_media(db, config, Arc::new(media))
    }

    /// Creates application state with a given media store
    pub fn with_media(db: PgPool, config: Config, media: Arc<dyn MediaStore>) -> Self {
        let credentials = CredentialService::new(CredentialConfig {
            signing_secret: config.auth.signing_secret.clone(),
            token_ttl_minutes: config.auth.token_ttl_minutes,
        });

        Self {
            db,
            config: Arc::new(config),
            credentials: Arc::new(credentials),
            media,
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health
/// ├── /auth
/// │   ├── POST /register
/// │   ├── POST /login                  (form: username, password)
/// │   └── GET  /me                     (bearer)
/// ├── /users                           (bearer, broker only)
/// │   ├── GET | POST /
/// │   └── GET | PUT | DELETE /:id
/// ├── /properties                      (bearer)
/// │   ├── GET | POST /
/// │   ├── GET | PUT | DELETE /:id
/// │   ├── POST   /:id/images
/// │   └── DELETE /:id/images/:image_id
/// ├── /public/properties               (GET /, GET /:id)
/// ├── POST /uploads/image              (multipart field "file")
/// ├── POST /chat
/// └── GET  {media prefix}/*            (stored uploads)
/// ```
///
/// # Middleware Stack
///
/// Outermost first: security headers, CORS, request tracing. Bearer
/// authentication is a route layer on the protected routes only, so unknown
/// paths still 404 without a token.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let protected = Router::new()
        .route("/auth/me", get(routes::auth::me))
        .route("/users", get(routes::users::list).post(routes::users::create))
        .route(
            "/users/:id",
            get(routes::users::get)
                .put(routes::users::update)
                .delete(routes::users::deactivate),
        )
        .route(
            "/properties",
            get(routes::properties::list).post(routes::properties::create),
        )
        .route(
            "/properties/:id",
            get(routes::properties::get)
                .put(routes::properties::update)
                .delete(routes::properties::archive),
        )
        .route("/properties/:id/images", post(routes::properties::add_images))
        .route(
            "/properties/:id/images/:image_id",
            delete(routes::properties::remove_image),
        )
        .route_layer(middleware::from_fn(create_principal_middleware(
            state.db.clone(),
            state.credentials.clone(),
        )));

    let public = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/public/properties", get(routes::public::list))
        .route("/public/properties/:id", get(routes::public::get))
        .route(
            "/uploads/image",
            post(routes::uploads::upload_image).layer(DefaultBodyLimit::max(
                state.config.api.max_upload_bytes + MULTIPART_OVERHEAD_BYTES,
            )),
        )
        .route("/chat", post(routes::chat::chat));

    Router::new()
        .merge(public)
        .merge(protected)
        .nest_service(
            &state.config.media.url_prefix,
            ServeDir::new(&state.config.media.dir),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// CORS from configuration
///
/// `*` is fully permissive; otherwise only the listed origins, with
/// credentials allowed.
pub fn cors_layer(config: &Config) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
