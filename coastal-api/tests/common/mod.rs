//! Harness for driving the full router against a test database
//!
//! Requests go through `tower::ServiceExt::oneshot`, so no socket is bound.
//! Each `#[sqlx::test]` gets its own migrated database; uploads go to a
//! per-test directory under the system temp dir.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use coastal_api::{
    app::{build_router, AppState},
    config::{ApiConfig, AuthConfig, Config, DatabaseConfig, MediaConfig},
};
use coastal_shared::media::LocalMediaStore;
use serde_json::{json, Value};
use sqlx::PgPool;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

pub const PASSWORD: &str = "correct-horse";

/// Upload cap used by the test configuration
pub const MAX_UPLOAD_BYTES: usize = 1024;

const BOUNDARY: &str = "coastal-test-boundary";

pub fn config(media_dir: &str) -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["http://localhost:3000".to_string()],
            production: false,
            max_upload_bytes: MAX_UPLOAD_BYTES,
        },
        database: DatabaseConfig {
            url: String::new(),
            max_connections: 5,
            run_migrations: false,
        },
        auth: AuthConfig {
            signing_secret: "api-test-signing-secret-0123456789abcdef".to_string(),
            token_ttl_minutes: 60,
        },
        media: MediaConfig {
            dir: media_dir.to_string(),
            url_prefix: "/media".to_string(),
        },
    }
}

/// A router wired to a test database
pub struct TestApp {
    pub router: Router,
    pub media_dir: PathBuf,
}

/// A decoded response
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub raw: Vec<u8>,
}

impl TestApp {
    /// `name` keeps upload directories of concurrently running tests apart
    pub async fn new(pool: PgPool, name: &str) -> Self {
        let media_dir = std::env::temp_dir().join(format!(
            "coastal-api-{}-{}",
            name,
            std::process::id()
        ));
        let dir = media_dir.to_string_lossy().to_string();

        let store = LocalMediaStore::new(&dir, "/media");
        store.ensure_root().await.unwrap();

        let state = AppState::with_media(pool, config(&dir), Arc::new(store));
        Self {
            router: build_router(state),
            media_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let raw = to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec();
        let body = serde_json::from_slice(&raw).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
            raw,
        }
    }

    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).unwrap()).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.json(Method::GET, uri, token, None).await
    }

    /// Registers an account and returns its JSON
    pub async fn register(&self, email: &str, role: &str, broker_id: Option<i64>) -> Value {
        let response = self
            .json(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({
                    "email": email,
                    "password": PASSWORD,
                    "role": role,
                    "broker_id": broker_id,
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "register {}: {}", email, response.body);
        response.body
    }

    pub async fn login_with(&self, email: &str, password: &str) -> TestResponse {
        let form = format!(
            "username={}&password={}",
            email.replace('@', "%40"),
            password
        );
        let request = Request::builder()
            .method(Method::POST)
            .uri("/auth/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form))
            .unwrap();
        self.send(request).await
    }

    /// Logs in with the fixture password and returns the bearer token
    pub async fn login(&self, email: &str) -> String {
        let response = self.login_with(email, PASSWORD).await;
        assert_eq!(response.status, StatusCode::OK, "login {}: {}", email, response.body);
        response.body["access_token"].as_str().unwrap().to_string()
    }

    /// Registers and logs in, returning (id, token)
    pub async fn signup(&self, email: &str, role: &str, broker_id: Option<i64>) -> (i64, String) {
        let user = self.register(email, role, broker_id).await;
        let token = self.login(email).await;
        (user["id"].as_i64().unwrap(), token)
    }

    /// Posts one multipart field
    pub async fn upload(&self, field: &str, filename: &str, data: &[u8]) -> TestResponse {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"{f}\"; filename=\"{n}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n",
                b = BOUNDARY,
                f = field,
                n = filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/uploads/image")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }
}

pub fn listing_body(address: &str) -> Value {
    json!({
        "mls_id": "MLS-1",
        "address": address,
        "city": "Charleston",
        "state": "sc",
        "zip_code": "29401",
        "price": 425000.0,
        "beds": 3,
        "baths": 2.5,
        "sqft": 1900,
    })
}
