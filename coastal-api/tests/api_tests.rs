/// End-to-end HTTP tests over the full router
///
/// Require DATABASE_URL pointing at a PostgreSQL server; each test runs in
/// its own freshly migrated database.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use coastal_shared::chat;
use common::{listing_body, TestApp, MAX_UPLOAD_BYTES};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrator = "coastal_shared::db::migrations::MIGRATOR")]
async fn test_health_and_security_headers(pool: PgPool) -> anyhow::Result<()> {
    let app = TestApp::new(pool, "health").await;

    let response = app.get("/health", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
    assert_eq!(response.body["database"], "connected");
    assert_eq!(response.headers.get("x-content-type-options").unwrap(), "nosniff");

    Ok(())
}

#[sqlx::test(migrator = "coastal_shared::db::migrations::MIGRATOR")]
async fn test_register_login_and_me(pool: PgPool) -> anyhow::Result<()> {
    let app = TestApp::new(pool, "auth").await;

    let user = app.register("broker@example.com", "broker", None).await;
    assert_eq!(user["role"], "broker");
    assert_eq!(user["is_active"], true);
    assert!(user.get("password_hash").is_none());

    let login = app.login_with("broker@example.com", common::PASSWORD).await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.body["token_type"], "bearer");
    let token = login.body["access_token"].as_str().unwrap().to_string();

    let me = app.get("/auth/me", Some(&token)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["id"], user["id"]);
    assert_eq!(me.body["email"], "broker@example.com");

    let wrong = app.login_with("broker@example.com", "not-the-password").await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    let unknown = app.login_with("nobody@example.com", common::PASSWORD).await;
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.body["message"], unknown.body["message"]);

    Ok(())
}

#[sqlx::test(migrator = "coastal_shared::db::migrations::MIGRATOR")]
async fn test_register_rejects_bad_input(pool: PgPool) -> anyhow::Result<()> {
    let app = TestApp::new(pool, "register").await;

    let short = app
        .json(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "email": "a@example.com", "password": "short" })),
        )
        .await;
    assert_eq!(short.status, StatusCode::BAD_REQUEST);
    assert_eq!(short.body["error"], "validation_error");
    assert_eq!(short.body["details"][0]["field"], "password");

    app.register("taken@example.com", "agent", None).await;
    let duplicate = app
        .json(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "email": "taken@example.com", "password": common::PASSWORD })),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);

    let malformed = app
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/auth/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);

    Ok(())
}

#[sqlx::test(migrator = "coastal_shared::db::migrations::MIGRATOR")]
async fn test_protected_routes_require_bearer(pool: PgPool) -> anyhow::Result<()> {
    let app = TestApp::new(pool, "bearer").await;

    for uri in ["/auth/me", "/users", "/properties"] {
        let response = app.get(uri, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(response.headers.get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");
    }

    let garbage = app.get("/auth/me", Some("not-a-token")).await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[sqlx::test(migrator = "coastal_shared::db::migrations::MIGRATOR")]
async fn test_user_management_is_broker_only(pool: PgPool) -> anyhow::Result<()> {
    let app = TestApp::new(pool, "users").await;

    let (broker_id, broker) = app.signup("broker@example.com", "broker", None).await;
    let (_, agent) = app.signup("agent@example.com", "agent", Some(broker_id)).await;

    let denied = app.get("/users", Some(&agent)).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let created = app
        .json(
            Method::POST,
            "/users",
            Some(&broker),
            Some(json!({ "email": "new@example.com", "password": common::PASSWORD, "role": "agent" })),
        )
        .await;
    assert_eq!(created.status, StatusCode::OK);
    assert_eq!(created.body["broker_id"], broker_id);
    let new_id = created.body["id"].as_i64().unwrap();

    let listed = app.get("/users", Some(&broker)).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body.as_array().unwrap().len(), 3);

    let updated = app
        .json(
            Method::PUT,
            &format!("/users/{}", new_id),
            Some(&broker),
            Some(json!({ "email": "renamed@example.com" })),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["email"], "renamed@example.com");

    let deactivated = app
        .json(Method::DELETE, &format!("/users/{}", new_id), Some(&broker), None)
        .await;
    assert_eq!(deactivated.status, StatusCode::NO_CONTENT);

    let fetched = app.get(&format!("/users/{}", new_id), Some(&broker)).await;
    assert_eq!(fetched.body["is_active"], false);

    let login = app.login_with("renamed@example.com", common::PASSWORD).await;
    assert_eq!(login.status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[sqlx::test(migrator = "coastal_shared::db::migrations::MIGRATOR")]
async fn test_property_lifecycle(pool: PgPool) -> anyhow::Result<()> {
    let app = TestApp::new(pool, "properties").await;

    let (broker_id, broker) = app.signup("broker@example.com", "broker", None).await;
    let (_, agent) = app.signup("agent@example.com", "agent", Some(broker_id)).await;
    let (_, stranger) = app.signup("stranger@example.com", "agent", None).await;

    let mut body = listing_body("12 King St");
    body["images"] = json!([
        { "url": "/media/b.jpg", "order_index": 2 },
        { "url": "/media/a.jpg", "caption": "Front", "order_index": 1 },
    ]);
    let created = app.json(Method::POST, "/properties", Some(&agent), Some(body)).await;
    assert_eq!(created.status, StatusCode::OK, "{}", created.body);
    assert_eq!(created.body["state"], "SC");
    assert_eq!(created.body["is_archived"], false);
    assert_eq!(created.body["images"][0]["url"], "/media/a.jpg");
    let id = created.body["id"].as_i64().unwrap();
    let path = format!("/properties/{}", id);

    let by_broker = app.get(&path, Some(&broker)).await;
    assert_eq!(by_broker.status, StatusCode::OK);
    let by_stranger = app.get(&path, Some(&stranger)).await;
    assert_eq!(by_stranger.status, StatusCode::FORBIDDEN);

    let broker_list = app.get("/properties", Some(&broker)).await;
    assert_eq!(broker_list.body.as_array().unwrap().len(), 1);
    let stranger_list = app.get("/properties", Some(&stranger)).await;
    assert!(stranger_list.body.as_array().unwrap().is_empty());

    let updated = app
        .json(
            Method::PUT,
            &path,
            Some(&broker),
            Some(json!({ "price": 399000.0, "mls_id": null })),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["price"], 399000.0);
    assert!(updated.body["mls_id"].is_null());
    assert_eq!(updated.body["address"], "12 King St");

    let null_city = app
        .json(Method::PUT, &path, Some(&agent), Some(json!({ "city": null })))
        .await;
    assert_eq!(null_city.status, StatusCode::BAD_REQUEST);

    let added = app
        .json(
            Method::POST,
            &format!("{}/images", path),
            Some(&agent),
            Some(json!([{ "url": "/media/c.jpg" }])),
        )
        .await;
    assert_eq!(added.status, StatusCode::OK);
    let image_id = added.body[0]["id"].as_i64().unwrap();

    let removed = app
        .json(
            Method::DELETE,
            &format!("{}/images/{}", path, image_id),
            Some(&agent),
            None,
        )
        .await;
    assert_eq!(removed.status, StatusCode::NO_CONTENT);

    let again = app
        .json(
            Method::DELETE,
            &format!("{}/images/{}", path, image_id),
            Some(&agent),
            None,
        )
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);

    let archived = app.json(Method::DELETE, &path, Some(&agent), None).await;
    assert_eq!(archived.status, StatusCode::NO_CONTENT);

    let still_there = app.get(&path, Some(&agent)).await;
    assert_eq!(still_there.status, StatusCode::OK);
    assert_eq!(still_there.body["is_archived"], true);

    let agent_list = app.get("/properties", Some(&agent)).await;
    assert!(agent_list.body.as_array().unwrap().is_empty());

    Ok(())
}

#[sqlx::test(migrator = "coastal_shared::db::migrations::MIGRATOR")]
async fn test_bad_path_ids_answer_json(pool: PgPool) -> anyhow::Result<()> {
    let app = TestApp::new(pool, "paths").await;
    let (_, broker) = app.signup("broker@example.com", "broker", None).await;

    for (method, uri) in [
        (Method::GET, "/properties/abc"),
        (Method::DELETE, "/properties/1/images/xyz"),
        (Method::GET, "/users/abc"),
        (Method::GET, "/public/properties/99999999999999999999"),
    ] {
        let response = app.json(method, uri, Some(&broker), None).await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(response.body["error"], "bad_request", "{}", uri);
        assert!(response.body["message"].is_string(), "{}", uri);
    }

    Ok(())
}

#[sqlx::test(migrator = "coastal_shared::db::migrations::MIGRATOR")]
async fn test_public_feed(pool: PgPool) -> anyhow::Result<()> {
    let app = TestApp::new(pool, "feed").await;
    let (_, agent) = app.signup("agent@example.com", "agent", None).await;

    let first = app
        .json(Method::POST, "/properties", Some(&agent), Some(listing_body("1 First St")))
        .await;
    let second = app
        .json(Method::POST, "/properties", Some(&agent), Some(listing_body("2 Second St")))
        .await;
    let first_id = first.body["id"].as_i64().unwrap();
    let second_id = second.body["id"].as_i64().unwrap();

    let feed = app.get("/public/properties", None).await;
    assert_eq!(feed.status, StatusCode::OK);
    let ids: Vec<i64> = feed
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![second_id, first_id]);

    app.json(Method::DELETE, &format!("/properties/{}", first_id), Some(&agent), None)
        .await;

    let hidden = app.get(&format!("/public/properties/{}", first_id), None).await;
    assert_eq!(hidden.status, StatusCode::NOT_FOUND);
    let visible = app.get(&format!("/public/properties/{}", second_id), None).await;
    assert_eq!(visible.status, StatusCode::OK);
    assert_eq!(visible.body["address"], "2 Second St");

    Ok(())
}

#[sqlx::test(migrator = "coastal_shared::db::migrations::MIGRATOR")]
async fn test_upload_and_serve(pool: PgPool) -> anyhow::Result<()> {
    let app = TestApp::new(pool, "upload").await;

    let uploaded = app.upload("file", "Porch.PNG", b"fake png bytes").await;
    assert_eq!(uploaded.status, StatusCode::OK, "{}", uploaded.body);
    let url = uploaded.body["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/media/"));
    assert!(url.ends_with(".png"));

    let served = app.get(&url, None).await;
    assert_eq!(served.status, StatusCode::OK);
    assert_eq!(served.raw, b"fake png bytes");

    let wrong_field = app.upload("photo", "a.jpg", b"data").await;
    assert_eq!(wrong_field.status, StatusCode::BAD_REQUEST);

    let empty = app.upload("file", "a.jpg", b"").await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);

    let too_big = app.upload("file", "big.jpg", &vec![7u8; MAX_UPLOAD_BYTES + 1]).await;
    assert_eq!(too_big.status, StatusCode::PAYLOAD_TOO_LARGE);

    Ok(())
}

#[sqlx::test(migrator = "coastal_shared::db::migrations::MIGRATOR")]
async fn test_chat_and_cors(pool: PgPool) -> anyhow::Result<()> {
    let app = TestApp::new(pool, "chat").await;

    let reply = app
        .json(
            Method::POST,
            "/chat",
            None,
            Some(json!({ "message": "Can we schedule a TOUR?" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["reply"], chat::TOUR_REPLY);

    let preflight = app
        .send(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/properties")
                .header(header::ORIGIN, "http://localhost:3000")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(
        preflight
            .headers
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "http://localhost:3000"
    );

    Ok(())
}
