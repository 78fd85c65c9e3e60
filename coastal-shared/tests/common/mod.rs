//! Fixtures shared by the database-backed tests
//!
//! Each `#[sqlx::test]` gets a fresh database with the embedded migrations
//! applied, so fixtures create everything they need.

#![allow(dead_code)]

use coastal_shared::auth::authorization::Principal;
use coastal_shared::auth::credentials::{CredentialConfig, CredentialService};
use coastal_shared::models::{NewImage, PropertyFields, Role, User};
use coastal_shared::services::listings::{self, NewListing};
use coastal_shared::services::users::{self, NewAccount};
use coastal_shared::models::Listing;
use sqlx::PgPool;

pub const PASSWORD: &str = "correct-horse";

pub fn credentials() -> CredentialService {
    CredentialService::new(CredentialConfig {
        signing_secret: "integration-test-signing-secret-0123456789".to_string(),
        token_ttl_minutes: 60,
    })
}

pub fn account(email: &str, role: Role, broker_id: Option<i64>) -> NewAccount {
    NewAccount {
        email: email.to_string(),
        password: PASSWORD.to_string(),
        role,
        broker_id,
    }
}

pub async fn register(pool: &PgPool, email: &str, role: Role, broker_id: Option<i64>) -> User {
    users::register(pool, &credentials(), account(email, role, broker_id))
        .await
        .expect("register fixture user")
}

pub async fn broker(pool: &PgPool, email: &str) -> Principal {
    Principal::from(&register(pool, email, Role::Broker, None).await)
}

pub async fn agent(pool: &PgPool, email: &str, broker_id: Option<i64>) -> Principal {
    Principal::from(&register(pool, email, Role::Agent, broker_id).await)
}

pub fn fields(address: &str) -> PropertyFields {
    PropertyFields {
        mls_id: None,
        address: address.to_string(),
        city: "Charleston".to_string(),
        state: "SC".to_string(),
        zip_code: "29401".to_string(),
        price: Some(350000.0),
        beds: Some(3),
        baths: Some(2.0),
        sqft: Some(1800),
    }
}

pub fn image(url: &str, order_index: Option<i32>) -> NewImage {
    NewImage {
        url: url.to_string(),
        caption: None,
        order_index,
    }
}

pub async fn listing(pool: &PgPool, owner: &Principal, address: &str) -> Listing {
    listings::create(
        pool,
        owner,
        NewListing {
            fields: fields(address),
            images: Vec::new(),
        },
    )
    .await
    .expect("create fixture listing")
}
