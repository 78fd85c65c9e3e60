//! # CoastalVision Shared Library
//!
//! Domain logic for the CoastalVision listing backend. The HTTP server in
//! `coastal-api` is a thin layer over the services defined here.
//!
//! ## Module Organization
//!
//! - `auth`: Password hashing, bearer tokens, principal resolution and the
//!   broker/agent authorization model
//! - `db`: Connection pool and migrations
//! - `models`: Database rows and their queries
//! - `services`: Listing, user management and public feed operations
//! - `media`: Image upload storage
//! - `chat`: Canned chat responder
//! - `error`: Service error taxonomy

pub mod auth;
pub mod chat;
pub mod db;
pub mod error;
pub mod media;
pub mod models;
pub mod services;

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
