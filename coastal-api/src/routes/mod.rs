/// API route handlers
///
/// Organized by resource:
///
/// - `health`: Liveness and database connectivity
/// - `auth`: Registration, login and the current user
/// - `users`: Broker-managed accounts
/// - `properties`: Listings and their images
/// - `public`: Unauthenticated listing feed
/// - `uploads`: Image upload
/// - `chat`: Canned chat responder

pub mod auth;
pub mod chat;
pub mod health;
pub mod properties;
pub mod public;
pub mod uploads;
pub mod users;
