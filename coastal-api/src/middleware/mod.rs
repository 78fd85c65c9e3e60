/// HTTP middleware for the API server
///
/// Bearer authentication lives in `coastal_shared::auth::middleware` so the
/// principal resolution stays next to the services that use it.

pub mod security;
