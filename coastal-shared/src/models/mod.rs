/// Database models
///
/// - [`user`]: Broker and agent accounts
/// - [`property`]: Property listings
/// - [`property_image`]: Images attached to listings
/// - [`listing`]: A property together with its images, as served by the API
///
/// The `chat_sessions` and `chat_messages` tables exist in the schema but
/// have no model yet.

pub mod listing;
pub mod property;
pub mod property_image;
pub mod user;

pub use listing::Listing;
pub use property::{Property, PropertyFields, UpdateProperty};
pub use property_image::{NewImage, PropertyImage};
pub use user::{CreateUser, Role, UpdateUser, User};
