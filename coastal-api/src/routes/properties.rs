/// Property management endpoints for brokers and agents
///
/// - `GET /properties` - Live listings in the caller's scope, newest first
/// - `POST /properties` - Create a listing with optional `images`
/// - `GET /properties/:id` - Fetch one, archived included
/// - `PUT /properties/:id` - Partial update (`is_archived: false` restores)
/// - `DELETE /properties/:id` - Archive (204)
/// - `POST /properties/:id/images` - Append images to a live listing
/// - `DELETE /properties/:id/images/:image_id` - Remove one image (204)

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Extension, Json,
};
use coastal_shared::{
    auth::authorization::Principal,
    models::{Listing, NewImage, PropertyImage},
    services::listings::{self, ListingChanges, NewListing},
};

pub async fn list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Vec<Listing>>> {
    Ok(Json(listings::list(&state.db, &principal).await?))
}

/// Creates a listing owned by the caller
///
/// # Errors
///
/// - `400 Bad Request`: Missing or invalid fields
/// - `401 Unauthorized`: Missing or invalid token, or an inactive account
pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<NewListing>, JsonRejection>,
) -> ApiResult<Json<Listing>> {
    let Json(listing) = payload?;
    Ok(Json(listings::create(&state.db, &principal, listing).await?))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Listing>> {
    let Path(id) = path?;
    Ok(Json(listings::get(&state.db, &principal, id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ListingChanges>, JsonRejection>,
) -> ApiResult<Json<Listing>> {
    let Path(id) = path?;
    let Json(changes) = payload?;
    Ok(Json(listings::update(&state.db, &principal, id, changes).await?))
}

pub async fn archive(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = path?;
    listings::archive(&state.db, &principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Appends images and returns the created rows
pub async fn add_images(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<Vec<NewImage>>, JsonRejection>,
) -> ApiResult<Json<Vec<PropertyImage>>> {
    let Path(id) = path?;
    let Json(images) = payload?;
    Ok(Json(listings::add_images(&state.db, &principal, id, images).await?))
}

pub async fn remove_image(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<(i64, i64)>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path((id, image_id)) = path?;
    listings::remove_image(&state.db, &principal, id, image_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
