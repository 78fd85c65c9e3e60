/// Public listing feed, no authentication
///
/// - `GET /public/properties` - Every live listing, newest first
/// - `GET /public/properties/:id` - One live listing (archived ones are 404)

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{rejection::PathRejection, Path, State},
    Json,
};
use coastal_shared::{models::Listing, services::feed};

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Listing>>> {
    Ok(Json(feed::list(&state.db).await?))
}

pub async fn get(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Listing>> {
    let Path(id) = path?;
    Ok(Json(feed::get(&state.db, id).await?))
}
