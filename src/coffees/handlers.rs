use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{AddCoffeeRequest, ClearedResponse, CoffeeEntryResponse, DeletedResponse},
    services::{add_entry, parse_date},
};
use crate::{auth::AuthUser, error::ApiError, state::AppState};

const ENTRY_NOT_FOUND: &str = "Entry not found or not authorized to delete.";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/coffees/:date",
            get(list_coffees).post(add_coffee).delete(clear_coffees),
        )
        .route("/coffee_entry/:id", delete(delete_coffee_entry))
}

#[instrument(skip(state))]
pub async fn list_coffees(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(date): Path<String>,
) -> Result<Json<Vec<CoffeeEntryResponse>>, ApiError> {
    let entry_date = parse_date(&date)?;
    let rows = state
        .store
        .list_entries_for_date(auth.user_id, entry_date)
        .await
        .map_err(ApiError::internal("Database error while fetching coffee entries"))?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state, payload))]
pub async fn add_coffee(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(date): Path<String>,
    payload: Result<Json<AddCoffeeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CoffeeEntryResponse>), ApiError> {
    let entry_date = parse_date(&date)?;
    let Json(body) =
        payload.map_err(|_| ApiError::validation("Missing 'type' or 'time' in request."))?;

    let entry = add_entry(&state, auth.user_id, entry_date, &body.coffee_type, &body.time).await?;
    Ok((StatusCode::CREATED, Json(entry.into())))
}

#[instrument(skip(state))]
pub async fn clear_coffees(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(date): Path<String>,
) -> Result<Json<ClearedResponse>, ApiError> {
    let entry_date = parse_date(&date)?;
    let deleted_count = state
        .store
        .clear_entries_for_date(auth.user_id, entry_date)
        .await
        .map_err(ApiError::internal("Database error while clearing coffees"))?;

    info!(user_id = %auth.user_id, %date, deleted_count, "coffees cleared");
    Ok(Json(ClearedResponse {
        message: format!("Coffees for {} cleared successfully.", date),
        deleted_count,
    }))
}

#[instrument(skip(state))]
pub async fn delete_coffee_entry(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let entry_id: i64 = id
        .parse()
        .map_err(|_| ApiError::validation("Invalid entry id."))?;

    let deleted = state
        .store
        .delete_entry(auth.user_id, entry_id)
        .await
        .map_err(ApiError::internal("Database error while deleting coffee entry"))?;

    if !deleted {
        warn!(user_id = %auth.user_id, entry_id, "delete of missing or foreign entry");
        return Err(ApiError::NotFound(ENTRY_NOT_FOUND.into()));
    }

    info!(user_id = %auth.user_id, entry_id, "coffee entry deleted");
    Ok(Json(DeletedResponse {
        message: format!("Coffee entry {} deleted successfully.", entry_id),
        deleted_id: entry_id,
    }))
}
