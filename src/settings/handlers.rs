use axum::{
    extract::{rejection::JsonRejection, State},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{CoffeePriceView, SettingsResponse, UpdatePricesRequest, UpdateSettingsRequest},
    services::{overrides_map, price_views, validate_currency, validate_prices},
};
use crate::{auth::AuthUser, error::ApiError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/user/settings", get(get_settings).put(update_settings))
        .route("/user/coffee_prices", get(get_prices).post(update_prices))
}

#[instrument(skip(state))]
pub async fn get_settings(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<SettingsResponse>, ApiError> {
    let user = state
        .store
        .find_user_by_id(auth.user_id)
        .await
        .map_err(ApiError::internal("Database error while loading settings"))?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_settings(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<UpdateSettingsRequest>, JsonRejection>,
) -> Result<Json<SettingsResponse>, ApiError> {
    let Json(body) = payload?;
    let (code, symbol) = validate_currency(&body.currency_code, body.currency_symbol.as_deref())?;

    let user = state
        .store
        .update_user_currency(auth.user_id, &code, &symbol)
        .await
        .map_err(ApiError::internal("Database error while saving settings"))?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    info!(user_id = %auth.user_id, currency = %code, "settings updated");
    Ok(Json(user.into()))
}

async fn current_prices(state: &AppState, auth: AuthUser) -> Result<Vec<CoffeePriceView>, ApiError> {
    let prices = state
        .store
        .list_prices(auth.user_id)
        .await
        .map_err(ApiError::internal("Database error while loading prices"))?;
    Ok(price_views(&state.catalog, &overrides_map(prices)))
}

#[instrument(skip(state))]
pub async fn get_prices(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<CoffeePriceView>>, ApiError> {
    Ok(Json(current_prices(&state, auth).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_prices(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<UpdatePricesRequest>, JsonRejection>,
) -> Result<Json<Vec<CoffeePriceView>>, ApiError> {
    let Json(body) = payload?;
    let prices = validate_prices(&body.prices, &state.catalog)?;

    state
        .store
        .replace_prices(auth.user_id, &prices)
        .await
        .map_err(ApiError::internal("Database error while saving prices"))?;

    info!(user_id = %auth.user_id, custom = prices.len(), "coffee prices replaced");
    Ok(Json(current_prices(&state, auth).await?))
}
