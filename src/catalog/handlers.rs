use std::collections::HashMap;

use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use super::{dto::CoffeeTypeView, Catalog};
use crate::{auth::AuthUser, error::ApiError, settings::services::overrides_map, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/coffee-types", get(list_coffee_types))
}

/// Merges the user's overrides into the catalog, keeping catalog order.
pub fn priced_types(
    catalog: &Catalog,
    overrides: &HashMap<String, f64>,
    currency_symbol: &str,
) -> Vec<CoffeeTypeView> {
    catalog
        .iter()
        .map(|t| CoffeeTypeView {
            name: t.name.clone(),
            cost: t.price_with(overrides),
            volume: t.volume_ml,
            currency_symbol: currency_symbol.to_string(),
        })
        .collect()
}

#[instrument(skip(state))]
pub async fn list_coffee_types(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<CoffeeTypeView>>, ApiError> {
    let user = state
        .store
        .find_user_by_id(auth.user_id)
        .await
        .map_err(ApiError::internal("Database error while loading user"))?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;
    let prices = state
        .store
        .list_prices(auth.user_id)
        .await
        .map_err(ApiError::internal("Database error while loading prices"))?;

    Ok(Json(priced_types(
        &state.catalog,
        &overrides_map(prices),
        &user.currency_symbol,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_default_cost_only_for_their_type() {
        let catalog = Catalog::builtin();
        let mut overrides = HashMap::new();
        overrides.insert("Roma".to_string(), 0.7);

        let rows = priced_types(&catalog, &overrides, "$");
        let roma = rows.iter().find(|r| r.name == "Roma").unwrap();
        let cosi = rows.iter().find(|r| r.name == "Cosi").unwrap();
        assert_eq!(roma.cost, 0.7);
        assert_eq!(cosi.cost, 0.49);
        assert!(rows.iter().all(|r| r.currency_symbol == "$"));
    }

    #[test]
    fn serializes_currency_symbol_in_camel_case() {
        let row = CoffeeTypeView {
            name: "Roma".into(),
            cost: 0.5,
            volume: 40,
            currency_symbol: "€".into(),
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["currencySymbol"], "€");
        assert_eq!(json["volume"], 40);
    }
}
