use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::auth::repo_types::User;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingsResponse {
    pub username: String,
    pub currency_code: String,
    pub currency_symbol: String,
}

impl From<User> for SettingsResponse {
    fn from(u: User) -> Self {
        Self {
            username: u.username,
            currency_code: u.currency_code,
            currency_symbol: u.currency_symbol,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    pub currency_code: String,
    #[serde(default)]
    pub currency_symbol: Option<String>,
}

/// Full replacement set of custom prices, keyed by coffee type.
#[derive(Debug, Deserialize)]
pub struct UpdatePricesRequest {
    pub prices: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoffeePriceView {
    pub coffee_type: String,
    pub price: f64,
    pub default_price: f64,
    pub custom: bool,
}
