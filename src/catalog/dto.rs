use serde::Serialize;

/// One row of `GET /api/coffee-types`, priced for the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoffeeTypeView {
    pub name: String,
    pub cost: f64,
    pub volume: i64,
    #[serde(rename = "currencySymbol")]
    pub currency_symbol: String,
}
