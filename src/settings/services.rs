use std::collections::{BTreeMap, HashMap};

use super::{dto::CoffeePriceView, repo_types::UserCoffeePrice};
use crate::{catalog::Catalog, error::ApiError, reports::services::round_cents};

pub const MAX_PRICE: f64 = 1000.0;
const MAX_SYMBOL_CHARS: usize = 5;

const KNOWN_CURRENCIES: &[(&str, &str)] = &[
    ("EUR", "€"),
    ("USD", "$"),
    ("GBP", "£"),
    ("CHF", "CHF"),
    ("JPY", "¥"),
    ("CNY", "¥"),
    ("SEK", "kr"),
    ("NOK", "kr"),
    ("DKK", "kr"),
    ("PLN", "zł"),
    ("CZK", "Kč"),
    ("CAD", "$"),
    ("AUD", "$"),
    ("INR", "₹"),
    ("BRL", "R$"),
    ("TRY", "₺"),
    ("KRW", "₩"),
];

pub fn symbol_for(code: &str) -> Option<&'static str> {
    KNOWN_CURRENCIES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, s)| *s)
}

/// Validates a currency update, returning the normalized `(code, symbol)`.
pub fn validate_currency(
    code: &str,
    symbol: Option<&str>,
) -> Result<(String, String), ApiError> {
    let code = code.trim().to_ascii_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ApiError::validation(
            "Currency code must be 3 letters, e.g. EUR.",
        ));
    }

    let symbol = match symbol.map(str::trim) {
        Some(s) if !s.is_empty() => {
            if s.chars().count() > MAX_SYMBOL_CHARS {
                return Err(ApiError::validation(format!(
                    "Currency symbol must be at most {} characters.",
                    MAX_SYMBOL_CHARS
                )));
            }
            s.to_string()
        }
        _ => symbol_for(&code)
            .map(str::to_string)
            .ok_or_else(|| {
                ApiError::validation(format!("Currency symbol is required for {}.", code))
            })?,
    };

    Ok((code, symbol))
}

/// Checks every type and price of a replacement set.
pub fn validate_prices(
    prices: &BTreeMap<String, f64>,
    catalog: &Catalog,
) -> Result<Vec<(String, f64)>, ApiError> {
    prices
        .iter()
        .map(|(name, price)| -> Result<(String, f64), ApiError> {
            catalog.require(name)?;
            if !price.is_finite() || *price < 0.0 || *price > MAX_PRICE {
                return Err(ApiError::validation(format!(
                    "Invalid price for {}: must be between 0 and {}.",
                    name, MAX_PRICE
                )));
            }
            if !is_whole_cents(*price) {
                return Err(ApiError::validation(format!(
                    "Invalid price for {}: at most 2 decimal places.",
                    name
                )));
            }
            Ok((name.clone(), round_cents(*price)))
        })
        .collect()
}

fn is_whole_cents(price: f64) -> bool {
    let cents = price * 100.0;
    (cents - cents.round()).abs() < 1e-6
}

pub fn overrides_map(prices: Vec<UserCoffeePrice>) -> HashMap<String, f64> {
    prices
        .into_iter()
        .map(|p| (p.coffee_type, p.price))
        .collect()
}

/// One row per catalog type with the price the user currently pays.
pub fn price_views(catalog: &Catalog, overrides: &HashMap<String, f64>) -> Vec<CoffeePriceView> {
    catalog
        .iter()
        .map(|t| {
            CoffeePriceView {
                coffee_type: t.name.clone(),
                price: t.price_with(overrides),
                default_price: t.default_cost,
                custom: overrides.contains_key(&t.name),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_code_is_uppercased_and_symbol_derived() {
        let (code, symbol) = validate_currency(" usd ", None).unwrap();
        assert_eq!(code, "USD");
        assert_eq!(symbol, "$");
    }

    #[test]
    fn explicit_symbol_wins() {
        let (_, symbol) = validate_currency("EUR", Some("EUR")).unwrap();
        assert_eq!(symbol, "EUR");
    }

    #[test]
    fn unknown_code_needs_symbol() {
        let err = validate_currency("XYZ", None).unwrap_err();
        assert_eq!(err.to_string(), "Currency symbol is required for XYZ.");
        assert!(validate_currency("XYZ", Some("¤")).is_ok());
    }

    #[test]
    fn malformed_codes_are_rejected() {
        assert!(validate_currency("EURO", None).is_err());
        assert!(validate_currency("E1R", None).is_err());
        assert!(validate_currency("EUR", Some("toolong")).is_err());
    }

    #[test]
    fn prices_must_name_known_types_and_sane_values() {
        let catalog = Catalog::builtin();

        let mut ok = BTreeMap::new();
        ok.insert("Roma".to_string(), 0.6);
        assert_eq!(validate_prices(&ok, &catalog).unwrap(), vec![("Roma".to_string(), 0.6)]);

        let mut unknown = BTreeMap::new();
        unknown.insert("Mocha".to_string(), 0.6);
        assert_eq!(
            validate_prices(&unknown, &catalog).unwrap_err().to_string(),
            "Unknown coffee type: Mocha"
        );

        let mut negative = BTreeMap::new();
        negative.insert("Roma".to_string(), -1.0);
        assert!(validate_prices(&negative, &catalog).is_err());
    }

    #[test]
    fn prices_must_be_whole_cents() {
        let catalog = Catalog::builtin();

        let mut sub_cent = BTreeMap::new();
        sub_cent.insert("Roma".to_string(), 0.333);
        assert_eq!(
            validate_prices(&sub_cent, &catalog).unwrap_err().to_string(),
            "Invalid price for Roma: at most 2 decimal places."
        );

        let mut cents = BTreeMap::new();
        cents.insert("Cosi".to_string(), 0.1 + 0.2);
        cents.insert("Roma".to_string(), 1.0);
        assert_eq!(
            validate_prices(&cents, &catalog).unwrap(),
            vec![("Cosi".to_string(), 0.3), ("Roma".to_string(), 1.0)]
        );
    }

    #[test]
    fn price_views_flag_custom_rows() {
        let catalog = Catalog::builtin();
        let mut overrides = HashMap::new();
        overrides.insert("Cosi".to_string(), 0.6);

        let views = price_views(&catalog, &overrides);
        assert_eq!(views.len(), 8);
        let cosi = views.iter().find(|v| v.coffee_type == "Cosi").unwrap();
        assert!(cosi.custom);
        assert_eq!(cosi.price, 0.6);
        assert_eq!(cosi.default_price, 0.49);
        assert!(!views.iter().find(|v| v.coffee_type == "Roma").unwrap().custom);
    }
}
