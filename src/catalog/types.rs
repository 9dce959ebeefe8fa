use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

/// A coffee type known to the tracker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoffeeType {
    pub name: String,
    pub default_cost: f64,
    pub volume_ml: i64,
}

impl CoffeeType {
    /// Price the user pays: their override, else the default.
    pub fn price_with(&self, overrides: &HashMap<String, f64>) -> f64 {
        overrides.get(&self.name).copied().unwrap_or(self.default_cost)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown coffee type: {0}")]
pub struct UnknownCoffeeType(pub String);

/// Read-only lookup table of coffee types, shared across requests.
#[derive(Debug, Clone)]
pub struct Catalog {
    types: Vec<CoffeeType>,
}

const BUILTIN: &[(&str, f64, i64)] = &[
    ("Chiaro", 0.55, 40),
    ("Cosi", 0.49, 40),
    ("Buenos Aires", 0.54, 90),
    ("Vienna", 0.54, 90),
    ("Roma", 0.50, 40),
    ("Arpeggio", 0.50, 40),
    ("Livanto", 0.50, 40),
    ("Volluto Decaf", 0.52, 90),
];

impl Catalog {
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN
                .iter()
                .map(|(name, cost, volume)| CoffeeType {
                    name: (*name).to_string(),
                    default_cost: *cost,
                    volume_ml: *volume,
                })
                .collect(),
        )
    }

    pub fn new(types: Vec<CoffeeType>) -> Self {
        Self { types }
    }

    /// Types in display order.
    pub fn iter(&self) -> impl Iterator<Item = &CoffeeType> {
        self.types.iter()
    }

    pub fn get(&self, name: &str) -> Option<&CoffeeType> {
        self.types.iter().find(|t| t.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn require(&self, name: &str) -> Result<&CoffeeType, UnknownCoffeeType> {
        self.get(name)
            .ok_or_else(|| UnknownCoffeeType(name.to_string()))
    }

    /// Volume in ml, `None` for names outside the catalog.
    pub fn volume_of(&self, name: &str) -> Option<i64> {
        self.get(name).map(|t| t.volume_ml)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}
