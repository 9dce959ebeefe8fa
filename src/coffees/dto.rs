use serde::{Deserialize, Serialize};

use super::repo_types::CoffeeEntry;
use super::services::format_time;

/// Body of `POST /api/coffees/:date`.
#[derive(Debug, Deserialize)]
pub struct AddCoffeeRequest {
    #[serde(rename = "type")]
    pub coffee_type: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoffeeEntryResponse {
    pub id: i64,
    #[serde(rename = "type")]
    pub coffee_type: String,
    pub time: String,
    pub cost: f64,
}

impl From<CoffeeEntry> for CoffeeEntryResponse {
    fn from(e: CoffeeEntry) -> Self {
        Self {
            id: e.id,
            time: format_time(e.entry_time),
            coffee_type: e.coffee_type,
            cost: e.cost,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClearedResponse {
    pub message: String,
    pub deleted_count: u64,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub message: String,
    pub deleted_id: i64,
}
