use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Query string of the report endpoints. Kept as raw strings so bad input
/// is reported with our own messages.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub year: Option<String>,
    pub month: Option<String>,
    #[serde(rename = "type")]
    pub coffee_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeBreakdown {
    pub count: i64,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportResponse {
    pub year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<u8>,
    pub coffee_type_filter: String,
    pub total_coffees: i64,
    pub total_cost: f64,
    pub currency_symbol: String,
    pub breakdown_by_type: BTreeMap<String, TypeBreakdown>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeResponse {
    pub year: i32,
    pub total_volume_ml: i64,
}
