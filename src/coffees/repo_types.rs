use serde::Serialize;
use sqlx::FromRow;
use time::{Date, OffsetDateTime, Time};
use uuid::Uuid;

/// One logged drink. `cost` is the price at the moment it was logged.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct CoffeeEntry {
    pub id: i64,
    pub user_id: Uuid,
    pub coffee_type: String,
    pub entry_date: Date,
    pub entry_time: Time,
    pub cost: f64,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewCoffeeEntry {
    pub user_id: Uuid,
    pub coffee_type: String,
    pub entry_date: Date,
    pub entry_time: Time,
    pub cost: f64,
}

/// Per-type group produced by the store for reports.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct TypeTotals {
    pub coffee_type: String,
    pub count: i64,
    pub total_cost: f64,
}
