use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct UserCoffeePrice {
    pub user_id: Uuid,
    pub coffee_type: String,
    pub price: f64,
}
