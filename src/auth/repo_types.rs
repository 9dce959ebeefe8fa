use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,                     // unique user ID
    pub username: String,             // normalized, unique
    #[serde(skip_serializing)]
    pub password_hash: String,        // Argon2 hash, not exposed in JSON
    pub currency_code: String,        // e.g. EUR
    pub currency_symbol: String,      // e.g. €
    pub created_at: OffsetDateTime,   // creation timestamp
}

/// Server-side login session. Tokens carry its id; the row lives until logout.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
}

pub const DEFAULT_CURRENCY_CODE: &str = "EUR";
pub const DEFAULT_CURRENCY_SYMBOL: &str = "€";
