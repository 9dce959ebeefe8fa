//! Persistence seam. Handlers only see [`Store`]; the backend is picked at
//! startup from configuration.

use async_trait::async_trait;
use time::Date;
use uuid::Uuid;

use crate::auth::repo_types::User;
use crate::coffees::repo_types::{CoffeeEntry, NewCoffeeEntry, TypeTotals};
use crate::settings::repo_types::UserCoffeePrice;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Every method is scoped by the owning user's id where rows are user-owned.
#[async_trait]
pub trait Store: Send + Sync {
    // ---- users ----

    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;

    async fn find_user_by_id(&self, user_id: Uuid) -> anyhow::Result<Option<User>>;

    /// Returns `None` when the username is already taken.
    async fn create_user(&self, username: &str, password_hash: &str)
        -> anyhow::Result<Option<User>>;

    async fn update_user_currency(
        &self,
        user_id: Uuid,
        currency_code: &str,
        currency_symbol: &str,
    ) -> anyhow::Result<Option<User>>;

    // ---- sessions ----

    async fn create_session(&self, user_id: Uuid) -> anyhow::Result<Uuid>;

    async fn is_session_active(&self, session_id: Uuid, user_id: Uuid) -> anyhow::Result<bool>;

    /// Deletes the session row. Returns false if it was unknown or not the user's.
    async fn revoke_session(&self, session_id: Uuid, user_id: Uuid) -> anyhow::Result<bool>;

    // ---- custom prices ----

    async fn list_prices(&self, user_id: Uuid) -> anyhow::Result<Vec<UserCoffeePrice>>;

    async fn find_price(&self, user_id: Uuid, coffee_type: &str) -> anyhow::Result<Option<f64>>;

    /// Replaces the user's whole override set atomically.
    async fn replace_prices(&self, user_id: Uuid, prices: &[(String, f64)]) -> anyhow::Result<()>;

    // ---- entries ----

    /// Ordered by entry time, then id.
    async fn list_entries_for_date(&self, user_id: Uuid, date: Date)
        -> anyhow::Result<Vec<CoffeeEntry>>;

    async fn insert_entry(&self, entry: NewCoffeeEntry) -> anyhow::Result<CoffeeEntry>;

    async fn clear_entries_for_date(&self, user_id: Uuid, date: Date) -> anyhow::Result<u64>;

    /// False when the id does not exist or belongs to someone else.
    async fn delete_entry(&self, user_id: Uuid, entry_id: i64) -> anyhow::Result<bool>;

    /// Groups entries with `from <= entry_date < until` by type, ordered by
    /// type name. `coffee_type` narrows to a single type.
    async fn type_totals(
        &self,
        user_id: Uuid,
        from: Date,
        until: Date,
        coffee_type: Option<&str>,
    ) -> anyhow::Result<Vec<TypeTotals>>;
}
