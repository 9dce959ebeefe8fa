use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use time::Date;
use uuid::Uuid;

use super::Store;
use crate::auth::repo_types::{User, DEFAULT_CURRENCY_CODE, DEFAULT_CURRENCY_SYMBOL};
use crate::coffees::repo_types::{CoffeeEntry, NewCoffeeEntry, TypeTotals};
use crate::settings::repo_types::UserCoffeePrice;

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { db })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, currency_code, currency_symbol, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await
        .context("find user by username")?;
        Ok(user)
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, currency_code, currency_symbol, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> anyhow::Result<Option<User>> {
        let res = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, password_hash, currency_code, currency_symbol)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, password_hash, currency_code, currency_symbol, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(password_hash)
        .bind(DEFAULT_CURRENCY_CODE)
        .bind(DEFAULT_CURRENCY_SYMBOL)
        .fetch_one(&self.db)
        .await;

        match res {
            Ok(user) => Ok(Some(user)),
            Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                Ok(None)
            }
            Err(e) => Err(e).context("insert user"),
        }
    }

    async fn update_user_currency(
        &self,
        user_id: Uuid,
        currency_code: &str,
        currency_symbol: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET currency_code = $2, currency_symbol = $3
             WHERE id = $1
            RETURNING id, username, password_hash, currency_code, currency_symbol, created_at
            "#,
        )
        .bind(user_id)
        .bind(currency_code)
        .bind(currency_symbol)
        .fetch_optional(&self.db)
        .await
        .context("update user currency")?;
        Ok(user)
    }

    async fn create_session(&self, user_id: Uuid) -> anyhow::Result<Uuid> {
        let session_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO user_sessions (id, user_id)
            VALUES ($1, $2)
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .execute(&self.db)
        .await
        .context("insert session")?;
        Ok(session_id)
    }

    async fn is_session_active(&self, session_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let active: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM user_sessions
                 WHERE id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_one(&self.db)
        .await
        .context("check session")?;
        Ok(active)
    }

    async fn revoke_session(&self, session_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            DELETE FROM user_sessions
             WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .execute(&self.db)
        .await
        .context("revoke session")?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_prices(&self, user_id: Uuid) -> anyhow::Result<Vec<UserCoffeePrice>> {
        let rows = sqlx::query_as::<_, UserCoffeePrice>(
            r#"
            SELECT user_id, coffee_type, price
              FROM user_coffee_prices
             WHERE user_id = $1
             ORDER BY coffee_type
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list prices")?;
        Ok(rows)
    }

    async fn find_price(&self, user_id: Uuid, coffee_type: &str) -> anyhow::Result<Option<f64>> {
        let price: Option<f64> = sqlx::query_scalar(
            r#"
            SELECT price
              FROM user_coffee_prices
             WHERE user_id = $1 AND coffee_type = $2
            "#,
        )
        .bind(user_id)
        .bind(coffee_type)
        .fetch_optional(&self.db)
        .await
        .context("find price")?;
        Ok(price)
    }

    async fn replace_prices(&self, user_id: Uuid, prices: &[(String, f64)]) -> anyhow::Result<()> {
        let mut tx = self.db.begin().await.context("begin tx")?;
        sqlx::query("DELETE FROM user_coffee_prices WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .context("delete prices")?;
        for (coffee_type, price) in prices {
            sqlx::query(
                r#"
                INSERT INTO user_coffee_prices (user_id, coffee_type, price)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(user_id)
            .bind(coffee_type)
            .bind(price)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("insert price for {}", coffee_type))?;
        }
        tx.commit().await.context("commit tx")?;
        Ok(())
    }

    async fn list_entries_for_date(
        &self,
        user_id: Uuid,
        date: Date,
    ) -> anyhow::Result<Vec<CoffeeEntry>> {
        let rows = sqlx::query_as::<_, CoffeeEntry>(
            r#"
            SELECT id, user_id, coffee_type, entry_date, entry_time, cost, created_at
              FROM coffee_entries
             WHERE user_id = $1 AND entry_date = $2
             ORDER BY entry_time ASC, id ASC
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_all(&self.db)
        .await
        .context("list entries for date")?;
        Ok(rows)
    }

    async fn insert_entry(&self, entry: NewCoffeeEntry) -> anyhow::Result<CoffeeEntry> {
        let row = sqlx::query_as::<_, CoffeeEntry>(
            r#"
            INSERT INTO coffee_entries (user_id, coffee_type, entry_date, entry_time, cost)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, coffee_type, entry_date, entry_time, cost, created_at
            "#,
        )
        .bind(entry.user_id)
        .bind(&entry.coffee_type)
        .bind(entry.entry_date)
        .bind(entry.entry_time)
        .bind(entry.cost)
        .fetch_one(&self.db)
        .await
        .context("insert entry")?;
        Ok(row)
    }

    async fn clear_entries_for_date(&self, user_id: Uuid, date: Date) -> anyhow::Result<u64> {
        let res = sqlx::query("DELETE FROM coffee_entries WHERE user_id = $1 AND entry_date = $2")
            .bind(user_id)
            .bind(date)
            .execute(&self.db)
            .await
            .context("clear entries for date")?;
        Ok(res.rows_affected())
    }

    async fn delete_entry(&self, user_id: Uuid, entry_id: i64) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM coffee_entries WHERE id = $1 AND user_id = $2")
            .bind(entry_id)
            .bind(user_id)
            .execute(&self.db)
            .await
            .context("delete entry")?;
        Ok(res.rows_affected() > 0)
    }

    async fn type_totals(
        &self,
        user_id: Uuid,
        from: Date,
        until: Date,
        coffee_type: Option<&str>,
    ) -> anyhow::Result<Vec<TypeTotals>> {
        // NULL $4 means no type filter
        let rows = sqlx::query_as::<_, TypeTotals>(
            r#"
            SELECT coffee_type,
                   COUNT(*)::BIGINT              AS count,
                   SUM(cost)::DOUBLE PRECISION   AS total_cost
              FROM coffee_entries
             WHERE user_id = $1
               AND entry_date >= $2 AND entry_date < $3
               AND ($4::TEXT IS NULL OR coffee_type = $4)
             GROUP BY coffee_type
             ORDER BY coffee_type
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(until)
        .bind(coffee_type)
        .fetch_all(&self.db)
        .await
        .context("aggregate entries by type")?;
        Ok(rows)
    }
}
