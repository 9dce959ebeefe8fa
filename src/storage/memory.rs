use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use time::{Date, OffsetDateTime};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::Store;
use crate::auth::repo_types::{Session, User, DEFAULT_CURRENCY_CODE, DEFAULT_CURRENCY_SYMBOL};
use crate::coffees::repo_types::{CoffeeEntry, NewCoffeeEntry, TypeTotals};
use crate::settings::repo_types::UserCoffeePrice;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    sessions: HashMap<Uuid, Session>,
    prices: HashMap<Uuid, BTreeMap<String, f64>>,
    entries: Vec<CoffeeEntry>,
    next_entry_id: i64,
}

/// In-process store used by tests and `STORAGE_BACKEND=memory`.
/// All writes go through one lock.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&user_id).cloned())
    }

    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> anyhow::Result<Option<User>> {
        let mut t = self.tables.write().await;
        if t.users.values().any(|u| u.username == username) {
            return Ok(None);
        }
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            currency_code: DEFAULT_CURRENCY_CODE.to_string(),
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        t.users.insert(user.id, user.clone());
        Ok(Some(user))
    }

    async fn update_user_currency(
        &self,
        user_id: Uuid,
        currency_code: &str,
        currency_symbol: &str,
    ) -> anyhow::Result<Option<User>> {
        let mut t = self.tables.write().await;
        Ok(t.users.get_mut(&user_id).map(|u| {
            u.currency_code = currency_code.to_string();
            u.currency_symbol = currency_symbol.to_string();
            u.clone()
        }))
    }

    async fn create_session(&self, user_id: Uuid) -> anyhow::Result<Uuid> {
        let session = Session {
            id: Uuid::new_v4(),
            user_id,
            created_at: OffsetDateTime::now_utc(),
        };
        let id = session.id;
        self.tables.write().await.sessions.insert(id, session);
        Ok(id)
    }

    async fn is_session_active(&self, session_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let t = self.tables.read().await;
        Ok(t.sessions
            .get(&session_id)
            .is_some_and(|s| s.user_id == user_id))
    }

    async fn revoke_session(&self, session_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let mut t = self.tables.write().await;
        if !t.sessions.get(&session_id).is_some_and(|s| s.user_id == user_id) {
            return Ok(false);
        }
        t.sessions.remove(&session_id);
        Ok(true)
    }

    async fn list_prices(&self, user_id: Uuid) -> anyhow::Result<Vec<UserCoffeePrice>> {
        let t = self.tables.read().await;
        Ok(t.prices
            .get(&user_id)
            .map(|m| {
                m.iter()
                    .map(|(coffee_type, price)| UserCoffeePrice {
                        user_id,
                        coffee_type: coffee_type.clone(),
                        price: *price,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_price(&self, user_id: Uuid, coffee_type: &str) -> anyhow::Result<Option<f64>> {
        let t = self.tables.read().await;
        Ok(t.prices
            .get(&user_id)
            .and_then(|m| m.get(coffee_type))
            .copied())
    }

    async fn replace_prices(&self, user_id: Uuid, prices: &[(String, f64)]) -> anyhow::Result<()> {
        let set: BTreeMap<String, f64> = prices.iter().cloned().collect();
        let mut t = self.tables.write().await;
        if set.is_empty() {
            t.prices.remove(&user_id);
        } else {
            t.prices.insert(user_id, set);
        }
        Ok(())
    }

    async fn list_entries_for_date(
        &self,
        user_id: Uuid,
        date: Date,
    ) -> anyhow::Result<Vec<CoffeeEntry>> {
        let t = self.tables.read().await;
        let mut rows: Vec<CoffeeEntry> = t
            .entries
            .iter()
            .filter(|e| e.user_id == user_id && e.entry_date == date)
            .cloned()
            .collect();
        rows.sort_by_key(|e| (e.entry_time, e.id));
        Ok(rows)
    }

    async fn insert_entry(&self, entry: NewCoffeeEntry) -> anyhow::Result<CoffeeEntry> {
        let mut t = self.tables.write().await;
        t.next_entry_id += 1;
        let row = CoffeeEntry {
            id: t.next_entry_id,
            user_id: entry.user_id,
            coffee_type: entry.coffee_type,
            entry_date: entry.entry_date,
            entry_time: entry.entry_time,
            cost: entry.cost,
            created_at: OffsetDateTime::now_utc(),
        };
        t.entries.push(row.clone());
        Ok(row)
    }

    async fn clear_entries_for_date(&self, user_id: Uuid, date: Date) -> anyhow::Result<u64> {
        let mut t = self.tables.write().await;
        let before = t.entries.len();
        t.entries
            .retain(|e| !(e.user_id == user_id && e.entry_date == date));
        Ok((before - t.entries.len()) as u64)
    }

    async fn delete_entry(&self, user_id: Uuid, entry_id: i64) -> anyhow::Result<bool> {
        let mut t = self.tables.write().await;
        let before = t.entries.len();
        t.entries
            .retain(|e| !(e.id == entry_id && e.user_id == user_id));
        Ok(t.entries.len() < before)
    }

    async fn type_totals(
        &self,
        user_id: Uuid,
        from: Date,
        until: Date,
        coffee_type: Option<&str>,
    ) -> anyhow::Result<Vec<TypeTotals>> {
        let t = self.tables.read().await;
        let mut groups: BTreeMap<&str, (i64, f64)> = BTreeMap::new();
        for e in t.entries.iter().filter(|e| {
            e.user_id == user_id
                && e.entry_date >= from
                && e.entry_date < until
                && coffee_type.map_or(true, |ct| e.coffee_type == ct)
        }) {
            let g = groups.entry(e.coffee_type.as_str()).or_insert((0, 0.0));
            g.0 += 1;
            g.1 += e.cost;
        }
        Ok(groups
            .into_iter()
            .map(|(coffee_type, (count, total_cost))| TypeTotals {
                coffee_type: coffee_type.to_string(),
                count,
                total_cost,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, time};

    fn entry(user_id: Uuid, ty: &str, d: Date, t: time::Time, cost: f64) -> NewCoffeeEntry {
        NewCoffeeEntry {
            user_id,
            coffee_type: ty.into(),
            entry_date: d,
            entry_time: t,
            cost,
        }
    }

    #[tokio::test]
    async fn entries_come_back_ordered_by_time() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let day = date!(2024 - 03 - 01);
        store.insert_entry(entry(user, "Roma", day, time!(15:00), 0.5)).await.unwrap();
        store.insert_entry(entry(user, "Cosi", day, time!(8:30), 0.49)).await.unwrap();
        store.insert_entry(entry(user, "Vienna", day, time!(11:15), 0.54)).await.unwrap();

        let rows = store.list_entries_for_date(user, day).await.unwrap();
        let types: Vec<_> = rows.iter().map(|e| e.coffee_type.as_str()).collect();
        assert_eq!(types, vec!["Cosi", "Vienna", "Roma"]);
    }

    #[tokio::test]
    async fn clear_is_scoped_and_idempotent() {
        let store = MemoryStore::new();
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        let day = date!(2024 - 03 - 01);
        store.insert_entry(entry(me, "Roma", day, time!(9:00), 0.5)).await.unwrap();
        store.insert_entry(entry(me, "Roma", day, time!(10:00), 0.5)).await.unwrap();
        store.insert_entry(entry(other, "Roma", day, time!(9:00), 0.5)).await.unwrap();

        assert_eq!(store.clear_entries_for_date(me, day).await.unwrap(), 2);
        assert_eq!(store.clear_entries_for_date(me, day).await.unwrap(), 0);
        assert_eq!(store.list_entries_for_date(other, day).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_requires_owner() {
        let store = MemoryStore::new();
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        let row = store
            .insert_entry(entry(me, "Roma", date!(2024 - 03 - 01), time!(9:00), 0.5))
            .await
            .unwrap();

        assert!(!store.delete_entry(other, row.id).await.unwrap());
        assert!(store.delete_entry(me, row.id).await.unwrap());
        assert!(!store.delete_entry(me, row.id).await.unwrap());
    }

    #[tokio::test]
    async fn type_totals_respects_window_and_filter() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        store.insert_entry(entry(user, "Roma", date!(2024 - 03 - 01), time!(9:00), 0.5)).await.unwrap();
        store.insert_entry(entry(user, "Roma", date!(2024 - 03 - 31), time!(9:00), 0.5)).await.unwrap();
        store.insert_entry(entry(user, "Cosi", date!(2024 - 03 - 15), time!(9:00), 0.49)).await.unwrap();
        store.insert_entry(entry(user, "Roma", date!(2024 - 04 - 01), time!(9:00), 0.5)).await.unwrap();

        let all = store
            .type_totals(user, date!(2024 - 03 - 01), date!(2024 - 04 - 01), None)
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].coffee_type, "Cosi");
        assert_eq!(all[1].count, 2);

        let roma = store
            .type_totals(user, date!(2024 - 01 - 01), date!(2025 - 01 - 01), Some("Roma"))
            .await
            .unwrap();
        assert_eq!(roma.len(), 1);
        assert_eq!(roma[0].count, 3);
    }

    #[tokio::test]
    async fn sessions_revoke_once() {
        let store = MemoryStore::new();
        let user = store.create_user("ada", "hash").await.unwrap().unwrap();
        let sid = store.create_session(user.id).await.unwrap();

        assert!(store.is_session_active(sid, user.id).await.unwrap());
        assert!(!store.is_session_active(sid, Uuid::new_v4()).await.unwrap());
        assert!(store.revoke_session(sid, user.id).await.unwrap());
        assert!(!store.revoke_session(sid, user.id).await.unwrap());
        assert!(!store.is_session_active(sid, user.id).await.unwrap());
    }

    #[tokio::test]
    async fn logout_drops_the_session_row() {
        let store = MemoryStore::new();
        let user = store.create_user("ada", "hash").await.unwrap().unwrap();
        let kept = store.create_session(user.id).await.unwrap();
        for _ in 0..3 {
            let sid = store.create_session(user.id).await.unwrap();
            assert!(store.revoke_session(sid, user.id).await.unwrap());
        }

        // a stranger cannot end someone else's session
        assert!(!store.revoke_session(kept, Uuid::new_v4()).await.unwrap());

        let t = store.tables.read().await;
        assert_eq!(t.sessions.len(), 1);
        assert!(t.sessions.contains_key(&kept));
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let store = MemoryStore::new();
        assert!(store.create_user("ada", "h1").await.unwrap().is_some());
        assert!(store.create_user("ada", "h2").await.unwrap().is_none());
    }
}
