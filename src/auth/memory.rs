//! In-process `UserStore` used by the engine and router tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::repo::{StoreError, UserStore, USER_SEQUENCE};
use super::repo_types::{NewUser, User};

#[derive(Default)]
pub struct InMemoryUserStore {
    counters: Mutex<HashMap<String, i64>>,
    users: Mutex<HashMap<i64, User>>,
    writes: AtomicUsize,
    failing: AtomicBool,
    read_delay: Mutex<Option<Duration>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with `StoreError::Unavailable` from now on.
    pub fn fail_all(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    /// Lookups sleep for `delay` before answering.
    pub fn delay_reads(&self, delay: Duration) {
        *self.read_delay.lock().unwrap() = Some(delay);
    }

    /// Number of `create` calls that reached the store.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Pretend the user counter is already at `value`.
    pub fn seed_counter(&self, value: i64) {
        self.counters
            .lock()
            .unwrap()
            .insert(USER_SEQUENCE.to_owned(), value);
    }

    pub fn insert_raw(&self, user: User) {
        self.users.lock().unwrap().insert(user.user_id, user);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    /// Sleeps after the lookup has been taken, so callers act on a stale snapshot.
    async fn stale_by(&self) {
        let delay = *self.read_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn next_id(&self, sequence: &str) -> Result<i64, StoreError> {
        self.check()?;
        let mut counters = self.counters.lock().unwrap();
        let next = counters.entry(sequence.to_owned()).or_insert(0);
        *next += 1;
        Ok(*next)
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let user_id = self.next_id(USER_SEQUENCE).await?;

        let mut users = self.users.lock().unwrap();
        if users.contains_key(&user_id) {
            return Err(StoreError::IdentifierCollision(user_id));
        }
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::EmailTaken);
        }
        let user = user.with_id(user_id);
        users.insert(user_id, user.clone());
        Ok(user)
    }

    async fn get_by_id(&self, user_id: i64) -> Result<Option<User>, StoreError> {
        self.check()?;
        let found = self.users.lock().unwrap().get(&user_id).cloned();
        self.stale_by().await;
        Ok(found)
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.check()?;
        let found = self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned();
        self.stale_by().await;
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Test".into(),
            email: email.into(),
            password: "secret-hash".into(),
            created_at: 1,
            updated_at: 1,
        }
    }

    #[tokio::test]
    async fn ids_start_at_one_and_increase() {
        let store = InMemoryUserStore::new();
        let a = store.create(new_user("a@a.com")).await.unwrap();
        let b = store.create(new_user("b@b.com")).await.unwrap();
        assert_eq!(a.user_id, 1);
        assert_eq!(b.user_id, 2);
    }

    #[tokio::test]
    async fn occupied_id_is_a_collision_not_an_overwrite() {
        let store = InMemoryUserStore::new();
        store.insert_raw(new_user("old@x.com").with_id(1));
        let err = store.create(new_user("new@x.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::IdentifierCollision(1)));
        let kept = store.get_by_id(1).await.unwrap().unwrap();
        assert_eq!(kept.email, "old@x.com");

        // the burned id is skipped, not reused
        let next = store.create(new_user("new@x.com")).await.unwrap();
        assert_eq!(next.user_id, 2);
    }

    #[tokio::test]
    async fn sequences_count_independently() {
        let store = InMemoryUserStore::new();
        assert_eq!(store.next_id("a").await.unwrap(), 1);
        assert_eq!(store.next_id("a").await.unwrap(), 2);
        assert_eq!(store.next_id("b").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn failed_store_allocates_nothing() {
        let store = InMemoryUserStore::new();
        store.fail_all();
        assert!(store.next_id(USER_SEQUENCE).await.is_err());
        assert!(store.counters.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn seeded_counter_continues_from_seed() {
        let store = InMemoryUserStore::new();
        store.seed_counter(41);
        let user = store.create(new_user("a@a.com")).await.unwrap();
        assert_eq!(user.user_id, 42);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn parallel_creates_get_distinct_ids() {
        let store = Arc::new(InMemoryUserStore::new());
        let handles: Vec<_> = (0..200)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.create(new_user(&format!("u{i}@x.com"))).await })
            })
            .collect();
        let mut ids = HashSet::new();
        for h in handles {
            let user = h.await.unwrap().unwrap();
            assert!(ids.insert(user.user_id));
        }
        assert_eq!(ids.len(), 200);
        assert_eq!(ids.iter().copied().max(), Some(200));
    }
}
