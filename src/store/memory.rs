//! In-process session store for tests and local development.
//!
//! Honors TTLs the same way the Redis store does so lifecycle tests exercise
//! the real expiry behavior. Not durable - production uses Redis.

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Duration;
use tokio::sync::RwLock;

use crate::auth::session::Session;
use crate::error::Result;
use crate::store::SessionStore;

#[derive(Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, (Session, Instant)>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, user_key: &str) -> Result<Option<Session>> {
        let mut entries = self.entries.write().await;
        // Evict on read, matching the Redis store where expiry removes the key
        let expired =
            matches!(entries.get(user_key), Some((_, expires)) if *expires <= Instant::now());
        if expired {
            entries.remove(user_key);
            return Ok(None);
        }
        Ok(entries.get(user_key).map(|(session, _)| session.clone()))
    }

    async fn put(&self, session: &Session, ttl: Duration) -> Result<()> {
        let ttl = ttl.to_std().unwrap_or(std::time::Duration::ZERO);
        let mut entries = self.entries.write().await;
        entries.insert(
            session.user_key.clone(),
            (session.clone(), Instant::now() + ttl),
        );
        Ok(())
    }

    async fn delete(&self, user_key: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.remove(user_key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::role::Role;
    use chrono::Utc;

    fn session(user_key: &str) -> Session {
        let now = Utc::now();
        Session {
            user_key: user_key.to_string(),
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            role: Role::Mentor,
            full_name: None,
            issued_at: now,
            access_expires_at: now + Duration::minutes(30),
            refresh_expires_at: now + Duration::days(7),
            pending: None,
        }
    }

    #[tokio::test]
    async fn test_put_get_delete_round_trip() {
        let store = MemorySessionStore::new();
        let s = session("tg:1");

        store.put(&s, Duration::days(7)).await.unwrap();
        let loaded = store.get("tg:1").await.unwrap().unwrap();
        assert_eq!(loaded.role, Role::Mentor);

        store.delete("tg:1").await.unwrap();
        assert!(store.get("tg:1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemorySessionStore::new();
        store.delete("tg:absent").await.unwrap();
        store.delete("tg:absent").await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_ttl_hides_record() {
        let store = MemorySessionStore::new();
        let s = session("tg:2");
        store.put(&s, Duration::zero()).await.unwrap();
        assert!(store.get("tg:2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_evicted_on_read() {
        let store = MemorySessionStore::new();
        let s = session("tg:4");
        store.put(&s, Duration::zero()).await.unwrap();

        assert!(store.get("tg:4").await.unwrap().is_none());
        // The record is gone, not just hidden
        assert!(store.entries.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_put_replaces_existing_record() {
        let store = MemorySessionStore::new();
        let mut s = session("tg:3");
        store.put(&s, Duration::days(7)).await.unwrap();

        s.access_token = "rotated".to_string();
        store.put(&s, Duration::days(7)).await.unwrap();

        let loaded = store.get("tg:3").await.unwrap().unwrap();
        assert_eq!(loaded.access_token, "rotated");
    }
}
