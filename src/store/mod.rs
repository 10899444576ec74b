//! Durable session storage.
//!
//! The store is the only shared mutable resource in the core. Everything is
//! read-modify-write against the external key-value service - never a
//! process-local cache that could diverge across replicas or restarts.

pub mod memory;
pub mod redis;

use async_trait::async_trait;
use chrono::Duration;

use crate::auth::session::Session;
use crate::error::Result;

pub use self::memory::MemorySessionStore;
pub use self::redis::RedisSessionStore;

/// Keyed persistent store holding one session record per user.
///
/// `put` always re-applies the full TTL (sliding expiry on every renewal);
/// `delete` is idempotent - deleting an absent key is not an error.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, user_key: &str) -> Result<Option<Session>>;
    async fn put(&self, session: &Session, ttl: Duration) -> Result<()>;
    async fn delete(&self, user_key: &str) -> Result<()>;
}
