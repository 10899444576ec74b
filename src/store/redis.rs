//! Redis-backed session store.
//!
//! Sessions are serialized to JSON and stored under `bot:session:{user_key}`
//! with an expiry equal to the remaining refresh-token lifetime. Redis
//! survives process restarts, so users stay logged in across deploys.

use async_trait::async_trait;
use chrono::Duration;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, warn};

use crate::auth::session::Session;
use crate::error::Result;
use crate::store::SessionStore;

/// Key namespace shared with the dashboard's session tooling
const KEY_PREFIX: &str = "bot:session:";

#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
}

impl RedisSessionStore {
    /// Connect to Redis. The connection manager reconnects on its own after
    /// network drops.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    fn key(user_key: &str) -> String {
        format!("{KEY_PREFIX}{user_key}")
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, user_key: &str) -> Result<Option<Session>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(Self::key(user_key)).await?;

        match raw {
            None => Ok(None),
            Some(json) => match serde_json::from_str::<Session>(&json) {
                Ok(session) => Ok(Some(session)),
                Err(err) => {
                    // A record we cannot parse is unusable; drop it so the
                    // user re-authenticates instead of looping on errors
                    warn!(user_key, %err, "Corrupt session record, deleting");
                    let _: () = conn.del(Self::key(user_key)).await?;
                    Ok(None)
                }
            },
        }
    }

    async fn put(&self, session: &Session, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(session).map_err(|err| {
            crate::error::CoreError::Config(format!("Session serialization failed: {err}"))
        })?;
        let ttl_secs = ttl.num_seconds().max(1) as u64;

        debug!(user_key = %session.user_key, ttl_secs, "Persisting session");
        let _: () = conn.set_ex(Self::key(&session.user_key), json, ttl_secs).await?;
        Ok(())
    }

    async fn delete(&self, user_key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        // DEL on a missing key is a no-op, which gives logout its idempotence
        let _: () = conn.del(Self::key(user_key)).await?;
        Ok(())
    }
}
