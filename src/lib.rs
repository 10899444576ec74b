//! Session and authorization core for the education-CRM chat bot.
//!
//! This crate is the layer between the chat transport and the backend REST
//! API. It owns:
//!
//! - persistent login sessions in Redis, surviving process restarts
//! - automatic access-token renewal with a bounded retry policy
//! - a centralized role/permission engine used both to build menus and to
//!   gate every handler before a call reaches the backend
//!
//! Menu rendering, pagination, and the transport itself live elsewhere and
//! call into this crate with an explicit user key - there is no ambient
//! "current user" state, so one process serves many users concurrently.
//!
//! Typical wiring:
//!
//! ```no_run
//! use std::sync::Arc;
//! use edubot_core::api::{AuthenticatedClient, HttpCredentialStore, ReqwestBackend};
//! use edubot_core::config::Config;
//! use edubot_core::lifecycle::SessionLifecycle;
//! use edubot_core::store::RedisSessionStore;
//!
//! # async fn wire() -> edubot_core::error::Result<()> {
//! let config = Config::from_env()?;
//! let store = Arc::new(RedisSessionStore::connect(&config.redis_url).await?);
//! let credentials = Arc::new(HttpCredentialStore::new(&config)?);
//! let lifecycle = SessionLifecycle::new(store, credentials, &config);
//! let backend = Arc::new(ReqwestBackend::new(&config)?);
//! let client = AuthenticatedClient::new(backend, lifecycle.tokens());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod store;

pub use auth::{ensure_allowed, is_allowed, Operation, Resource, Role, Session};
pub use error::{CoreError, Result};
pub use lifecycle::{Resumed, SessionLifecycle};

use std::io;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
/// Use the RUST_LOG env var to control log level (e.g. RUST_LOG=debug).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}
