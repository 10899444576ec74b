//! Token lifecycle: classification and renewal.
//!
//! A session is in exactly one of three states. Valid passes through,
//! expired-access triggers a renewal against the credential store, and
//! expired-refresh is terminal - the session is deleted and the user starts
//! over. Transient failures never tear a session down.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use crate::api::credentials::CredentialExchange;
use crate::auth::session::Session;
use crate::error::{CoreError, Result};
use crate::store::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// Access token unexpired
    Valid,
    /// Access token expired, refresh token still good
    ExpiredAccess,
    /// Refresh token expired - terminal
    ExpiredRefresh,
}

pub fn classify(session: &Session) -> TokenState {
    if session.refresh_expired() {
        TokenState::ExpiredRefresh
    } else if session.access_expired() {
        TokenState::ExpiredAccess
    } else {
        TokenState::Valid
    }
}

pub struct TokenManager {
    store: Arc<dyn SessionStore>,
    credentials: Arc<dyn CredentialExchange>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenManager {
    pub fn new(
        store: Arc<dyn SessionStore>,
        credentials: Arc<dyn CredentialExchange>,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            store,
            credentials,
            access_ttl,
            refresh_ttl,
        }
    }

    /// Return a session with a usable access token, renewing proactively
    /// when the token is inside its expiry buffer.
    pub async fn ensure_valid(&self, session: Session) -> Result<Session> {
        match classify(&session) {
            TokenState::ExpiredRefresh => {
                info!(user_key = %session.user_key, "Refresh token expired, tearing down session");
                self.store.delete(&session.user_key).await?;
                Err(CoreError::SessionExpired)
            }
            TokenState::Valid if !session.needs_renewal() => Ok(session),
            _ => self.renew(session).await,
        }
    }

    /// Exchange the refresh token for a new access token and persist the
    /// updated session with the full sliding TTL.
    ///
    /// Overlapping renewals for the same user are tolerated: when the
    /// backend rejects our refresh token but the store already holds a
    /// record with a different one, a racing renewal won and rotated it -
    /// we adopt that record instead of overwriting or deleting it.
    pub async fn renew(&self, session: Session) -> Result<Session> {
        if session.refresh_expired() {
            self.store.delete(&session.user_key).await?;
            return Err(CoreError::SessionExpired);
        }

        debug!(user_key = %session.user_key, "Renewing access token");
        match self.credentials.renew(&session.refresh_token).await {
            Ok(renewal) => {
                let now = Utc::now();
                let mut updated = session;
                updated.access_token = renewal.access_token;
                updated.access_expires_at = now + self.access_ttl;
                if let Some(rotated) = renewal.rotated_refresh_token {
                    // Rotation restarts the refresh lifetime
                    updated.refresh_token = rotated;
                    updated.refresh_expires_at = now + self.refresh_ttl;
                }
                self.store.put(&updated, updated.store_ttl()).await?;
                Ok(updated)
            }
            Err(CoreError::SessionExpired) => {
                if let Some(current) = self.store.get(&session.user_key).await? {
                    if current.refresh_token != session.refresh_token && !current.refresh_expired()
                    {
                        debug!(user_key = %current.user_key,
                               "Lost renewal race, adopting the rotated session");
                        return Ok(current);
                    }
                }
                warn!(user_key = %session.user_key, "Refresh token invalidated, deleting session");
                self.store.delete(&session.user_key).await?;
                Err(CoreError::SessionExpired)
            }
            // Transient failure: leave the session untouched so the user is
            // not forced into an unnecessary re-login
            Err(err) => Err(err),
        }
    }
}
