//! Session lifecycle orchestration: login, resume, logout.
//!
//! Anonymous -> Authenticating -> Active, back to Anonymous on logout or
//! terminal refresh failure. Every inbound interaction starts with `resume`;
//! handlers receive either an Active session or Anonymous and prompt for
//! login accordingly.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, warn};

use crate::api::credentials::CredentialExchange;
use crate::auth::role::Role;
use crate::auth::session::Session;
use crate::auth::tokens::TokenManager;
use crate::config::Config;
use crate::error::{CoreError, Result};
use crate::store::SessionStore;

/// Outcome of a session lookup.
#[derive(Debug)]
pub enum Resumed {
    /// Usable session; token staleness already handled.
    Active(Session),
    /// No session, or the session was terminally expired and deleted.
    Anonymous,
}

pub struct SessionLifecycle {
    store: Arc<dyn SessionStore>,
    credentials: Arc<dyn CredentialExchange>,
    tokens: Arc<TokenManager>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl SessionLifecycle {
    pub fn new(
        store: Arc<dyn SessionStore>,
        credentials: Arc<dyn CredentialExchange>,
        config: &Config,
    ) -> Self {
        let tokens = Arc::new(TokenManager::new(
            store.clone(),
            credentials.clone(),
            config.access_token_ttl,
            config.refresh_token_ttl,
        ));
        Self {
            store,
            credentials,
            tokens,
            access_ttl: config.access_token_ttl,
            refresh_ttl: config.refresh_token_ttl,
        }
    }

    /// The token manager, shared with the authenticated client.
    pub fn tokens(&self) -> Arc<TokenManager> {
        self.tokens.clone()
    }

    /// Exchange credentials and persist a fresh session.
    ///
    /// `InvalidCredentials` comes back as-is for the caller to re-prompt;
    /// `Transient` means the login may simply be retried.
    pub async fn login(&self, user_key: &str, login_id: &str, secret: &str) -> Result<Session> {
        let grant = self.credentials.exchange(login_id, secret).await?;

        let role: Role = grant.role.parse().map_err(|err| {
            warn!(user_key, role = %grant.role, "Login response carried unknown role");
            err
        })?;

        let now = Utc::now();
        let session = Session {
            user_key: user_key.to_string(),
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            role,
            full_name: grant.full_name,
            issued_at: now,
            access_expires_at: now + self.access_ttl,
            refresh_expires_at: now + self.refresh_ttl,
            pending: None,
        };

        self.store.put(&session, self.refresh_ttl).await?;
        info!(user_key, %role, "Login successful, session persisted");
        Ok(session)
    }

    /// Look up the caller's session, renewing stale tokens along the way.
    ///
    /// A terminally expired session comes back as `Anonymous` (already
    /// deleted), never as an error: re-login is the ordinary next step, not
    /// a failure. Transient store or renewal failures do propagate.
    pub async fn resume(&self, user_key: &str) -> Result<Resumed> {
        match self.store.get(user_key).await? {
            None => Ok(Resumed::Anonymous),
            Some(session) => match self.tokens.ensure_valid(session).await {
                Ok(session) => Ok(Resumed::Active(session)),
                Err(CoreError::SessionExpired) => Ok(Resumed::Anonymous),
                Err(err) => Err(err),
            },
        }
    }

    /// Delete the session. Idempotent: logging out twice is fine.
    pub async fn logout(&self, user_key: &str) -> Result<()> {
        self.store.delete(user_key).await?;
        info!(user_key, "Logged out");
        Ok(())
    }

    /// Persist updated multi-step flow state on an active session.
    pub async fn save_pending(&self, mut session: Session, pending: Option<serde_json::Value>) -> Result<Session> {
        session.pending = pending;
        self.store.put(&session, session.store_ttl()).await?;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::credentials::{Grant, Renewal};
    use crate::auth::permissions::{is_allowed, Operation, Resource};
    use crate::store::MemorySessionStore;
    use async_trait::async_trait;

    /// Scripted credential store for lifecycle tests.
    struct ScriptedExchange {
        login_outcome: LoginOutcome,
    }

    enum LoginOutcome {
        Grant(&'static str),
        Invalid,
        Transient,
    }

    #[async_trait]
    impl CredentialExchange for ScriptedExchange {
        async fn exchange(&self, _login_id: &str, _secret: &str) -> Result<Grant> {
            match self.login_outcome {
                LoginOutcome::Grant(role) => Ok(Grant {
                    access_token: "access-1".to_string(),
                    refresh_token: "refresh-1".to_string(),
                    role: role.to_string(),
                    full_name: Some("Test Employee".to_string()),
                }),
                LoginOutcome::Invalid => Err(CoreError::InvalidCredentials),
                LoginOutcome::Transient => Err(CoreError::Transient("gateway timeout".into())),
            }
        }

        async fn renew(&self, _refresh_token: &str) -> Result<Renewal> {
            Ok(Renewal {
                access_token: "access-2".to_string(),
                rotated_refresh_token: None,
            })
        }
    }

    fn lifecycle(outcome: LoginOutcome) -> (SessionLifecycle, Arc<MemorySessionStore>) {
        let store = Arc::new(MemorySessionStore::new());
        let credentials = Arc::new(ScriptedExchange {
            login_outcome: outcome,
        });
        let lc = SessionLifecycle::new(store.clone(), credentials, &Config::default());
        (lc, store)
    }

    #[tokio::test]
    async fn test_login_persists_session_with_backend_role() {
        let (lc, store) = lifecycle(LoginOutcome::Grant("mentor"));

        let session = lc.login("tg:7", "mentor@school.uz", "secret").await.unwrap();
        assert_eq!(session.role, Role::Mentor);
        assert!(!session.access_expired());

        let stored = store.get("tg:7").await.unwrap().unwrap();
        assert_eq!(stored.access_token, "access-1");
        assert_eq!(stored.full_name.as_deref(), Some("Test Employee"));

        // The mentor's menu per the access matrix
        assert!(is_allowed(session.role, Resource::Student, Operation::Read));
        assert!(!is_allowed(session.role, Resource::Student, Operation::Create));
    }

    #[tokio::test]
    async fn test_login_invalid_credentials_leaves_no_session() {
        let (lc, store) = lifecycle(LoginOutcome::Invalid);

        let err = lc.login("tg:7", "who@school.uz", "wrong").await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidCredentials));
        assert!(store.get("tg:7").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_transient_failure_is_retryable() {
        let (lc, _) = lifecycle(LoginOutcome::Transient);
        let err = lc.login("tg:7", "a@b.uz", "pw").await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_login_unknown_role_is_rejected() {
        let (lc, store) = lifecycle(LoginOutcome::Grant("superuser"));
        assert!(lc.login("tg:7", "a@b.uz", "pw").await.is_err());
        assert!(store.get("tg:7").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resume_unknown_user_is_anonymous() {
        let (lc, _) = lifecycle(LoginOutcome::Grant("mentor"));
        assert!(matches!(lc.resume("tg:404").await.unwrap(), Resumed::Anonymous));
    }

    #[tokio::test]
    async fn test_resume_active_session() {
        let (lc, _) = lifecycle(LoginOutcome::Grant("administrator"));
        lc.login("tg:7", "admin@school.uz", "pw").await.unwrap();

        match lc.resume("tg:7").await.unwrap() {
            Resumed::Active(session) => assert_eq!(session.role, Role::Administrator),
            Resumed::Anonymous => panic!("expected an active session"),
        }
    }

    #[tokio::test]
    async fn test_resume_after_refresh_expiry_is_anonymous_and_deletes() {
        let (lc, store) = lifecycle(LoginOutcome::Grant("director"));
        let mut session = lc.login("tg:7", "dir@school.uz", "pw").await.unwrap();

        // Simulate the refresh token aging out while the record still exists
        session.access_expires_at = Utc::now() - Duration::minutes(10);
        session.refresh_expires_at = Utc::now() - Duration::minutes(1);
        store.put(&session, Duration::days(1)).await.unwrap();

        assert!(matches!(lc.resume("tg:7").await.unwrap(), Resumed::Anonymous));
        // Deleted, not merely marked: a second resume stays anonymous
        assert!(store.get("tg:7").await.unwrap().is_none());
        assert!(matches!(lc.resume("tg:7").await.unwrap(), Resumed::Anonymous));
    }

    #[tokio::test]
    async fn test_resume_renews_stale_access_token() {
        let (lc, store) = lifecycle(LoginOutcome::Grant("accountant"));
        let mut session = lc.login("tg:7", "acc@school.uz", "pw").await.unwrap();

        session.access_expires_at = Utc::now() - Duration::minutes(10);
        store.put(&session, session.store_ttl()).await.unwrap();

        match lc.resume("tg:7").await.unwrap() {
            Resumed::Active(renewed) => {
                assert_eq!(renewed.access_token, "access-2");
                assert!(!renewed.access_expired());
            }
            Resumed::Anonymous => panic!("renewable session must stay active"),
        }
    }

    #[tokio::test]
    async fn test_logout_twice_is_idempotent() {
        let (lc, _) = lifecycle(LoginOutcome::Grant("assistant"));
        lc.login("tg:7", "asst@school.uz", "pw").await.unwrap();

        lc.logout("tg:7").await.unwrap();
        lc.logout("tg:7").await.unwrap();
        assert!(matches!(lc.resume("tg:7").await.unwrap(), Resumed::Anonymous));
    }

    #[tokio::test]
    async fn test_save_pending_round_trips_flow_state() {
        let (lc, store) = lifecycle(LoginOutcome::Grant("administrator"));
        let session = lc.login("tg:7", "admin@school.uz", "pw").await.unwrap();

        let flow = serde_json::json!({"flow": "create_group", "step": 1});
        lc.save_pending(session, Some(flow)).await.unwrap();

        let stored = store.get("tg:7").await.unwrap().unwrap();
        assert_eq!(stored.pending.unwrap()["flow"], "create_group");
    }
}
