//! The persisted session record and its expiry predicates.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::role::Role;

/// Buffer before access-token expiry that triggers a proactive renewal,
/// so in-flight requests do not race the expiry instant.
const RENEWAL_BUFFER_MINUTES: i64 = 5;

/// One authenticated user's standing with the backend.
///
/// Stored as JSON in the session store under the user's opaque key and
/// mutated in place on every renewal. A session whose refresh token has
/// expired is terminal: it must be deleted, never resurrected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque per-user key derived from the chat identity. Store key.
    pub user_key: String,
    /// Short-lived bearer token attached to backend calls.
    pub access_token: String,
    /// Long-lived token used to mint new access tokens. Expiry is terminal.
    pub refresh_token: String,
    /// Role from the login response. Immutable for the session's lifetime.
    pub role: Role,
    /// Display name from the login response, for greetings and the profile
    /// screen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
    /// Transient state for multi-step input flows (e.g. a half-entered form).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<Value>,
}

impl Session {
    pub fn access_expired(&self) -> bool {
        Utc::now() > self.access_expires_at
    }

    pub fn refresh_expired(&self) -> bool {
        Utc::now() > self.refresh_expires_at
    }

    /// Whether the access token is expired or about to lapse.
    pub fn needs_renewal(&self) -> bool {
        Utc::now() > self.access_expires_at - Duration::minutes(RENEWAL_BUFFER_MINUTES)
    }

    /// Remaining refresh lifetime, used as the store TTL on every put so
    /// stale sessions self-expire.
    pub fn store_ttl(&self) -> Duration {
        (self.refresh_expires_at - Utc::now()).max(Duration::zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(access_offset_min: i64, refresh_offset_min: i64) -> Session {
        let now = Utc::now();
        Session {
            user_key: "tg:100".to_string(),
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            role: Role::Administrator,
            full_name: Some("Aziza Karimova".to_string()),
            issued_at: now,
            access_expires_at: now + Duration::minutes(access_offset_min),
            refresh_expires_at: now + Duration::minutes(refresh_offset_min),
            pending: None,
        }
    }

    #[test]
    fn test_fresh_session_is_valid() {
        let s = session(30, 7 * 24 * 60);
        assert!(!s.access_expired());
        assert!(!s.refresh_expired());
        assert!(!s.needs_renewal());
    }

    #[test]
    fn test_needs_renewal_inside_buffer() {
        // Access still valid for 3 minutes, inside the 5-minute buffer
        let s = session(3, 7 * 24 * 60);
        assert!(!s.access_expired());
        assert!(s.needs_renewal());
    }

    #[test]
    fn test_expired_access_valid_refresh() {
        let s = session(-10, 7 * 24 * 60);
        assert!(s.access_expired());
        assert!(s.needs_renewal());
        assert!(!s.refresh_expired());
    }

    #[test]
    fn test_expired_refresh_is_terminal() {
        let s = session(-10, -5);
        assert!(s.refresh_expired());
        assert_eq!(s.store_ttl(), Duration::zero());
    }

    #[test]
    fn test_serde_round_trip_preserves_pending_state() {
        let mut s = session(30, 60);
        s.pending = Some(serde_json::json!({"flow": "create_student", "step": 2}));
        let json = serde_json::to_string(&s).unwrap();
        let back: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(back.user_key, s.user_key);
        assert_eq!(back.role, Role::Administrator);
        assert_eq!(back.full_name.as_deref(), Some("Aziza Karimova"));
        assert_eq!(back.pending.unwrap()["step"], 2);
    }
}
