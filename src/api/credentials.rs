//! Credential exchange with the backend auth endpoints.
//!
//! Two calls: trade a login/password for a token pair at login, and trade a
//! refresh token for a fresh access token afterwards. Both classify failures
//! into the core taxonomy - invalid credentials and dead refresh tokens are
//! terminal, everything network-shaped is transient.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{CoreError, Result};

/// Successful login: both tokens plus the employee's role as the backend
/// reports it.
#[derive(Debug, Clone)]
pub struct Grant {
    pub access_token: String,
    pub refresh_token: String,
    pub role: String,
    pub full_name: Option<String>,
}

/// Successful renewal. The backend may rotate the refresh token; when it
/// does, the old one is dead and the rotated one must be persisted.
#[derive(Debug, Clone)]
pub struct Renewal {
    pub access_token: String,
    pub rotated_refresh_token: Option<String>,
}

/// The external credential store, as a seam so tests can inject fakes.
#[async_trait]
pub trait CredentialExchange: Send + Sync {
    /// Exchange login credentials for a token pair.
    ///
    /// Errors: `InvalidCredentials` on rejection, `Transient` on
    /// network/service failure.
    async fn exchange(&self, login_id: &str, secret: &str) -> Result<Grant>;

    /// Mint a new access token from a refresh token.
    ///
    /// Errors: `SessionExpired` when the refresh token is invalid or
    /// expired, `Transient` on network/service failure.
    async fn renew(&self, refresh_token: &str) -> Result<Renewal>;
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    data: LoginData,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    employee: EmployeeInfo,
    tokens: TokenPair,
}

#[derive(Debug, Deserialize)]
struct EmployeeInfo {
    role: String,
    full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenPair {
    access: String,
    refresh: String,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
    refresh: Option<String>,
}

/// HTTP implementation against the backend's auth endpoints.
/// Clone is cheap - reqwest::Client uses Arc internally.
#[derive(Clone)]
pub struct HttpCredentialStore {
    client: Client,
    base_url: String,
}

impl HttpCredentialStore {
    pub fn new(config: &Config) -> Result<Self> {
        // Builder failures (TLS setup and the like) are configuration
        // problems, not retryable transport errors
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| CoreError::Config(format!("HTTP client init failed: {err}")))?;
        Ok(Self {
            client,
            base_url: config.backend_base_url.clone(),
        })
    }
}

#[async_trait]
impl CredentialExchange for HttpCredentialStore {
    async fn exchange(&self, login_id: &str, secret: &str) -> Result<Grant> {
        let url = format!("{}/api/v1/auth/login/", self.base_url);
        debug!(login_id, "Exchanging credentials");

        let response = self
            .client
            .post(&url)
            .json(&json!({ "email": login_id, "password": secret }))
            .send()
            .await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                // Wrong password and unknown account look identical on purpose
                400 | 401 => CoreError::InvalidCredentials,
                _ => CoreError::from_status(status, &body),
            });
        }

        let login: LoginResponse = response
            .json()
            .await
            .map_err(|err| CoreError::Transient(format!("Malformed login response: {err}")))?;

        Ok(Grant {
            access_token: login.data.tokens.access,
            refresh_token: login.data.tokens.refresh,
            role: login.data.employee.role,
            full_name: login.data.employee.full_name,
        })
    }

    async fn renew(&self, refresh_token: &str) -> Result<Renewal> {
        let url = format!("{}/api/v1/auth/token/refresh/", self.base_url);
        debug!("Renewing access token");

        let response = self
            .client
            .post(&url)
            .json(&json!({ "refresh": refresh_token }))
            .send()
            .await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                400 | 401 => {
                    warn!("Refresh token rejected by backend");
                    CoreError::SessionExpired
                }
                _ => CoreError::from_status(status, &body),
            });
        }

        let refreshed: RefreshResponse = response
            .json()
            .await
            .map_err(|err| CoreError::Transient(format!("Malformed refresh response: {err}")))?;

        Ok(Renewal {
            access_token: refreshed.access,
            rotated_refresh_token: refreshed.refresh,
        })
    }
}
