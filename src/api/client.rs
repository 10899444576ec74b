//! Authenticated client for the backend REST API.
//!
//! Every business call goes through [`AuthenticatedClient::execute`], which
//! attaches the session's bearer token and applies the renew-once-retry-once
//! recovery policy: a 401 triggers at most one token renewal and at most one
//! retry of the original request, tracked with explicit booleans rather than
//! recursion, so a persistently broken backend cannot trap a task in a loop.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::auth::session::Session;
use crate::auth::tokens::TokenManager;
use crate::config::Config;
use crate::error::{CoreError, Result};

/// Backoff before the single transient retry.
const TRANSIENT_RETRY_BACKOFF_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

/// One logical backend request, transport-agnostic.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Patch,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::Delete,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

/// Raw backend reply before classification.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Value,
}

/// Transport seam. Production uses [`ReqwestBackend`]; tests inject
/// fault-injected fakes.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn send(&self, request: &ApiRequest, bearer: &str) -> Result<HttpResponse>;
}

/// reqwest-based transport. Clone is cheap - the inner client shares its
/// connection pool.
#[derive(Clone)]
pub struct ReqwestBackend {
    client: Client,
    base_url: String,
}

impl ReqwestBackend {
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
impl Backend for ReqwestBackend {
    async fn send(&self, request: &ApiRequest, bearer: &str) -> Result<HttpResponse> {
        let path = request.path.trim_start_matches('/');
        let url = format!("{}/{}", self.base_url, path);

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Patch => self.client.patch(&url),
            Method::Delete => self.client.delete(&url),
        };
        builder = builder.bearer_auth(bearer);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();

        // DELETE commonly answers 204 with no body
        if status == 204 {
            return Ok(HttpResponse {
                status,
                body: json!({ "success": true }),
            });
        }

        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Ok(HttpResponse { status, body })
    }
}

/// Wraps a [`Backend`] with bearer attachment and bounded auth recovery.
pub struct AuthenticatedClient {
    backend: Arc<dyn Backend>,
    tokens: Arc<TokenManager>,
}

impl AuthenticatedClient {
    pub fn new(backend: Arc<dyn Backend>, tokens: Arc<TokenManager>) -> Self {
        Self { backend, tokens }
    }

    /// Execute one logical request on behalf of a session.
    ///
    /// Returns the response body together with the session, which may have
    /// been renewed along the way - callers thread it back into their flow.
    ///
    /// Recovery policy per request: at most one token renewal, at most one
    /// retry after renewal, at most one retry after a transient failure.
    /// Validation errors, not-found, and forbidden propagate untouched.
    pub async fn execute(&self, request: &ApiRequest, session: Session) -> Result<(Session, Value)> {
        // Every call consults the token state machine first: valid sessions
        // pass through untouched, a lapsing access token renews proactively,
        // and an expired refresh token is terminal before anything reaches
        // the backend - a live access token cannot outlast its session
        let mut session = self.tokens.ensure_valid(session).await?;

        let mut attempted_renewal = false;
        let mut attempted_transient_retry = false;

        loop {
            let outcome = self.backend.send(request, &session.access_token).await;

            let err = match outcome {
                Ok(response) if (200..300).contains(&response.status) => {
                    return Ok((session, response.body));
                }
                Ok(response) => {
                    let body = match &response.body {
                        Value::String(text) => text.clone(),
                        other => other.to_string(),
                    };
                    CoreError::from_status(response.status, &body)
                }
                Err(err) => err,
            };

            match err {
                CoreError::Unauthorized => {
                    if attempted_renewal {
                        // Renewed token rejected too: the session is beyond
                        // repair from here
                        warn!(user_key = %session.user_key,
                              "Backend rejected renewed token, forcing re-login");
                        return Err(CoreError::SessionExpired);
                    }
                    attempted_renewal = true;
                    debug!(path = %request.path, "Got 401, attempting token renewal");
                    session = self.tokens.renew(session).await?;
                }
                CoreError::Transient(reason) => {
                    if attempted_transient_retry {
                        return Err(CoreError::Transient(reason));
                    }
                    attempted_transient_retry = true;
                    debug!(path = %request.path, %reason, "Transient failure, retrying once");
                    tokio::time::sleep(std::time::Duration::from_millis(
                        TRANSIENT_RETRY_BACKOFF_MS,
                    ))
                    .await;
                }
                other => return Err(other),
            }
        }
    }
}
