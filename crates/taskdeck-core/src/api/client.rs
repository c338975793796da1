//! Authenticated transport for the taskdeck services.
//!
//! Every protected call goes through [`ApiClient::send_authenticated`], which
//! attaches the stored bearer token, refreshes it once on 401, and retries
//! exactly once. Concurrent 401s collapse into a single refresh.

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::error::{ApiError, ApiErrorKind, ApiResult};
use super::request::ApiRequest;
use crate::config::Config;
use crate::credentials::{ACCESS_TOKEN_KEY, CredentialStore, REFRESH_TOKEN_KEY};

/// Token pair returned by the refresh endpoint.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    refresh_token: String,
}

/// HTTP client for the auth and task services.
pub struct ApiClient {
    http: reqwest::Client,
    store: Arc<dyn CredentialStore>,
    auth_url: String,
    tasks_url: String,
    /// Serializes refresh attempts so concurrent 401s issue one exchange.
    refresh_gate: tokio::sync::Mutex<()>,
}

impl ApiClient {
    /// Creates a client from the config's effective service URLs and the
    /// injected credential store.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &Config, store: Arc<dyn CredentialStore>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            store,
            auth_url: config.effective_auth_url(),
            tasks_url: config.effective_tasks_url(),
            refresh_gate: tokio::sync::Mutex::new(()),
        })
    }

    /// Base URL of the authentication service.
    pub fn auth_url(&self) -> &str {
        &self.auth_url
    }

    /// Base URL of the task service.
    pub fn tasks_url(&self) -> &str {
        &self.tasks_url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Performs a request against a protected resource, transparently
    /// handling an expired access token.
    ///
    /// The stored token is attached as `Authorization: Bearer <token>`
    /// (caller headers win on collision, except `Authorization`). A missing
    /// token is not pre-validated; the request goes out without the header
    /// and the server rejects it. On 401 the refresh protocol runs once; if
    /// it fails the call fails with `SessionExpired`, otherwise the request
    /// is rebuilt with the new token and issued exactly once more. That
    /// second result, 401 included, is returned as-is.
    ///
    /// Non-401 statuses are never interpreted here; that is the caller's job.
    ///
    /// # Errors
    /// Returns an error on transport failure or an unrecoverable session.
    pub async fn send_authenticated(&self, request: ApiRequest) -> ApiResult<reqwest::Response> {
        let access = self.store.get(ACCESS_TOKEN_KEY);
        let response = self.dispatch(&request, access.as_deref()).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!(url = %request.url, "access token rejected, attempting refresh");
        if !self.refresh_after(access.as_deref()).await {
            return Err(ApiError::session_expired());
        }

        let access = self.store.get(ACCESS_TOKEN_KEY);
        self.dispatch(&request, access.as_deref()).await
    }

    /// Exchanges the stored refresh token for a new credential pair.
    ///
    /// Returns `false` without a network call when no refresh token is
    /// stored. Any failure (non-2xx, transport, malformed body) also returns
    /// `false` and leaves the stored pair untouched; on success both tokens
    /// are overwritten.
    pub async fn refresh(&self) -> bool {
        let _guard = self.refresh_gate.lock().await;
        self.refresh_locked().await
    }

    /// Refresh path for a request that just saw a 401 with `observed_access`.
    /// If another caller already refreshed while we waited for the gate, the
    /// stored token differs from the observed one and no exchange is needed.
    async fn refresh_after(&self, observed_access: Option<&str>) -> bool {
        let _guard = self.refresh_gate.lock().await;
        if self.store.get(ACCESS_TOKEN_KEY).as_deref() != observed_access {
            debug!("token already refreshed by a concurrent caller");
            return true;
        }
        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> bool {
        let Some(refresh_token) = self.store.get(REFRESH_TOKEN_KEY) else {
            warn!("no refresh token stored, session cannot be renewed");
            return false;
        };

        let url = format!("{}/refresh", self.auth_url);
        let result = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "token refresh request failed");
                return false;
            }
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "token refresh rejected");
            return false;
        }

        let tokens: RefreshResponse = match response.json().await {
            Ok(tokens) => tokens,
            Err(err) => {
                warn!(error = %err, "could not parse token refresh response");
                return false;
            }
        };

        if let Err(err) = self.store_token_pair(&tokens.access_token, &tokens.refresh_token) {
            warn!(error = %err, "could not persist refreshed tokens");
            return false;
        }

        debug!("access token refreshed");
        true
    }

    /// Persists a new credential pair. The refresh token goes first so that
    /// a failed second write still leaves a pair the next 401 can recover
    /// with.
    pub(crate) fn store_token_pair(&self, access: &str, refresh: &str) -> Result<()> {
        self.store.set(REFRESH_TOKEN_KEY, refresh)?;
        self.store.set(ACCESS_TOKEN_KEY, access)?;
        Ok(())
    }

    /// Removes both stored tokens.
    ///
    /// # Errors
    /// Returns an error if the store cannot be persisted.
    pub fn clear_credentials(&self) -> Result<()> {
        self.store.remove(ACCESS_TOKEN_KEY)?;
        self.store.remove(REFRESH_TOKEN_KEY)?;
        Ok(())
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        access: Option<&str>,
    ) -> ApiResult<reqwest::Response> {
        let mut headers = request.headers.clone();
        headers.remove(AUTHORIZATION);
        if let Some(token) = access {
            let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                ApiError::new(
                    ApiErrorKind::Parse,
                    "Stored access token is not a valid header value",
                )
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        let mut builder = self
            .http
            .request(request.method.clone(), &request.url)
            .headers(headers);
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        builder.send().await.map_err(|err| ApiError::transport(&err))
    }
}

/// Maps an unsuccessful status to an error and parses a 2xx body as JSON.
///
/// # Errors
/// Returns `HttpStatus` for non-2xx responses and `Parse` for bodies that
/// do not match `T`.
pub async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::http_status(status.as_u16(), &body));
    }

    response
        .json::<T>()
        .await
        .map_err(|err| ApiError::parse("Failed to parse response body", &err))
}
