//! Session lifecycle: login, registration, logout.
//!
//! Login stores the returned credential pair; logout notifies the server
//! best-effort and always clears the stored pair afterwards.

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, warn};

use super::client::ApiClient;
use super::error::{ApiError, ApiErrorKind, extract_detail};
use super::request::ApiRequest;

/// Token grant returned by the login endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Registration receipt.
#[derive(Debug, Clone, Deserialize)]
pub struct Registered {
    pub id: i64,
    pub message: String,
}

/// Logs in and stores the returned access/refresh pair.
///
/// # Errors
/// Surfaces the server's `detail` message verbatim on rejection, or a
/// generic fallback when the error body lacks one.
pub async fn login(client: &ApiClient, username: &str, password: &str) -> Result<()> {
    let url = format!("{}/login", client.auth_url());
    let response = client
        .http()
        .post(&url)
        .json(&serde_json::json!({ "username": username, "password": password }))
        .send()
        .await
        .map_err(|err| ApiError::transport(&err))?;

    if !response.status().is_success() {
        return Err(rejection(response, "Login failed").await.into());
    }

    let grant: TokenGrant = response
        .json()
        .await
        .map_err(|err| ApiError::parse("Failed to parse login response", &err))?;

    client
        .store_token_pair(&grant.access_token, &grant.refresh_token)
        .context("Failed to store session tokens")?;
    debug!(username, "logged in");
    Ok(())
}

/// Registers a new account. Does not log in.
///
/// # Errors
/// Surfaces the server's `detail` message verbatim on rejection.
pub async fn register(
    client: &ApiClient,
    username: &str,
    email: &str,
    password: &str,
) -> Result<Registered> {
    let url = format!("{}/register", client.auth_url());
    let response = client
        .http()
        .post(&url)
        .json(&serde_json::json!({
            "username": username,
            "email": email,
            "password": password,
        }))
        .send()
        .await
        .map_err(|err| ApiError::transport(&err))?;

    if !response.status().is_success() {
        return Err(rejection(response, "Registration failed").await.into());
    }

    let registered: Registered = response
        .json()
        .await
        .map_err(|err| ApiError::parse("Failed to parse registration response", &err))?;
    Ok(registered)
}

/// Ends the session: notifies the server, then clears both stored tokens.
///
/// The server call carries the current access token but is best-effort
/// notification only; local cleanup happens even when it is rejected or the
/// service is unreachable.
///
/// # Errors
/// Returns an error only if the credential store cannot be cleared.
pub async fn logout(client: &ApiClient) -> Result<()> {
    let request = ApiRequest::post(format!("{}/logout", client.auth_url()));
    match client.send_authenticated(request).await {
        Ok(response) if !response.status().is_success() => {
            warn!(status = %response.status(), "logout rejected by server");
        }
        Ok(_) => debug!("server session terminated"),
        Err(err) => warn!(error = %err, "logout request failed"),
    }

    client
        .clear_credentials()
        .context("Failed to clear stored credentials")
}

/// Builds an `HttpStatus` error carrying the server's `detail` message, or
/// the fallback when the body has none.
async fn rejection(response: reqwest::Response, fallback: &str) -> ApiError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = extract_detail(&body).unwrap_or_else(|| fallback.to_string());
    ApiError {
        kind: ApiErrorKind::HttpStatus,
        message,
        status: Some(status),
        details: (!body.is_empty()).then(|| body),
    }
}
