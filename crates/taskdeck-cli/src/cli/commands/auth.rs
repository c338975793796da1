//! Session command handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use taskdeck_core::api::{ApiClient, session};
use taskdeck_core::config::{self, Config};
use taskdeck_core::credentials::{
    ACCESS_TOKEN_KEY, CredentialStore, FileCredentialStore, mask_token,
};

/// Builds an API client backed by the on-disk credential store.
pub fn build_client(config: &Config) -> Result<ApiClient> {
    let store = Arc::new(FileCredentialStore::new(config::paths::credentials_path()));
    ApiClient::new(config, store).context("build API client")
}

pub async fn login(config: &Config, username: &str, password: &str) -> Result<()> {
    let client = build_client(config)?;
    session::login(&client, username, password).await?;
    println!("Logged in as {username}.");
    Ok(())
}

pub async fn register(config: &Config, username: &str, email: &str, password: &str) -> Result<()> {
    let client = build_client(config)?;
    let registered = session::register(&client, username, email, password).await?;
    println!("{}", registered.message);
    println!("Log in with 'taskdeck login --username {username}'.");
    Ok(())
}

pub async fn logout(config: &Config) -> Result<()> {
    let client = build_client(config)?;
    session::logout(&client).await?;
    println!("Logged out.");
    Ok(())
}

/// Reports whether a session is active, the way the original page header
/// decided what to show: by consulting the credential store.
pub fn status() -> Result<()> {
    let store = FileCredentialStore::new(config::paths::credentials_path());
    match store.get(ACCESS_TOKEN_KEY) {
        Some(token) => println!("Session active ({}).", mask_token(&token)),
        None => println!("No active session. Run 'taskdeck login' to authenticate."),
    }
    Ok(())
}
