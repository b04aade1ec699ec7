pub mod advance;
pub mod config;
pub mod init;
pub mod lists;
pub mod stages;

use anyhow::Context;
use tagstep_core::{Config, Credentials, HttpListClient};

/// Build the HTTP client from config plus `MAILCHIMP_API_KEY` / `MAILCHIMP_DC`.
pub(crate) fn remote_client(config: &Config) -> anyhow::Result<HttpListClient> {
    let credentials = Credentials::from_env(&config.mailchimp)?;
    tracing::debug!(?credentials, "using credentials");
    HttpListClient::from_config(config, credentials).context("failed to create list client")
}
