pub mod error;
pub mod history;
pub mod prediction;
pub mod recommendation;

use anyhow::Context;
use std::time::Duration;

/// Outbound requests always carry a timeout; a hung upstream must not block
/// the page indefinitely.
pub(crate) fn http_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("failed to build http client")
}

pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    format!("{}{}", base_url.trim_end_matches('/'), path)
}
