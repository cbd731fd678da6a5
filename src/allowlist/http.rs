//! allowlist::http
//!
//! Allowlist fetcher backed by an HTTP endpoint.
//!
//! # Retries
//!
//! A request is attempted `1 + retries` times. Only transient failures
//! (see [`AllowlistError::is_transient`]) are retried, sleeping
//! `retry_backoff * attempt` between attempts. The client is built once and
//! reused, so connections are pooled across refreshes.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};

use super::traits::{AllowlistEntry, AllowlistError, AllowlistFetcher};
use super::AllowlistSettings;

/// User-Agent header value for allowlist requests.
const USER_AGENT_VALUE: &str = concat!("regmirror/", env!("CARGO_PKG_VERSION"));

/// Longest body excerpt kept in a status error.
const MAX_ERROR_BODY: usize = 200;

/// Production allowlist fetcher.
#[derive(Debug, Clone)]
pub struct HttpAllowlistFetcher {
    client: Client,
    settings: AllowlistSettings,
}

impl HttpAllowlistFetcher {
    /// Build a fetcher with its own pooled client.
    ///
    /// # Errors
    ///
    /// Returns `AllowlistError::Network` if the TLS backend cannot be
    /// initialized.
    pub fn new(settings: AllowlistSettings) -> Result<Self, AllowlistError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(settings.timeout)
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| AllowlistError::Network(e.to_string()))?;

        Ok(Self { client, settings })
    }

    /// Endpoint this fetcher reads.
    pub fn url(&self) -> &str {
        &self.settings.url
    }

    async fn attempt(&self) -> Result<Vec<AllowlistEntry>, AllowlistError> {
        let response = self
            .client
            .get(&self.settings.url)
            .send()
            .await
            .map_err(map_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, response.text().await.unwrap_or_default()));
        }

        let body = response.bytes().await.map_err(map_transport)?;
        serde_json::from_slice(&body).map_err(|e| AllowlistError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl AllowlistFetcher for HttpAllowlistFetcher {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch(&self) -> Result<Vec<AllowlistEntry>, AllowlistError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.attempt().await {
                Ok(entries) => {
                    tracing::debug!(
                        url = %self.settings.url,
                        attempt,
                        entries = entries.len(),
                        "allowlist fetched"
                    );
                    return Ok(entries);
                }
                Err(err) if err.is_transient() && attempt <= self.settings.retries => {
                    let delay = self.settings.retry_backoff * attempt;
                    tracing::warn!(
                        url = %self.settings.url,
                        attempt,
                        error = %err,
                        "allowlist fetch failed, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn map_transport(err: reqwest::Error) -> AllowlistError {
    if err.is_timeout() {
        AllowlistError::Timeout
    } else if err.is_decode() {
        AllowlistError::Malformed(err.to_string())
    } else {
        AllowlistError::Network(err.to_string())
    }
}

fn status_error(status: StatusCode, body: String) -> AllowlistError {
    let mut message: String = body.chars().take(MAX_ERROR_BODY).collect();
    if message.is_empty() {
        message = status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string();
    }
    AllowlistError::Status {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_truncates_body() {
        let err = status_error(StatusCode::BAD_GATEWAY, "x".repeat(1000));
        match err {
            AllowlistError::Status { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message.len(), MAX_ERROR_BODY);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn status_error_falls_back_to_reason() {
        let err = status_error(StatusCode::NOT_FOUND, String::new());
        assert!(err.to_string().contains("Not Found"));
    }

    #[test]
    fn builds_with_defaults() {
        let fetcher = HttpAllowlistFetcher::new(AllowlistSettings::default()).unwrap();
        assert!(fetcher.url().starts_with("https://"));
        assert_eq!(fetcher.name(), "http");
    }
}
