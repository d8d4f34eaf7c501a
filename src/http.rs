//! Outbound HTTP capability used by every fetcher.
//!
//! The pipeline only needs `GET url?query` returning a status and a body, so
//! that is all [`HttpTransport`] exposes. Retries live in
//! [`RetryingTransport`], which wraps any transport with an explicit
//! [`RetryPolicy`].

use crate::config::RetryPolicy;
use crate::error::FetchError;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait::async_trait]
pub trait HttpTransport: Send + Sync + 'static {
    /// Issue a GET request. Non-2xx statuses are returned, not raised.
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<HttpResponse, FetchError>;
}

#[async_trait::async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for Arc<T> {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<HttpResponse, FetchError> {
        (**self).get(url, query).await
    }
}

/// [`HttpTransport`] backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("zone-scout/", env!("CARGO_PKG_VERSION")))
            .pool_max_idle_per_host(4)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<HttpResponse, FetchError> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| FetchError::Unavailable(format!("GET {url}: {e}")))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::Unavailable(format!("reading body of {url}: {e}")))?;

        Ok(HttpResponse { status, body })
    }
}

/// Retries transient statuses (rate limiting, server errors) with exponential backoff.
pub struct RetryingTransport<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T: HttpTransport> RetryingTransport<T> {
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait::async_trait]
impl<T: HttpTransport> HttpTransport for RetryingTransport<T> {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<HttpResponse, FetchError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let response = self.inner.get(url, query).await?;

            if response.is_success() {
                return Ok(response);
            }
            if !self.policy.is_retryable(response.status) {
                return Err(FetchError::HttpStatus {
                    status: response.status,
                    url: url.to_string(),
                });
            }
            if attempt == max_attempts {
                return Err(FetchError::Unavailable(format!(
                    "{url} still returning {} after {max_attempts} attempts",
                    response.status
                )));
            }

            let delay = self.policy.backoff(attempt);
            tracing::debug!(
                url,
                status = response.status,
                attempt,
                "Transient upstream failure, retrying in {:?}",
                delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
