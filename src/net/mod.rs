//! Network utilities for HTTP requests, rate limiting, and JSON extraction.
//!
//! This module provides the networking infrastructure for hakken:
//!
//! - **HTTP Client**: a global, configured HTTP client with connection pooling
//! - **Rate Limiting**: one process-wide dispatcher, keyed per provider, so
//!   every upstream call (sequential page loops and concurrent fan-outs
//!   alike) draws from the same budget
//! - **Retry Logic**: automatic retries with exponential backoff on 429s
//! - **JSON extraction**: dot-path helpers for deeply nested payloads
//!
//! # Examples
//!
//! ```rust
//! use hakken::net::HttpClient;
//!
//! # async fn example() -> hakken::Result<()> {
//! let client = HttpClient::new("jikan")
//!     .with_interval(1000)  // 1000ms between requests to this provider
//!     .with_max_retries(3);
//!
//! let json: serde_json::Value = client.get_json("https://api.jikan.moe/v4/anime/1").await?;
//! # Ok(())
//! # }
//! ```

use bytes::Bytes;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use reqwest::{Client, header::HeaderMap};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::time::{Duration, Instant};

pub mod json;

/// Global HTTP client instance with optimized configuration.
///
/// Configured with a 30-second timeout, connection pooling, compression
/// support, and a custom User-Agent. Created lazily on first use and reused
/// across all HTTP operations.
static CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent("hakken/0.1.0")
        .pool_max_idle_per_host(10)
        .gzip(true)
        .brotli(true)
        .build()
        .expect("Failed to build HTTP client")
});

/// The process-wide rate limiter shared by every [`HttpClient`].
///
/// Centralizing the limiter means a concurrent fan-out over one provider is
/// throttled exactly like a sequential loop would be; there is no way to
/// accidentally bypass a provider's budget by constructing a second client.
static LIMITER: Lazy<RateLimiter> = Lazy::new(|| RateLimiter::new(1000));

/// Returns the shared process-wide [`RateLimiter`].
pub fn limiter() -> &'static RateLimiter {
    &LIMITER
}

/// The shared pooled client, for modules that need bespoke status handling.
pub(crate) fn client() -> &'static Client {
    &CLIENT
}

/// Per-provider rate limiter enforcing a minimum interval between requests.
///
/// Tracks the last dispatch time for each provider key and sleeps callers
/// that arrive early. Thread-safe; safe to share across async tasks.
#[derive(Debug)]
pub struct RateLimiter {
    last_request: Mutex<HashMap<String, Instant>>,
    default_interval: Duration,
}

impl RateLimiter {
    /// Creates a new rate limiter with the specified default interval.
    pub fn new(interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(HashMap::new()),
            default_interval: Duration::from_millis(interval_ms),
        }
    }

    /// Waits if necessary before allowing a request for the given provider,
    /// using the limiter's default interval.
    pub async fn wait(&self, provider_id: &str) {
        self.wait_for(provider_id, self.default_interval).await;
    }

    /// Waits with a provider-specific interval.
    ///
    /// The reservation is taken before sleeping, so two tasks arriving
    /// together are serialized rather than both released at once.
    pub async fn wait_for(&self, provider_id: &str, interval: Duration) {
        let wait_duration = {
            let mut last_map = self.last_request.lock();
            let now = Instant::now();
            match last_map.get(provider_id) {
                Some(&last) => {
                    let next = last + interval;
                    let wait = next.saturating_duration_since(now);
                    last_map.insert(provider_id.to_string(), now + wait);
                    wait
                }
                None => {
                    last_map.insert(provider_id.to_string(), now);
                    Duration::ZERO
                }
            }
        };

        if !wait_duration.is_zero() {
            tokio::time::sleep(wait_duration).await;
        }
    }
}

/// HTTP client wrapper with built-in rate limiting and retry logic.
///
/// Each client is associated with a provider identifier; all requests it
/// makes are dispatched through the shared process-wide limiter under that
/// key. 429 responses are retried with exponential backoff; other HTTP
/// errors surface as [`Error::Provider`](crate::Error::Provider).
#[derive(Clone, Debug)]
pub struct HttpClient {
    provider_id: String,
    interval: Duration,
    max_retries: u32,
    headers: HeaderMap,
}

impl HttpClient {
    /// Creates a new HTTP client for the specified provider.
    ///
    /// Defaults: 1000ms minimum interval, 3 retries.
    pub fn new(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            interval: Duration::from_millis(1000),
            max_retries: 3,
            headers: HeaderMap::new(),
        }
    }

    /// Sets the minimum interval between requests for this provider.
    pub fn with_interval(mut self, interval_ms: u64) -> Self {
        self.interval = Duration::from_millis(interval_ms);
        self
    }

    /// Sets the maximum number of retries for failed requests.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Adds a header to all requests made by this client.
    ///
    /// Invalid header names or values are silently ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            name.parse::<reqwest::header::HeaderName>(),
            value.parse::<reqwest::header::HeaderValue>(),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// The provider identifier this client throttles under.
    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    /// Performs a GET request with rate limiting and retry logic.
    pub async fn get(&self, url: &str) -> crate::Result<Bytes> {
        self.send(|| CLIENT.get(url).headers(self.headers.clone()))
            .await
    }

    /// Performs a GET request and returns the response as a UTF-8 string.
    pub async fn get_text(&self, url: &str) -> crate::Result<String> {
        let bytes = self.get(url).await?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| crate::Error::parse(format!("Invalid UTF-8: {}", e)))
    }

    /// Performs a GET request and deserializes the response as JSON.
    pub async fn get_json<T>(&self, url: &str) -> crate::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let bytes = self.get(url).await?;
        serde_json::from_slice(&bytes).map_err(Into::into)
    }

    /// Performs a POST request with a JSON body and deserializes the
    /// JSON response.
    pub async fn post_json<T>(&self, url: &str, body: &Value) -> crate::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let bytes = self
            .send(|| CLIENT.post(url).headers(self.headers.clone()).json(body))
            .await?;
        serde_json::from_slice(&bytes).map_err(Into::into)
    }

    /// Executes a GraphQL query against `url` and deserializes the `data`
    /// payload.
    ///
    /// A populated `errors` array in the response surfaces as
    /// [`Error::Provider`](crate::Error::Provider) with the first error's
    /// message, matching how GraphQL endpoints report failures alongside a
    /// 200 status.
    pub async fn graphql<T>(&self, url: &str, query: &str, variables: Value) -> crate::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let body = json!({ "query": query, "variables": variables });
        let response: Value = self.post_json(url, &body).await?;

        if let Some(errors) = response.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                let message = errors[0]
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("GraphQL query failed");
                return Err(crate::Error::provider(&self.provider_id, message));
            }
        }

        let data = response
            .get("data")
            .cloned()
            .ok_or_else(|| crate::Error::parse("GraphQL response missing data field"))?;
        serde_json::from_value(data).map_err(Into::into)
    }

    /// Dispatches a request through the shared limiter, retrying on 429s
    /// and transport errors with exponential backoff.
    async fn send<F>(&self, build: F) -> crate::Result<Bytes>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut attempts = 0;

        loop {
            LIMITER.wait_for(&self.provider_id, self.interval).await;

            match build().send().await {
                Ok(response) => {
                    if response.status().is_success() {
                        return Ok(response.bytes().await?);
                    }

                    if response.status() == 429 {
                        if attempts < self.max_retries {
                            attempts += 1;
                            let delay = Duration::from_secs(2_u64.pow(attempts));
                            tracing::warn!(
                                provider = %self.provider_id,
                                attempt = attempts,
                                "rate limited, backing off for {:?}",
                                delay
                            );
                            tokio::time::sleep(delay).await;
                            continue;
                        }

                        let retry_after = response
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok());

                        return Err(crate::Error::rate_limit(retry_after));
                    }

                    if response.status() == 404 {
                        return Err(crate::Error::not_found(format!(
                            "{}: HTTP 404",
                            self.provider_id
                        )));
                    }

                    return Err(crate::Error::provider(
                        &self.provider_id,
                        format!("HTTP {}", response.status()),
                    ));
                }
                Err(e) => {
                    if attempts < self.max_retries {
                        attempts += 1;
                        tracing::warn!(
                            provider = %self.provider_id,
                            attempt = attempts,
                            "transport error, retrying: {}",
                            e
                        );
                        tokio::time::sleep(Duration::from_secs(1)).await;
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }
    }
}
