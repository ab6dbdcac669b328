use crate::domain::ports::JsonSource;
use crate::utils::error::{EtlError, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = concat!("page-ingest/", env!("CARGO_PKG_VERSION"));

/// How many times to re-send a failed request and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based): `backoff * 2^(attempt-1)`.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 5,
            backoff: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub retry: RetryPolicy,
    /// Sent with every request, overriding the default `User-Agent` when given.
    pub headers: HashMap<String, String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            headers: HashMap::new(),
        }
    }
}

/// Runs `attempt_fn` until it succeeds, fails with a non-retryable error, or
/// the retry budget is spent. Returns the last error on exhaustion.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    label: &str,
    mut attempt_fn: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;
    loop {
        match attempt_fn().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.retries && e.is_retryable() => {
                attempt += 1;
                let delay = policy.delay(attempt);
                tracing::warn!(
                    "{}: {} - retrying in {:.1}s ({}/{})",
                    label,
                    e,
                    delay.as_secs_f64(),
                    attempt,
                    policy.retries
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Blocking-free JSON GET client with transient-failure retries.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn new(settings: HttpSettings) -> Result<Self> {
        let client = Client::builder()
            .default_headers(merge_headers(&settings.headers)?)
            .timeout(settings.timeout)
            .build()?;

        Ok(Self {
            client,
            retry: settings.retry,
        })
    }

    async fn get_once(&self, url: &str) -> Result<Value> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            // The body is only diagnostic, so a failure to read it is not an error.
            let body = response.text().await.unwrap_or_default();
            tracing::error!("HTTP {} for {}. Body: {}", status.as_u16(), url, body);
            return Err(EtlError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            });
        }

        Ok(response.json::<Value>().await?)
    }
}

impl JsonSource for HttpClient {
    async fn get_json(&self, url: &str) -> Result<Value> {
        retry_with_backoff(self.retry, url, || self.get_once(url)).await
    }
}

fn merge_headers(extra: &HashMap<String, String>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));

    for (name, value) in extra {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| EtlError::ConfigError {
                message: format!("Invalid header name '{}': {}", name, e),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| EtlError::ConfigError {
            message: format!("Invalid value for header '{}': {}", name, e),
        })?;
        headers.insert(header_name, header_value);
    }

    Ok(headers)
}
