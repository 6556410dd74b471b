use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::warn;
use url::Url;

use crate::error::HttpError;

/// Retry behaviour for a [`PublicHttpClient`].
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts per request.
    pub retries: u32,
    /// Backoff before attempt `n` is `init_backoff * 2^(n-1)`.
    pub init_backoff: Duration,
    /// Per-attempt timeout.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            init_backoff: Duration::from_millis(250),
            timeout: Duration::from_secs(5),
        }
    }
}

/// HTTP client for unauthenticated exchange endpoints.
///
/// Transport failures (timeouts, connection drops, 5xx) are retried with
/// exponential backoff up to the policy's attempt limit. Client errors and
/// decode failures are returned unretried.
#[derive(Debug, Clone)]
pub struct PublicHttpClient {
    client: reqwest::Client,
    policy: RetryPolicy,
}

impl PublicHttpClient {
    /// Creates a client with the given retry policy.
    pub fn new(policy: RetryPolicy) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| HttpError::Network(format!("failed to create client: {e}")))?;
        Ok(Self { client, policy })
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// GET `url` and decode the JSON body, retrying per the policy.
    pub async fn get_json<T>(&self, url: &str) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let url = Url::parse(url).map_err(|e| HttpError::InvalidUrl(format!("{url}: {e}")))?;
        let attempts = self.policy.retries.max(1);
        let mut last_err = HttpError::Network("no attempts made".to_string());
        for attempt in 0..attempts {
            if attempt > 0 {
                let backoff = self.policy.init_backoff * 2u32.saturating_pow(attempt - 1);
                tokio::time::sleep(backoff).await;
            }
            match self.try_get(url.clone()).await {
                Ok(parsed) => return Ok(parsed),
                Err(err) if err.is_retryable() && attempt + 1 < attempts => {
                    warn!(%url, attempt, error = %err, "request failed, retrying");
                    last_err = err;
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_err)
    }

    async fn try_get<T>(&self, url: Url) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let response = self
            .client
            .get(url)
            .timeout(self.policy.timeout)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HttpError::Http {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = response.bytes().await?;
        serde_json::from_slice(bytes.as_ref())
            .map_err(|e| HttpError::Decode(format!("failed to decode JSON: {e}")))
    }
}
