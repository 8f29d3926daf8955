//! Bounded retry for provider HTTP calls
//!
//! Only transport-level failures are retried here: connect errors, timeouts,
//! HTTP 429 and HTTP 5xx. Anything the server answered deliberately (other
//! 4xx) is returned straight away, and the content of a successful response
//! is never inspected.

use crate::LlmError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Default number of retry attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay between attempts (doubled on every retry)
pub const DEFAULT_BASE_DELAY_MS: u64 = 1000;

/// How often, and how patiently, a request is re-sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Delay before the first retry
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Create a new retry policy
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Policy that retries without sleeping
    pub fn immediate(max_retries: u32) -> Self {
        Self::new(max_retries, Duration::ZERO)
    }

    /// Exponential backoff: base, 2x base, 4x base, ...
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_RETRIES,
            Duration::from_millis(DEFAULT_BASE_DELAY_MS),
        )
    }
}

/// Whether an HTTP status is worth retrying
pub(crate) fn is_transient_status(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Whether a transport error is worth retrying
fn is_transient_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request()
}

/// `Retry-After` header value in seconds, if present and numeric
fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Send an HTTP request, retrying transient failures per `policy`
///
/// `send` is called once per attempt and must issue the identical request
/// each time. Returns the first response with a 2xx status.
///
/// # Errors
///
/// - `LlmError::Api` for a non-transient HTTP status, or a 5xx on the last attempt
/// - `LlmError::RateLimitExceeded` when the last attempt was answered with 429
/// - `LlmError::Communication` for transport failures
pub(crate) async fn send_with_retry<F, Fut>(
    provider_name: &str,
    policy: &RetryPolicy,
    mut send: F,
) -> Result<reqwest::Response, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    let mut attempt = 0;

    loop {
        let (failure, delay) = match send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return Ok(response);
                }

                let delay = retry_after(&response).unwrap_or_else(|| policy.delay_for(attempt));
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());

                if !is_transient_status(status) {
                    return Err(LlmError::Api {
                        status: status.as_u16(),
                        body,
                    });
                }

                let failure = if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    LlmError::RateLimitExceeded
                } else {
                    LlmError::Api {
                        status: status.as_u16(),
                        body,
                    }
                };
                (failure, delay)
            }
            Err(e) if is_transient_error(&e) => (
                LlmError::Communication(format!("Request failed: {}", e)),
                policy.delay_for(attempt),
            ),
            Err(e) => {
                return Err(LlmError::Communication(format!("Request failed: {}", e)));
            }
        };

        if attempt >= policy.max_retries {
            return Err(failure);
        }

        attempt += 1;
        warn!(
            "{} request failed ({}), retrying in {}ms ({}/{})",
            provider_name,
            failure,
            delay.as_millis(),
            attempt,
            policy.max_retries
        );
        tokio::time::sleep(delay).await;
    }
}
