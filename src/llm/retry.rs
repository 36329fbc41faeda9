//! Retrying POST for the local Ollama endpoint.
//!
//! `ollama serve` returns server errors while it loads a model into memory
//! and refuses connections for a moment when restarting. Both clear on
//! their own, so generation requests retry them with exponential backoff
//! instead of failing the whole analysis run. Client errors (unknown
//! model, malformed request) will not clear on their own and are reported
//! immediately.

use crate::app::config::LlmConfig;
use reqwest::{Client, Response};
use serde::Serialize;
use std::time::Duration;
use tracing::warn;

/// Backoff schedule for generation requests.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles after each failed attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            max_attempts: config.max_retries,
            ..Self::default()
        }
    }

    /// Delay after the zero-based `attempt`: 1s, 2s, 4s, ...
    ///
    /// The exponent is capped so a large `max_attempts` cannot overflow
    /// the shift.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << attempt.min(16))
    }
}

/// POST a JSON body to `url`, retrying transient failures.
///
/// Retries server errors (typically the model still loading) and network
/// timeouts or refused connections. Returns `None` once the attempts are
/// exhausted or on the first client error.
pub async fn post_with_retry<B: Serialize>(
    client: &Client,
    url: &str,
    body: &B,
    policy: &RetryPolicy,
    context: &str,
) -> Option<Response> {
    for attempt in 0..policy.max_attempts {
        match client.post(url).json(body).send().await {
            Ok(resp) if resp.status().is_success() => return Some(resp),
            Ok(resp) if resp.status().is_server_error() => {
                let delay = policy.delay_after(attempt);
                warn!(
                    "{}: server error ({}), retrying in {:?}",
                    context,
                    resp.status(),
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            Ok(resp) => {
                warn!("{}: non-retriable status ({})", context, resp.status());
                return None;
            }
            Err(e) if e.is_timeout() || e.is_connect() => {
                let delay = policy.delay_after(attempt);
                warn!("{}: network error ({}), retrying in {:?}", context, e, delay);
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                warn!("{}: request failed: {}", context, e);
                return None;
            }
        }
    }

    warn!(
        "{}: giving up after {} attempt(s)",
        context, policy.max_attempts
    );
    None
}
