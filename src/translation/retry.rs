/*!
 * Retry with exponential backoff for provider calls.
 */

use std::future::Future;
use std::time::Duration;

use log::warn;

use crate::app_config::TranslationCommonConfig;
use crate::errors::ProviderError;

use super::clock::Clock;

/// How often and how patiently a provider call is attempted
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            multiplier: 2.0,
            max_delay: Duration::from_millis(10_000),
        }
    }
}

impl From<&TranslationCommonConfig> for RetryPolicy {
    fn from(common: &TranslationCommonConfig) -> Self {
        Self {
            max_attempts: common.retry_count.max(1),
            initial_delay: Duration::from_millis(common.retry_backoff_ms),
            multiplier: common.backoff_multiplier,
            max_delay: Duration::from_millis(common.max_backoff_ms),
        }
    }
}

impl RetryPolicy {
    /// Delay after the failed attempt number `attempt` (1-based):
    /// `min(initial * multiplier^(attempt - 1), max)`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let millis = self.initial_delay.as_millis() as f64 * self.multiplier.powi(exponent);
        let capped = millis.min(self.max_delay.as_millis() as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// runs out of attempts. The last error is returned when attempts run out.
pub async fn retry_with_backoff<F, Fut, T>(
    policy: &RetryPolicy,
    clock: &dyn Clock,
    label: &str,
    mut operation: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_retryable() || attempt >= policy.max_attempts => return Err(e),
            Err(e) => {
                let delay = policy.delay_for(attempt);
                warn!(
                    "{} failed (attempt {}/{}): {}. Retrying in {}ms",
                    label,
                    attempt,
                    policy.max_attempts,
                    e,
                    delay.as_millis()
                );
                clock.sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
