//! Exponential backoff for transient connectivity failures.
//!
//! The policy is an explicit value passed into [`retry_transient`] rather
//! than decorator state: the attempt counter lives inside one invocation and
//! resets every time a fresh top-level call is made.

use std::future::Future;
use std::time::Duration;

use tracing::error;

use crate::errors::SyncError;

/// Exponential backoff parameters: `delay = min(max_delay, start_delay * factor^attempt)`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub start_delay: Duration,
    /// Multiplier applied per attempt.
    pub factor: f64,
    /// Upper bound on the delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            start_delay: Duration::from_secs(1),
            factor: 2.0,
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// The delay for a given attempt, counted from zero.
    pub fn delay(&self, attempt: u32) -> Duration {
        let raw = self.start_delay.as_secs_f64() * self.factor.powi(attempt as i32);
        Duration::from_secs_f64(raw.min(self.max_delay.as_secs_f64()))
    }
}

/// Run `operation`, retrying indefinitely on transient failures with
/// exponential backoff. Fatal errors are returned unchanged on the first
/// occurrence; they are never retried.
///
/// The attempt counter is scoped to this call: a fresh invocation starts
/// back at attempt zero.
pub async fn retry_transient<T, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, SyncError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SyncError>>,
{
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() => {
                let delay = policy.delay(attempt);
                error!(
                    error = %e,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Transient failure, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt = attempt.saturating_add(1);
            }
            Err(e) => return Err(e),
        }
    }
}
