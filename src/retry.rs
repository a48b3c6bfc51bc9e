//! Exponential backoff for remote calls made by the sync worker.

use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts per drain cycle, including the first try.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled (capped) afterwards.
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Millisecond-scale delays so tests never sleep for real.
    pub fn instant() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        }
    }
}

/// Run `f` up to `config.max_attempts` times, sleeping between failures.
/// Returns the first success or the last error once attempts are exhausted.
pub async fn retry_with_backoff<F, Fut, T, E>(config: &RetryConfig, mut f: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Debug,
{
    let attempts = config.max_attempts.max(1);
    let mut delay = config.initial_delay;

    for attempt in 1..=attempts {
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                debug!(attempt, err = ?e, delay_ms = delay.as_millis(), "remote call failed, backing off");
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(config.max_delay);
            }
            Err(e) => return Err(e),
        }
    }
    unreachable!("attempts >= 1 guarantees the loop returns")
}
