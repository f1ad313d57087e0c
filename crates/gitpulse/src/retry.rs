//! Bounded retry with deterministic exponential backoff.
//!
//! Retries happen at exactly one place in the system: the scheduler's poll
//! cycle. Page fetches and pipeline stages propagate their errors unchanged,
//! so a failed cycle is re-attempted here instead of amplifying rate-limit
//! pressure with nested retries.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::shutdown::Shutdown;

/// Delay before retry attempt `attempt` (1-based): `2^(attempt-1) * base`.
///
/// Returns zero for `attempt == 0`. Saturates rather than overflowing for
/// absurdly large attempt counts.
pub fn backoff_delay(attempt: u32, base: Duration) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }
    base.saturating_mul(2u32.saturating_pow(attempt - 1))
}

/// Execute `operation` up to `max_attempts` times, sleeping the exponential
/// backoff between attempts.
///
/// Only errors for which `is_transient` returns true are retried; anything
/// else is returned immediately. The backoff sleep is abandoned (returning
/// the last error) when shutdown is requested, so a long backoff never delays
/// process exit.
pub async fn with_retry<T, E, F, Fut>(
    max_attempts: u32,
    initial_backoff: Duration,
    shutdown: &Shutdown,
    mut operation: F,
    is_transient: impl Fn(&E) -> bool,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                if attempt >= max_attempts.max(1) || !is_transient(&err) {
                    return Err(err);
                }

                let delay = backoff_delay(attempt, initial_backoff);
                tracing::warn!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "retrying after transient failure");

                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = shutdown.cancelled() => return Err(err),
                }
            }
        }
    }
}
