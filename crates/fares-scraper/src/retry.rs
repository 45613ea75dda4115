//! Exponential backoff around a single request.
//!
//! Retries only failures for which [`TransportFailure::is_retriable`] holds
//! (429, 5xx, timeouts, dropped connections). Everything else is returned on
//! the first attempt. With `max_retries = 0` the operation runs exactly once.

use std::future::Future;
use std::time::Duration;

use crate::failure::TransportFailure;

/// Runs `operation`, retrying transient failures.
///
/// The wait before retry `n` (1-based) is `backoff_base_secs * 2^(n-1)`
/// seconds:
///
/// | Attempt | Sleep before next attempt |
/// |---------|--------------------------|
/// | 0 (initial) | none |
/// | 1 (first retry) | base × 1 |
/// | 2 (second retry) | base × 2 |
/// | 3 (third retry) | base × 4 |
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, TransportFailure>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TransportFailure>>,
{
    let mut attempt = 0u32;

    loop {
        let last_err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retriable() || attempt >= max_retries => return Err(err),
            Err(err) => err,
        };

        let delay_secs = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
        tracing::warn!(
            attempt,
            max_retries,
            delay_secs,
            kind = %last_err.kind(),
            url = %last_err.url(),
            "transient request failure, retrying after backoff"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        attempt += 1;
    }
}
