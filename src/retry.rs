//! Fixed-budget retry for fallible asynchronous operations.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Runs `op`, retrying up to `budget` additional times with a fixed `delay`
/// between attempts.
///
/// Every error counts as retryable. On permanent failure the most recent
/// error is returned, after exactly `budget + 1` invocations.
pub async fn retry<T, E, F, Fut>(budget: u32, delay: Duration, op: F) -> Result<T, E>
where
    E: Display,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut remaining = budget;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if remaining > 0 => {
                warn!(error = %err, remaining, "operation failed, retrying");
                remaining -= 1;
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    const DELAY: Duration = Duration::from_millis(300);

    #[tokio::test(start_paused = true)]
    async fn test_permanent_failure_invokes_budget_plus_one_times() {
        let calls = AtomicU32::new(0);

        let result: Result<(), String> = retry(2, DELAY, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("deliberate failure".to_string()) }
        })
        .await;

        assert_eq!(result.unwrap_err(), "deliberate failure");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_success_returns_without_retrying() {
        let calls = AtomicU32::new(0);

        let result: Result<&str, String> = retry(5, DELAY, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok("result") }
        })
        .await;

        assert_eq!(result.unwrap(), "result");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_within_budget_stops_retrying() {
        let calls = AtomicU32::new(0);

        // Succeeds on the fourth attempt, within a budget of six.
        let result: Result<&str, String> = retry(6, DELAY, || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if attempt <= 3 {
                    Err("deliberate failure".to_string())
                } else {
                    Ok("result")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "result");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_between_attempts() {
        let start = tokio::time::Instant::now();

        let _: Result<(), String> = retry(2, DELAY, || async { Err("nope".to_string()) }).await;

        // Two retries, one delay before each.
        assert!(start.elapsed() >= DELAY * 2);
    }
}
