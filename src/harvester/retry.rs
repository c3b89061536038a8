//! Fixed-delay retry for fallible async operations
//!
//! Every fetch in a harvest goes through [`with_retry`]: failures are logged,
//! retried after a fixed delay, and replaced by a fallback value once the
//! attempts run out. A single page or profile can therefore degrade
//! without aborting the batch it belongs to.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Attempt count and inter-attempt delay for one kind of operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first (at least 1)
    pub attempts: u32,

    /// Wait between consecutive attempts
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }
}

/// Runs `operation` until it succeeds or the policy's attempts are exhausted
///
/// The delay is applied between attempts only, never after the last one.
/// Errors are logged and swallowed; when every attempt fails `fallback` is
/// returned instead.
///
/// # Arguments
///
/// * `policy` - Attempt count and delay
/// * `label` - Human-readable name of the operation, used in log lines
/// * `fallback` - Value returned after the final failure
/// * `operation` - Produces a fresh future for every attempt
///
/// # Example
///
/// ```no_run
/// use agent_harvest::harvester::{with_retry, RetryPolicy};
/// use std::time::Duration;
///
/// # async fn example() {
/// let policy = RetryPolicy::new(3, Duration::from_secs(2));
/// let pages = with_retry(policy, "page bound", 1u32, || async {
///     Err::<u32, String>("proxy unavailable".to_string())
/// })
/// .await;
/// assert_eq!(pages, 1);
/// # }
/// ```
pub async fn with_retry<T, E, F, Fut>(
    policy: RetryPolicy,
    label: &str,
    fallback: T,
    mut operation: F,
) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let attempts = policy.attempts.max(1);

    for attempt in 1..=attempts {
        match operation().await {
            Ok(value) => return value,
            Err(e) => {
                tracing::warn!("Attempt {}/{} failed for {}: {}", attempt, attempts, label, e);

                if attempt < attempts {
                    tracing::debug!("Retrying {} in {:?}", label, policy.delay);
                    tokio::time::sleep(policy.delay).await;
                }
            }
        }
    }

    tracing::error!("All {} attempts failed for {}", attempts, label);
    fallback
}
