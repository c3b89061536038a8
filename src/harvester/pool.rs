//! Bounded worker pool
//!
//! Runs one task per input with at most `limit` in flight, sharing a single
//! semaphore. Results come back in submission order regardless of the order
//! tasks finish in.

use crate::HarvestError;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Runs `task` over every input with at most `limit` tasks concurrently
///
/// # Arguments
///
/// * `limit` - Maximum number of tasks in flight (at least 1)
/// * `inputs` - One task is spawned per input
/// * `task` - Builds the future for an input
///
/// # Returns
///
/// * `Ok(Vec<T>)` - One result per input, in input order
/// * `Err(HarvestError::TaskFailed)` - A task panicked or was cancelled
pub(crate) async fn run_bounded<I, T, F, Fut>(
    limit: usize,
    inputs: Vec<I>,
    task: F,
) -> Result<Vec<T>, HarvestError>
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(I) -> Fut,
    Fut: Future<Output = T> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let mut join_set = JoinSet::new();
    let mut slots: Vec<Option<T>> = Vec::with_capacity(inputs.len());

    for (index, input) in inputs.into_iter().enumerate() {
        slots.push(None);
        let semaphore = semaphore.clone();
        let future = task(input);

        join_set.spawn(async move {
            // The semaphore is never closed, so a permit is always granted
            let _permit = semaphore.acquire_owned().await.ok();
            (index, future.await)
        });
    }

    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, value)) => slots[index] = Some(value),
            Err(e) => {
                join_set.abort_all();
                return Err(HarvestError::TaskFailed(e.to_string()));
            }
        }
    }

    slots
        .into_iter()
        .map(|slot| slot.ok_or_else(|| HarvestError::TaskFailed("task produced no result".to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_results_follow_submission_order() {
        let inputs = vec![30u64, 1, 20, 5];

        let results = run_bounded(4, inputs, |delay| async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            delay
        })
        .await
        .unwrap();

        assert_eq!(results, vec![30, 1, 20, 5]);
    }

    #[tokio::test]
    async fn test_concurrency_never_exceeds_limit() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let results = run_bounded(2, (0..8).collect(), |i: u32| {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                i
            }
        })
        .await
        .unwrap();

        assert_eq!(results.len(), 8);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let results: Vec<u32> = run_bounded(3, Vec::<u32>::new(), |i| async move { i })
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_panicking_task_is_reported() {
        let result = run_bounded(2, vec![1u32, 2, 3], |i| async move {
            if i == 2 {
                panic!("worker blew up");
            }
            i
        })
        .await;

        assert!(matches!(result, Err(HarvestError::TaskFailed(_))));
    }
}
