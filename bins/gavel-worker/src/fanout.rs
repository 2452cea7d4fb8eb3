/// Concurrent Test Fan-out - Bounded Parallel Map
///
/// Runs one lightweight task per item with concurrency capped by a
/// semaphore, and returns results in input order: slot `i` of the output
/// always holds the result for item `i`, no matter when it completed.
/// Returns only after every item has finished; nothing is dropped and
/// nothing runs twice.
use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::Semaphore;

pub async fn bounded_map<T, R, F, Fut>(items: Vec<T>, limit: usize, f: F) -> Vec<R>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut + Clone + Send + 'static,
    Fut: std::future::Future<Output = R> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));

    let handles: Vec<_> = items
        .into_iter()
        .map(|item| {
            let semaphore = Arc::clone(&semaphore);
            let f = f.clone();
            tokio::spawn(async move {
                // The semaphore is never closed, so acquisition only fails
                // if the runtime is tearing down; run unguarded then.
                let _permit = semaphore.acquire_owned().await.ok();
                f(item).await
            })
        })
        .collect();

    // join_all preserves spawn order, which is input order.
    join_all(handles)
        .await
        .into_iter()
        .map(|joined| match joined {
            Ok(result) => result,
            // Worker tasks are never aborted, so a join error is a panic
            // in `f`; propagate it instead of inventing a result.
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_results_keep_input_order() {
        // Earlier items sleep longer, so completion order is reversed.
        let items: Vec<u64> = (0..10).collect();
        let results = bounded_map(items, 10, |i: u64| async move {
            tokio::time::sleep(Duration::from_millis((10 - i) * 10)).await;
            i * 2
        })
        .await;

        assert_eq!(results, (0..10).map(|i| i * 2).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_concurrency_never_exceeds_the_ceiling() {
        let running = Arc::new(AtomicUsize::new(0));
        let observed_max = Arc::new(AtomicUsize::new(0));

        let items: Vec<usize> = (0..200).collect();
        let (running_c, max_c) = (Arc::clone(&running), Arc::clone(&observed_max));
        let results = bounded_map(items, 50, move |i: usize| {
            let running = Arc::clone(&running_c);
            let observed_max = Arc::clone(&max_c);
            async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                observed_max.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                i
            }
        })
        .await;

        assert_eq!(results.len(), 200);
        assert!(observed_max.load(Ordering::SeqCst) <= 50);
        assert_eq!(running.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_every_item_is_mapped_exactly_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_c = Arc::clone(&calls);

        let results = bounded_map((0..37).collect::<Vec<i32>>(), 4, move |i: i32| {
            let calls = Arc::clone(&calls_c);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                i
            }
        })
        .await;

        assert_eq!(results, (0..37).collect::<Vec<_>>());
        assert_eq!(calls.load(Ordering::SeqCst), 37);
    }

    #[tokio::test]
    async fn test_zero_limit_still_makes_progress() {
        let results = bounded_map(vec![1, 2, 3], 0, |i: i32| async move { i }).await;
        assert_eq!(results, vec![1, 2, 3]);
    }
}
