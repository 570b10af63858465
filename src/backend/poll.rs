//! Blocking retrieval emulated with an explicit retry loop.
//!
//! Every backend implements [`Queue::poll`](super::Queue::poll) through
//! [`poll_with`]: try a non-blocking `get`; when that reports
//! [`QueueError::Empty`] and the timeout is positive, wait for data for at most
//! the timeout and try again. With `retries > 0` the loop gives up after that
//! many attempts; with `retries == 0` it never gives up. A zero timeout makes
//! `poll` identical to `get`.
//!
//! The waiting step is supplied by the backend. It may hand back an item it
//! obtained while waiting (a blocking list pop) or `None` after a wake-up or a
//! timeout. A wake-up is only a hint: the loop calls `get` again and, if that
//! still finds nothing, keeps waiting for the rest of the attempt. An attempt
//! is spent only when its timeout has fully elapsed. Waiting only ever uses
//! tokio timers, so the loop runs under paused time in tests.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

use super::error::QueueError;
use super::traits::PollOptions;

/// Run the poll protocol with the given attempt and wait steps.
pub(crate) async fn poll_with<T, G, GFut, W, WFut>(
    options: PollOptions,
    mut get: G,
    mut wait: W,
) -> Result<T, QueueError>
where
    G: FnMut() -> GFut,
    GFut: Future<Output = Result<T, QueueError>>,
    W: FnMut(Duration) -> WFut,
    WFut: Future<Output = Result<Option<T>, QueueError>>,
{
    let bounded = options.retries != 0;
    let mut attempts_left = options.retries;
    let mut attempt: u64 = 0;

    loop {
        if bounded {
            if attempts_left == 0 {
                return Err(QueueError::Empty);
            }
            attempts_left -= 1;
        }
        attempt += 1;

        if let Some(item) = try_get(&mut get).await? {
            return Ok(item);
        }

        if options.timeout.is_zero() {
            return Err(QueueError::Empty);
        }

        let deadline = Instant::now() + options.timeout;
        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                break;
            }

            trace!(attempt, left = ?left, "poll waiting for data");
            if let Some(item) = wait(left).await? {
                return Ok(item);
            }
            if Instant::now() >= deadline {
                break;
            }

            // Woken early. The wake-up may be stale or already consumed by
            // another poller.
            if let Some(item) = try_get(&mut get).await? {
                return Ok(item);
            }
        }
    }
}

/// `get` with [`QueueError::Empty`] turned into `None`.
async fn try_get<T, G, GFut>(get: &mut G) -> Result<Option<T>, QueueError>
where
    G: FnMut() -> GFut,
    GFut: Future<Output = Result<T, QueueError>>,
{
    match get().await {
        Ok(item) => Ok(Some(item)),
        Err(QueueError::Empty) => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_bounded_retries_give_up_after_budget() {
        let gets = Arc::new(AtomicU32::new(0));
        let started = Instant::now();

        let result: Result<u32, _> = poll_with(
            PollOptions::new(Duration::from_secs(1), 2),
            || {
                let gets = gets.clone();
                async move {
                    gets.fetch_add(1, Ordering::SeqCst);
                    Err(QueueError::Empty)
                }
            },
            |timeout| async move {
                tokio::time::sleep(timeout).await;
                Ok(None)
            },
        )
        .await;

        assert!(matches!(result, Err(QueueError::Empty)));
        assert_eq!(gets.load(Ordering::SeqCst), 2);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(2) && elapsed < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_zero_timeout_never_waits() {
        let waits = Arc::new(AtomicU32::new(0));

        let result: Result<u32, _> = poll_with(
            PollOptions::new(Duration::ZERO, 0),
            || async { Err(QueueError::Empty) },
            |_| {
                let waits = waits.clone();
                async move {
                    waits.fetch_add(1, Ordering::SeqCst);
                    Ok(None)
                }
            },
        )
        .await;

        assert!(matches!(result, Err(QueueError::Empty)));
        assert_eq!(waits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_item_from_wait_step_is_returned() {
        let result = poll_with(
            PollOptions::wait(Duration::from_millis(10)),
            || async { Err(QueueError::Empty) },
            |_| async { Ok(Some("woken")) },
        )
        .await;
        assert_eq!(result.unwrap(), "woken");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_retries_until_item_appears() {
        let gets = Arc::new(AtomicU32::new(0));

        let result = poll_with(
            PollOptions::forever(Duration::from_millis(50)),
            || {
                let gets = gets.clone();
                async move {
                    if gets.fetch_add(1, Ordering::SeqCst) < 25 {
                        Err(QueueError::Empty)
                    } else {
                        Ok(99)
                    }
                }
            },
            |timeout| async move {
                tokio::time::sleep(timeout).await;
                Ok(None)
            },
        )
        .await;

        assert_eq!(result.unwrap(), 99);
        assert_eq!(gets.load(Ordering::SeqCst), 26);
    }

    #[tokio::test(start_paused = true)]
    async fn test_early_wake_without_data_keeps_waiting() {
        let gets = Arc::new(AtomicU32::new(0));
        let waits = Arc::new(AtomicU32::new(0));
        let started = Instant::now();

        let result: Result<u32, _> = poll_with(
            PollOptions::new(Duration::from_secs(1), 1),
            || {
                let gets = gets.clone();
                async move {
                    gets.fetch_add(1, Ordering::SeqCst);
                    Err(QueueError::Empty)
                }
            },
            |timeout| {
                let waits = waits.clone();
                async move {
                    // The first wait returns at once, like a leftover wake-up.
                    if waits.fetch_add(1, Ordering::SeqCst) > 0 {
                        tokio::time::sleep(timeout).await;
                    }
                    Ok(None)
                }
            },
        )
        .await;

        assert!(matches!(result, Err(QueueError::Empty)));
        assert_eq!(waits.load(Ordering::SeqCst), 2);
        assert_eq!(gets.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_early_wake_with_data_returns_item() {
        let gets = Arc::new(AtomicU32::new(0));

        let result = poll_with(
            PollOptions::new(Duration::from_secs(10), 1),
            || {
                let gets = gets.clone();
                async move {
                    if gets.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(QueueError::Empty)
                    } else {
                        Ok(7)
                    }
                }
            },
            |_| async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok(None)
            },
        )
        .await;

        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_other_errors_propagate() {
        let result: Result<u32, _> = poll_with(
            PollOptions::wait(Duration::from_secs(1)),
            || async { Err(QueueError::Unavailable("gone".into())) },
            |_| async { Ok(None) },
        )
        .await;
        assert!(matches!(result, Err(QueueError::Unavailable(_))));
    }
}
