use std::{future::Future, time::Duration};

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{Error, Result};

/// Outcome of a single status query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Poll<T> {
    Ready(T),
    Pending,
}

/// Queries a status at a fixed interval until it settles, the budget runs out
/// or the caller cancels.
#[derive(Debug, Clone, Copy)]
pub struct ConfirmationPoller {
    interval: Duration,
    timeout: Duration,
}

impl ConfirmationPoller {
    pub fn new(interval: Duration, timeout: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(Error::Other("poll interval must be non-zero".to_string()));
        }
        if interval > timeout {
            return Err(Error::Other(format!(
                "poll interval {} exceeds the timeout {}",
                humantime::format_duration(interval),
                humantime::format_duration(timeout)
            )));
        }

        Ok(Self { interval, timeout })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Upper bound on the number of queries a single [`Self::poll`] performs.
    pub fn max_queries(&self) -> u32 {
        let interval = self.interval.as_nanos();
        let queries = self.timeout.as_nanos().div_ceil(interval);
        u32::try_from(queries).unwrap_or(u32::MAX)
    }

    /// Sleeps one interval, or until the deadline if that comes first, before
    /// every query. Errors returned by `query` end the loop immediately.
    pub async fn poll<T, F, Fut>(&self, cancel: &CancellationToken, mut query: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Poll<T>>>,
    {
        let deadline = Instant::now() + self.timeout;

        for attempt in 1..=self.max_queries() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = tokio::time::sleep_until((Instant::now() + self.interval).min(deadline)) => {}
            }

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                outcome = tokio::time::timeout_at(deadline, query()) => outcome,
            };

            match outcome {
                Ok(Ok(Poll::Ready(value))) => return Ok(value),
                Ok(Ok(Poll::Pending)) if Instant::now() >= deadline => break,
                Ok(Ok(Poll::Pending)) => {
                    debug!("status query {attempt}/{} still pending", self.max_queries());
                }
                Ok(Err(e)) => return Err(e),
                Err(_) => break,
            }
        }

        Err(Error::Timeout(format!(
            "not confirmed within {}",
            humantime::format_duration(self.timeout)
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };

    use test_case::test_case;

    use super::*;

    #[test_case(1, 10 => 10; "exact division")]
    #[test_case(3, 10 => 4; "rounds up")]
    #[test_case(10, 10 => 1; "interval equals timeout")]
    fn query_bound_is_the_ceiling(interval_secs: u64, timeout_secs: u64) -> u32 {
        ConfirmationPoller::new(
            Duration::from_secs(interval_secs),
            Duration::from_secs(timeout_secs),
        )
        .unwrap()
        .max_queries()
    }

    #[test]
    fn rejects_degenerate_intervals() {
        assert!(ConfirmationPoller::new(Duration::ZERO, Duration::from_secs(1)).is_err());
        assert!(ConfirmationPoller::new(Duration::from_secs(2), Duration::from_secs(1)).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn returns_once_ready() {
        // given
        let poller = ConfirmationPoller::new(Duration::from_secs(1), Duration::from_secs(10)).unwrap();
        let queries = Arc::new(AtomicU32::new(0));

        // when
        let value = poller
            .poll(&CancellationToken::new(), || {
                let queries = Arc::clone(&queries);
                async move {
                    let n = queries.fetch_add(1, Ordering::SeqCst) + 1;
                    Ok(if n == 3 { Poll::Ready(n) } else { Poll::Pending })
                }
            })
            .await
            .unwrap();

        // then
        assert_eq!(value, 3);
        assert_eq!(queries.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_without_exceeding_the_query_bound() {
        // given
        let poller = ConfirmationPoller::new(Duration::from_secs(3), Duration::from_secs(10)).unwrap();
        let queries = Arc::new(AtomicU32::new(0));
        let started = Instant::now();

        // when
        let err = poller
            .poll(&CancellationToken::new(), || {
                let queries = Arc::clone(&queries);
                async move {
                    queries.fetch_add(1, Ordering::SeqCst);
                    Ok(Poll::<()>::Pending)
                }
            })
            .await
            .unwrap_err();

        // then
        assert!(matches!(err, Error::Timeout(_)));
        assert_eq!(queries.load(Ordering::SeqCst), 4);
        assert_eq!(started.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_query_is_cut_at_the_deadline() {
        // given
        let poller = ConfirmationPoller::new(Duration::from_secs(1), Duration::from_secs(5)).unwrap();
        let started = Instant::now();

        // when
        let err = poller
            .poll(&CancellationToken::new(), || async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(Poll::Ready(()))
            })
            .await
            .unwrap_err();

        // then
        assert!(matches!(err, Error::Timeout(_)));
        assert_eq!(started.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_the_sleep() {
        // given
        let poller = ConfirmationPoller::new(Duration::from_secs(60), Duration::from_secs(600)).unwrap();
        let cancel = CancellationToken::new();
        let queries = Arc::new(AtomicU32::new(0));

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            canceller.cancel();
        });

        // when
        let err = poller
            .poll(&cancel, || {
                let queries = Arc::clone(&queries);
                async move {
                    queries.fetch_add(1, Ordering::SeqCst);
                    Ok(Poll::<()>::Pending)
                }
            })
            .await
            .unwrap_err();

        // then
        assert!(matches!(err, Error::Cancelled));
        assert_eq!(queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn query_errors_end_the_loop() {
        let poller = ConfirmationPoller::new(Duration::from_secs(1), Duration::from_secs(10)).unwrap();

        let err = poller
            .poll(&CancellationToken::new(), || async {
                Err::<Poll<()>, _>(Error::PermanentBackendFailure("failed".to_string()))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::PermanentBackendFailure(_)));
    }
}
