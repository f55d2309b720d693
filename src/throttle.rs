//! Minimum-spacing gate for outgoing requests.
//!
//! A [`Throttle`] makes sure that two operations run through it start at least
//! `duration` apart. The first operation never waits. Later operations only
//! sleep for whatever part of `duration` has not already passed since the
//! previous operation started, so a slow request (or a caller that was busy
//! elsewhere) pays no extra delay.
//!
//! The marker is held behind an async mutex for the whole
//! "compare, sleep, run, record" sequence, so concurrent callers are served one
//! at a time and the spacing holds on a multi-threaded runtime too.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Spacing used when none is configured.
pub const DEFAULT_THROTTLE: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum ThrottleError {
    #[error("throttle duration must be a non-negative finite number of seconds, got {0}")]
    InvalidDuration(f64),
}

/// Enforces a minimum duration between the starts of guarded operations.
#[derive(Debug)]
pub struct Throttle {
    duration: Duration,
    /// Start of the most recent guarded operation. `None` until the first one
    /// runs, which behaves like a marker placed `duration` in the past.
    last_call: Mutex<Option<Instant>>,
}

impl Throttle {
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            last_call: Mutex::new(None),
        }
    }

    /// Create a throttle from a duration in (possibly fractional) seconds.
    ///
    /// # Errors
    ///
    /// Returns an error if `secs` is negative, NaN or infinite.
    pub fn from_secs_f64(secs: f64) -> Result<Self, ThrottleError> {
        Duration::try_from_secs_f64(secs)
            .map(Self::new)
            .map_err(|_| ThrottleError::InvalidDuration(secs))
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Run `op` once the spacing since the previous guarded operation has
    /// elapsed, and return its output.
    ///
    /// The marker is updated whether or not `op` succeeds, and also if the
    /// returned future is dropped while `op` is in flight: a request that was
    /// sent counts against the budget regardless of how it ended.
    pub async fn guard<F, Fut, T>(&self, op: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let mut last_call = self.last_call.lock().await;

        if let Some(previous) = *last_call {
            self.wait_after(previous).await;
        }

        let _mark = MarkOnDrop {
            slot: &mut *last_call,
            started: Instant::now(),
        };

        op().await
    }

    /// Compose `op` with this throttle, producing a function with the same
    /// input and output whose every call goes through [`Throttle::guard`].
    #[must_use]
    pub fn wrap<F>(self: &Arc<Self>, op: F) -> Throttled<F> {
        Throttled {
            throttle: Arc::clone(self),
            op,
        }
    }

    async fn wait_after(&self, previous: Instant) {
        // Loop rather than trust a single sleep to cover the full gap.
        loop {
            let elapsed = Instant::now().saturating_duration_since(previous);
            if elapsed >= self.duration {
                break;
            }
            let remaining = self.duration - elapsed;
            debug!(wait_ms = remaining.as_millis(), "Throttling request");
            sleep(remaining).await;
        }
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(DEFAULT_THROTTLE)
    }
}

struct MarkOnDrop<'a> {
    slot: &'a mut Option<Instant>,
    started: Instant,
}

impl Drop for MarkOnDrop<'_> {
    fn drop(&mut self) {
        *self.slot = Some(self.started);
    }
}

/// An operation bound to a shared [`Throttle`], built by [`Throttle::wrap`].
#[derive(Debug, Clone)]
pub struct Throttled<F> {
    throttle: Arc<Throttle>,
    op: F,
}

impl<F> Throttled<F> {
    /// Invoke the wrapped operation through the throttle.
    pub async fn call<A, Fut>(&self, arg: A) -> Fut::Output
    where
        F: Fn(A) -> Fut,
        Fut: Future,
    {
        self.throttle.guard(|| (self.op)(arg)).await
    }

    #[must_use]
    pub fn throttle(&self) -> &Arc<Throttle> {
        &self.throttle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const D: Duration = Duration::from_secs(2);

    /// Paused-clock sleeps land on millisecond ticks.
    fn assert_close(actual: Duration, expected: Duration) {
        assert!(
            actual >= expected && actual < expected + Duration::from_millis(5),
            "expected ~{expected:?}, got {actual:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_call_never_sleeps() {
        let throttle = Throttle::new(Duration::from_secs(60));
        let start = Instant::now();

        throttle.guard(|| async {}).await;

        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_to_back_calls_are_spaced() {
        let throttle = Throttle::new(D);
        let start = Instant::now();

        for _ in 0..5 {
            throttle.guard(|| async {}).await;
        }

        assert!(start.elapsed() >= D * 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_operation_needs_no_extra_wait() {
        let throttle = Throttle::new(D);

        throttle.guard(|| sleep(D)).await;

        let before_second = Instant::now();
        throttle.guard(|| async {}).await;
        assert_eq!(before_second.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_elapsed_time_is_credited() {
        let throttle = Throttle::new(D);

        throttle.guard(|| async {}).await;
        sleep(Duration::from_millis(500)).await;

        let before_second = Instant::now();
        throttle.guard(|| async {}).await;
        assert_close(before_second.elapsed(), Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_gap_longer_than_duration_skips_wait() {
        let throttle = Throttle::new(D);

        throttle.guard(|| async {}).await;
        sleep(D * 3).await;

        let before_second = Instant::now();
        throttle.guard(|| async {}).await;
        assert_eq!(before_second.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_call_still_consumes_slot() {
        let throttle = Throttle::new(D);

        let result: Result<(), &str> = throttle.guard(|| async { Err("boom") }).await;
        assert!(result.is_err());

        let before_second = Instant::now();
        throttle.guard(|| async {}).await;
        assert_close(before_second.elapsed(), D);
    }

    #[tokio::test(start_paused = true)]
    async fn test_guard_returns_operation_output() {
        let throttle = Throttle::default();
        let value = throttle.guard(|| async { 42 }).await;
        assert_eq!(value, 42);
        assert_eq!(throttle.duration(), DEFAULT_THROTTLE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrap_shares_budget_with_guard() {
        let throttle = Arc::new(Throttle::new(D));
        let double = throttle.wrap(|x: u32| async move { x * 2 });
        let start = Instant::now();

        assert_eq!(double.call(2).await, 4);
        throttle.guard(|| async {}).await;
        assert_eq!(double.call(5).await, 10);

        assert_close(start.elapsed(), D * 2);
        assert!(Arc::ptr_eq(double.throttle(), &throttle));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_are_serialized() {
        let throttle = Arc::new(Throttle::new(D));
        let starts = Arc::new(std::sync::Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for _ in 0..3 {
            let throttle = Arc::clone(&throttle);
            let starts = Arc::clone(&starts);
            handles.push(tokio::spawn(async move {
                throttle
                    .guard(|| async {
                        starts.lock().unwrap().push(Instant::now());
                    })
                    .await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let mut starts = starts.lock().unwrap().clone();
        starts.sort();
        assert_eq!(starts.len(), 3);
        for pair in starts.windows(2) {
            assert!(pair[1] - pair[0] >= D);
        }
    }

    #[test]
    fn test_from_secs_f64() {
        assert_eq!(
            Throttle::from_secs_f64(0.5).unwrap().duration(),
            Duration::from_millis(500)
        );
        assert_eq!(
            Throttle::from_secs_f64(0.0).unwrap().duration(),
            Duration::ZERO
        );
        assert!(Throttle::from_secs_f64(-1.0).is_err());
        assert!(Throttle::from_secs_f64(f64::NAN).is_err());
        assert!(Throttle::from_secs_f64(f64::INFINITY).is_err());
    }
}
