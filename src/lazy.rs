//! Lazy result model.
//!
//! Every externally visible measurement property of a device handler is
//! backed by a [`LazyCell`]: a tri-state deferred-evaluation holder. The
//! first read performs the wire operation and stores the outcome - a value or
//! an explicit absence - and every later read returns the cached outcome at
//! zero additional cost. Transitions are one-directional; there is no
//! invalidation.
//!
//! Query duration is an additive property tracked by a [`QueryMeter`]:
//! the duration of a composite result equals the sum of the wire operations
//! it lazily triggered, not wall-clock time, so re-reading an
//! already-evaluated value contributes nothing.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::error::Result;

/// Additive wire-time accumulator shared by all cells of one result graph.
///
/// The meter sums the elapsed time of every fetch it observes, including
/// faulted ones - the wire time was spent either way.
#[derive(Debug, Default)]
pub struct QueryMeter {
    nanos: AtomicU64,
}

impl QueryMeter {
    /// Create a meter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one wire operation's elapsed time.
    pub fn add(&self, elapsed: Duration) {
        self.nanos
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Total wire time recorded so far.
    pub fn total(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::Relaxed))
    }
}

/// Observable state of a [`LazyCell`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    /// Not yet queried.
    Pending,
    /// Queried, value present.
    Evaluated,
    /// Queried, device has no value for it ("not available").
    Absent,
}

enum Inner<T> {
    Pending,
    Value(T),
    Absent,
}

/// Tri-state lazy value holder.
///
/// The cell holds its lock across the fetch, so concurrent readers of the
/// same property trigger a single wire operation; late arrivals see the
/// cached outcome.
pub struct LazyCell<T> {
    inner: Mutex<Inner<T>>,
}

impl<T: Clone> Default for LazyCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for LazyCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("LazyCell")
    }
}

impl<T: Clone> LazyCell<T> {
    /// Create a cell in the not-yet-queried state.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::Pending),
        }
    }

    /// Read the cell, evaluating `fetch` on first access.
    ///
    /// `fetch` resolves to `Ok(Some(_))` for a value, `Ok(None)` for an
    /// explicit absence (capability unsupported, identifier unanswered), or
    /// `Err` for a transport fault. A fault propagates to the caller and
    /// leaves the cell pending, so a later read retries; the elapsed wire
    /// time is still metered.
    pub async fn get_or_eval<F, Fut>(&self, meter: &QueryMeter, fetch: F) -> Result<Option<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        let mut guard = self.inner.lock().await;
        match &*guard {
            Inner::Value(value) => Ok(Some(value.clone())),
            Inner::Absent => Ok(None),
            Inner::Pending => {
                let start = Instant::now();
                let outcome = fetch().await;
                meter.add(start.elapsed());
                match outcome {
                    Ok(Some(value)) => {
                        *guard = Inner::Value(value.clone());
                        Ok(Some(value))
                    }
                    Ok(None) => {
                        *guard = Inner::Absent;
                        Ok(None)
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }

    /// The cell's current state.
    pub async fn state(&self) -> CellState {
        match &*self.inner.lock().await {
            Inner::Pending => CellState::Pending,
            Inner::Value(_) => CellState::Evaluated,
            Inner::Absent => CellState::Absent,
        }
    }

    /// Cached outcome without evaluating: `None` while pending, otherwise
    /// `Some(outcome)`.
    pub async fn peek(&self) -> Option<Option<T>> {
        match &*self.inner.lock().await {
            Inner::Pending => None,
            Inner::Value(value) => Some(Some(value.clone())),
            Inner::Absent => Some(None),
        }
    }

    /// Transition a pending cell to Absent.
    ///
    /// This is what closing the owning session does to values that were
    /// never read: they become permanently "not available". Evaluated cells
    /// are untouched (transitions stay one-directional).
    pub async fn seal_absent(&self) {
        let mut guard = self.inner.lock().await;
        if matches!(&*guard, Inner::Pending) {
            *guard = Inner::Absent;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn first_read_evaluates_later_reads_hit_cache() {
        let cell = LazyCell::new();
        let meter = QueryMeter::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let got = cell
                .get_or_eval(&meter, || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok(Some(-61i32)) }
                })
                .await
                .unwrap();
            assert_eq!(got, Some(-61));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cell.state().await, CellState::Evaluated);
    }

    #[tokio::test]
    async fn absence_is_cached_not_retried() {
        let cell: LazyCell<i32> = LazyCell::new();
        let meter = QueryMeter::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let got = cell
                .get_or_eval(&meter, || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok(None) }
                })
                .await
                .unwrap();
            assert_eq!(got, None);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cell.state().await, CellState::Absent);
    }

    #[tokio::test]
    async fn fault_leaves_cell_pending() {
        let cell: LazyCell<i32> = LazyCell::new();
        let meter = QueryMeter::new();

        let err = cell
            .get_or_eval(&meter, || async {
                Err(Error::Timeout {
                    addr: "44.0.0.1".parse().unwrap(),
                    elapsed: Duration::from_secs(1),
                    retries: 0,
                }
                .boxed())
            })
            .await
            .unwrap_err();
        assert!(matches!(*err, Error::Timeout { .. }));
        assert_eq!(cell.state().await, CellState::Pending);

        // A later read may succeed.
        let got = cell
            .get_or_eval(&meter, || async { Ok(Some(7)) })
            .await
            .unwrap();
        assert_eq!(got, Some(7));
    }

    #[tokio::test]
    async fn meter_counts_first_read_only() {
        let cell = LazyCell::new();
        let meter = QueryMeter::new();

        cell.get_or_eval(&meter, || async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(Some(1u32))
        })
        .await
        .unwrap();
        let after_first = meter.total();
        assert!(after_first >= Duration::from_millis(20));

        cell.get_or_eval(&meter, || async { Ok(Some(2u32)) })
            .await
            .unwrap();
        assert_eq!(meter.total(), after_first, "re-read must add zero");
    }

    #[tokio::test]
    async fn seal_absent_only_touches_pending() {
        let pending: LazyCell<i32> = LazyCell::new();
        pending.seal_absent().await;
        assert_eq!(pending.state().await, CellState::Absent);

        let evaluated = LazyCell::new();
        let meter = QueryMeter::new();
        evaluated
            .get_or_eval(&meter, || async { Ok(Some(5)) })
            .await
            .unwrap();
        evaluated.seal_absent().await;
        assert_eq!(evaluated.state().await, CellState::Evaluated);
        assert_eq!(evaluated.peek().await, Some(Some(5)));
    }

    #[tokio::test]
    async fn meter_is_additive_across_cells() {
        let meter = QueryMeter::new();
        let a = LazyCell::new();
        let b = LazyCell::new();
        a.get_or_eval(&meter, || async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(Some(1))
        })
        .await
        .unwrap();
        b.get_or_eval(&meter, || async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(Some(2))
        })
        .await
        .unwrap();
        assert!(meter.total() >= Duration::from_millis(20));
    }
}
