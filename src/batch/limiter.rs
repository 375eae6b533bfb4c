// src/batch/limiter.rs
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use metrics::gauge;
use tokio::sync::Semaphore;

/// Gate admitting at most `limit` tasks at once. Waiters are served FIFO
/// (tokio's semaphore is fair). No priority, cancellation or timeout.
#[derive(Clone, Debug)]
pub struct ConcurrencyLimiter {
    permits: Arc<Semaphore>,
    limit: usize,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

/// Decrements the active count when dropped, so panics and early returns
/// inside the task still free the slot.
struct ActiveGuard<'a> {
    active: &'a AtomicUsize,
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        let now = self.active.fetch_sub(1, Ordering::SeqCst) - 1;
        gauge!("enrich_in_flight").set(now as f64);
    }
}

impl ConcurrencyLimiter {
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            permits: Arc::new(Semaphore::new(limit)),
            limit,
            active: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Tasks currently holding a slot.
    pub fn in_flight(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Highest `in_flight` value observed so far.
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Wait for a slot, run `fut`, release the slot on every exit path.
    pub async fn run<F, T>(&self, fut: F) -> T
    where
        F: Future<Output = T>,
    {
        // The semaphore is never closed, so acquire cannot fail.
        let _permit = self.permits.acquire().await.ok();
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        gauge!("enrich_in_flight").set(now as f64);
        let _guard = ActiveGuard {
            active: &self.active,
        };
        fut.await
    }
}
