//! Dispatch metrics for observability
//!
//! Counters kept per asynchronous sink, useful for spotting a sink whose
//! queue keeps growing or whose deliveries keep failing.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for one asynchronous sink
///
/// # Example
///
/// ```
/// use rust_log_facade::DispatchMetrics;
///
/// let metrics = DispatchMetrics::new();
///
/// metrics.record_enqueued();
/// metrics.record_delivered();
///
/// assert_eq!(metrics.enqueued(), 1);
/// assert_eq!(metrics.delivered(), 1);
/// ```
#[derive(Debug)]
pub struct DispatchMetrics {
    /// Entries accepted onto the queue
    enqueued: AtomicU64,

    /// Entries the sink delivered successfully
    delivered: AtomicU64,

    /// Entries whose delivery returned an error
    failed: AtomicU64,

    /// Entries left behind or interrupted by an abort
    abandoned: AtomicU64,
}

impl DispatchMetrics {
    pub const fn new() -> Self {
        Self {
            enqueued: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            abandoned: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn abandoned(&self) -> u64 {
        self.abandoned.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_enqueued(&self) -> u64 {
        self.enqueued.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_delivered(&self) -> u64 {
        self.delivered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_failed(&self) -> u64 {
        self.failed.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_abandoned(&self, count: u64) -> u64 {
        self.abandoned.fetch_add(count, Ordering::Relaxed)
    }

    /// Failed deliveries as a percentage (0.0 - 100.0) of attempted ones
    pub fn failure_rate(&self) -> f64 {
        let failed = self.failed() as f64;
        let attempted = self.delivered() as f64 + failed;
        if attempted == 0.0 {
            0.0
        } else {
            (failed / attempted) * 100.0
        }
    }
}

impl Default for DispatchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for DispatchMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            enqueued: AtomicU64::new(self.enqueued()),
            delivered: AtomicU64::new(self.delivered()),
            failed: AtomicU64::new(self.failed()),
            abandoned: AtomicU64::new(self.abandoned()),
        }
    }
}
