//! Per-sink queue and background drain loop
//!
//! Every asynchronous sink gets one [`AsyncDispatcher`]: an unbounded
//! multi-producer queue that writers push onto without blocking, and a
//! single drain loop that pops entries in order and hands them to the sink.
//!
//! The loop polls: when the queue is empty it sleeps for the drain interval
//! (waking early on either signal) and looks again. Latency for an entry
//! written after an idle period is therefore bounded by the interval.
//!
//! ```text
//!  Idle --spawn--> Running --shutdown, queue non-empty--> Draining
//!                     |                                       |
//!                     +---- queue empty & shutdown, or abort --+--> Stopped
//! ```

use super::{
    async_sink::AsyncSink,
    error::{LoggerError, Result},
    log_entry::LogEntry,
    metrics::DispatchMetrics,
    signal::SignalListener,
};
use crossbeam_channel::{unbounded, Receiver, Sender};
use futures_util::FutureExt;
use parking_lot::Mutex;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{fence, AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Default pause between queue checks when the queue is empty (100 ms)
pub const DEFAULT_DRAIN_INTERVAL: Duration = Duration::from_millis(100);

/// Lifecycle of a drain loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrainState {
    /// Not started yet
    Idle,
    Running,
    /// Shutdown requested, queued entries still being delivered
    Draining,
    /// Terminal
    Stopped,
}

/// How a drain loop finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Shutdown was requested and the queue was emptied
    Drained,
    /// Abort fired; this many entries were still queued
    Aborted { pending_entries: usize },
}

/// Moves the state to `Stopped` however the loop exits, panics included,
/// so nobody waits forever on a dead loop.
struct StopGuard<'a>(&'a watch::Sender<DrainState>);

impl Drop for StopGuard<'_> {
    fn drop(&mut self) {
        self.0.send_replace(DrainState::Stopped);
    }
}

pub struct AsyncDispatcher {
    sink: Arc<dyn AsyncSink>,
    sender: Sender<LogEntry>,
    receiver: Receiver<LogEntry>,
    drain_interval: Duration,
    started: AtomicBool,
    claimed: AtomicBool,
    /// Set once a graceful drain has finished; later entries are swept
    closed: AtomicBool,
    state: watch::Sender<DrainState>,
    last_error: Mutex<Option<String>>,
    metrics: DispatchMetrics,
}

impl AsyncDispatcher {
    pub fn new(sink: Arc<dyn AsyncSink>) -> Self {
        Self::with_drain_interval(sink, DEFAULT_DRAIN_INTERVAL)
    }

    pub fn with_drain_interval(sink: Arc<dyn AsyncSink>, drain_interval: Duration) -> Self {
        let (sender, receiver) = unbounded();
        let (state, _) = watch::channel(DrainState::Idle);

        Self {
            sink,
            sender,
            receiver,
            drain_interval,
            started: AtomicBool::new(false),
            claimed: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            state,
            last_error: Mutex::new(None),
            metrics: DispatchMetrics::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.sink.name()
    }

    pub fn drain_interval(&self) -> Duration {
        self.drain_interval
    }

    /// Queue an entry for delivery. Never blocks.
    ///
    /// Entries written after the loop has stopped are dropped and counted
    /// as abandoned.
    pub fn enqueue(&self, entry: LogEntry) {
        if self.closed.load(Ordering::SeqCst) || self.state() == DrainState::Stopped {
            self.metrics.record_abandoned(1);
            return;
        }
        self.push(entry);
    }

    fn push(&self, entry: LogEntry) {
        // The dispatcher owns the receiver, so the channel cannot be disconnected
        if self.sender.send(entry).is_ok() {
            self.metrics.record_enqueued();
        }

        // The loop may have finished draining between the check and the send
        fence(Ordering::SeqCst);
        if self.closed.load(Ordering::SeqCst) {
            self.sweep_closed();
        }
    }

    /// Drop whatever reached the queue after a graceful drain finished
    fn sweep_closed(&self) {
        let swept = self.receiver.try_iter().count();
        if swept > 0 {
            self.metrics.record_abandoned(swept as u64);
            tracing::debug!(sink = self.name(), swept, "dropped entries written after drain finished");
        }
    }

    /// Reserve this dispatcher for one owner. Returns `false` if it was
    /// already claimed.
    pub(crate) fn claim(&self) -> bool {
        !self.claimed.swap(true, Ordering::SeqCst)
    }

    pub(crate) fn release(&self) {
        self.claimed.store(false, Ordering::SeqCst);
    }

    /// Entries waiting to be delivered
    pub fn queue_len(&self) -> usize {
        self.receiver.len()
    }

    /// Entries the loop still owes the sink. Zero once a graceful drain has
    /// finished, since anything written later is dropped.
    pub fn pending(&self) -> usize {
        if self.closed.load(Ordering::SeqCst) {
            0
        } else {
            self.receiver.len()
        }
    }

    pub fn state(&self) -> DrainState {
        *self.state.borrow()
    }

    /// Most recent delivery or flush error, if any
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    pub fn metrics(&self) -> &DispatchMetrics {
        &self.metrics
    }

    /// Start the drain loop on `runtime`.
    ///
    /// Returns `None` if the loop was already started; a queue only ever
    /// has one consumer.
    pub fn spawn(
        self: &Arc<Self>,
        runtime: &Handle,
        shutdown: SignalListener,
        abort: SignalListener,
    ) -> Option<JoinHandle<()>> {
        if self.started.swap(true, Ordering::SeqCst) {
            return None;
        }
        self.state.send_replace(DrainState::Running);

        let this = Arc::clone(self);
        Some(runtime.spawn(async move {
            this.drain(&shutdown, &abort).await;
        }))
    }

    /// Run the drain loop on the current task until it stops.
    ///
    /// Fails if the loop was already started elsewhere.
    pub async fn run(&self, shutdown: &SignalListener, abort: &SignalListener) -> Result<DrainOutcome> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(LoggerError::other(format!(
                "drain loop for sink '{}' already started",
                self.name()
            )));
        }
        Ok(self.drain(shutdown, abort).await)
    }

    /// Resolves once the loop has reached `Stopped`
    pub async fn wait_stopped(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so the channel stays open while we wait
        let _ = rx.wait_for(|state| *state == DrainState::Stopped).await;
    }

    async fn drain(&self, shutdown: &SignalListener, abort: &SignalListener) -> DrainOutcome {
        let _guard = StopGuard(&self.state);
        self.state.send_replace(DrainState::Running);
        tracing::debug!(sink = self.name(), "drain loop started");

        let graceful = loop {
            if abort.is_set() || !self.deliver_queued(abort).await {
                break false;
            }

            if shutdown.is_set() {
                if self.receiver.is_empty() {
                    break true;
                }
                // More entries arrived while delivering; go around again
                self.state.send_replace(DrainState::Draining);
                continue;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.drain_interval) => {}
                _ = shutdown.fired() => {
                    if !self.receiver.is_empty() {
                        self.state.send_replace(DrainState::Draining);
                    }
                }
                _ = abort.fired() => {}
            }
        };

        if graceful {
            self.closed.store(true, Ordering::SeqCst);
            fence(Ordering::SeqCst);
            self.sweep_closed();

            let flushed = AssertUnwindSafe(self.sink.flush()).catch_unwind().await;
            let flush_error = match flushed {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e.to_string()),
                Err(panic) => Some(format!("sink panicked: {}", panic_message(panic.as_ref()))),
            };
            if let Some(error) = flush_error {
                tracing::warn!(sink = self.name(), error = %error, "flush after drain failed");
                *self.last_error.lock() = Some(error);
            }
            tracing::debug!(
                sink = self.name(),
                delivered = self.metrics.delivered(),
                failed = self.metrics.failed(),
                failure_rate = self.metrics.failure_rate(),
                "drain loop finished"
            );
            DrainOutcome::Drained
        } else {
            let pending_entries = self.receiver.len();
            self.metrics.record_abandoned(pending_entries as u64);
            tracing::warn!(
                sink = self.name(),
                pending_entries,
                "drain loop aborted, queued entries were not delivered"
            );
            DrainOutcome::Aborted { pending_entries }
        }
    }

    /// Deliver everything currently queued, in order.
    ///
    /// Returns `false` if the abort signal interrupted delivery. Entries not
    /// yet dequeued at that point stay in the queue.
    async fn deliver_queued(&self, abort: &SignalListener) -> bool {
        loop {
            if abort.is_set() {
                return false;
            }
            let Ok(entry) = self.receiver.try_recv() else {
                return true;
            };

            let delivery = AssertUnwindSafe(self.sink.deliver(&entry, abort)).catch_unwind();
            let result = tokio::select! {
                biased;
                _ = abort.fired() => None,
                result = delivery => Some(result.unwrap_or_else(|panic| {
                    Err(LoggerError::delivery(
                        self.name(),
                        format!("sink panicked: {}", panic_message(panic.as_ref())),
                    ))
                })),
            };

            match result {
                Some(Ok(())) => {
                    self.metrics.record_delivered();
                }
                Some(Err(e)) => self.record_failure(&entry, e),
                None => {
                    // In-flight entry is lost with the dropped delivery
                    self.metrics.record_abandoned(1);
                    return false;
                }
            }
        }
    }

    fn record_failure(&self, entry: &LogEntry, error: LoggerError) {
        self.metrics.record_failed();
        tracing::warn!(
            sink = self.name(),
            source = %entry.source,
            error = %error,
            "failed to deliver log entry"
        );
        *self.last_error.lock() = Some(error.to_string());
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl fmt::Debug for AsyncDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncDispatcher")
            .field("sink", &self.name())
            .field("state", &self.state())
            .field("queue_len", &self.queue_len())
            .field("drain_interval", &self.drain_interval)
            .field("failure_rate", &self.metrics.failure_rate())
            .finish()
    }
}
