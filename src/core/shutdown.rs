//! Tracks drain loops and shuts them down together

use super::dispatch::AsyncDispatcher;
use super::signal::Signal;
use super::sink::SinkId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Default timeout used by [`LogFactory::shutdown_default`](crate::LogFactory::shutdown_default) (5 seconds)
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of a shutdown request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Every queue was emptied
    Completed,
    /// Shutdown was cancelled; this many entries were left undelivered
    Aborted { pending_entries: usize },
    /// Not cancelled, but a drain loop stopped with entries still queued
    Incomplete { pending_entries: usize },
}

impl ShutdownOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, ShutdownOutcome::Completed)
    }

    /// Entries still queued when shutdown returned
    pub fn pending_entries(&self) -> usize {
        match self {
            ShutdownOutcome::Completed => 0,
            ShutdownOutcome::Aborted { pending_entries }
            | ShutdownOutcome::Incomplete { pending_entries } => *pending_entries,
        }
    }
}

struct DrainTask {
    dispatcher: Arc<AsyncDispatcher>,
    handle: JoinHandle<()>,
}

/// Owns the shutdown and abort signals and one drain task per asynchronous
/// sink.
///
/// Dropping the coordinator fires the shutdown signal, so loops that were
/// never shut down explicitly still drain and exit in the background.
pub struct ShutdownCoordinator {
    shutdown: Signal,
    abort: Signal,
    tasks: Mutex<HashMap<SinkId, DrainTask>>,
    runtime: Option<Handle>,
}

impl ShutdownCoordinator {
    /// `runtime` is where drain loops are spawned; without one, registering
    /// a dispatcher fails.
    pub fn new(runtime: Option<Handle>) -> Self {
        Self {
            shutdown: Signal::new(),
            abort: Signal::new(),
            tasks: Mutex::new(HashMap::new()),
            runtime,
        }
    }

    /// Start and track the drain loop for `dispatcher`.
    ///
    /// Returns `false` if this dispatcher is already tracked (or its loop was
    /// started elsewhere) or no runtime is available.
    pub fn register(&self, id: SinkId, dispatcher: &Arc<AsyncDispatcher>) -> bool {
        let Some(runtime) = self.runtime.as_ref() else {
            tracing::error!(
                sink = dispatcher.name(),
                "no tokio runtime available, drain loop not started"
            );
            return false;
        };

        let mut tasks = self.tasks.lock();
        if tasks.contains_key(&id) {
            return false;
        }

        let Some(handle) =
            dispatcher.spawn(runtime, self.shutdown.listener(), self.abort.listener())
        else {
            return false;
        };

        tracing::debug!(sink = dispatcher.name(), %id, "registered drain loop");
        tasks.insert(
            id,
            DrainTask {
                dispatcher: Arc::clone(dispatcher),
                handle,
            },
        );
        true
    }

    pub fn drain_task_count(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Entries queued across all tracked sinks
    pub fn pending_entries(&self) -> usize {
        self.tasks
            .lock()
            .values()
            .map(|task| task.dispatcher.pending())
            .sum()
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown.is_set()
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.is_set()
    }

    /// Ask every loop to deliver what is queued and wait for all of them.
    pub async fn shutdown(&self) -> ShutdownOutcome {
        self.shutdown.fire();
        self.wait_all_stopped().await;
        self.outcome()
    }

    /// Like [`shutdown`](Self::shutdown), but if `cancel` resolves first the
    /// abort signal fires. Still returns only after every loop has stopped.
    pub async fn shutdown_with_cancellation<F>(&self, cancel: F) -> ShutdownOutcome
    where
        F: Future<Output = ()>,
    {
        self.shutdown.fire();

        let all_stopped = self.wait_all_stopped();
        tokio::pin!(all_stopped);

        tokio::select! {
            _ = &mut all_stopped => {}
            _ = cancel => {
                tracing::warn!(
                    pending_entries = self.pending_entries(),
                    "shutdown cancelled, aborting drain loops"
                );
                self.abort.fire();
                all_stopped.await;
            }
        }

        self.outcome()
    }

    pub async fn shutdown_timeout(&self, timeout: Duration) -> ShutdownOutcome {
        self.shutdown_with_cancellation(tokio::time::sleep(timeout)).await
    }

    /// Waits for every tracked loop, including loops registered while
    /// waiting. Tasks are never removed, so a stable count means none were
    /// missed.
    async fn wait_all_stopped(&self) {
        let mut waited = 0;
        loop {
            let dispatchers: Vec<Arc<AsyncDispatcher>> = self
                .tasks
                .lock()
                .values()
                .map(|task| Arc::clone(&task.dispatcher))
                .collect();
            if dispatchers.len() == waited {
                return;
            }
            waited = dispatchers.len();

            for dispatcher in dispatchers {
                dispatcher.wait_stopped().await;
            }
        }
    }

    fn outcome(&self) -> ShutdownOutcome {
        let pending_entries = self.pending_entries();
        if self.abort.is_set() {
            ShutdownOutcome::Aborted { pending_entries }
        } else if pending_entries > 0 {
            ShutdownOutcome::Incomplete { pending_entries }
        } else {
            ShutdownOutcome::Completed
        }
    }
}

impl Drop for ShutdownCoordinator {
    fn drop(&mut self) {
        self.shutdown.fire();

        let tasks = self.tasks.get_mut();
        let running = tasks
            .values()
            .filter(|task| !task.handle.is_finished())
            .count();
        if running > 0 {
            tracing::debug!(running, "coordinator dropped, drain loops finishing in background");
        }
    }
}

impl std::fmt::Debug for ShutdownCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownCoordinator")
            .field("drain_tasks", &self.drain_task_count())
            .field("shutdown_requested", &self.shutdown.is_set())
            .field("aborted", &self.abort.is_set())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AsyncSink, LogEntry, LogLevel, Result, SignalListener, SinkHandle};
    use async_trait::async_trait;

    struct SlowSink(Duration);

    #[async_trait]
    impl AsyncSink for SlowSink {
        async fn deliver(&self, _entry: &LogEntry, _abort: &SignalListener) -> Result<()> {
            tokio::time::sleep(self.0).await;
            Ok(())
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    fn async_handle(delay: Duration) -> SinkHandle {
        SinkHandle::Async(Arc::new(AsyncDispatcher::with_drain_interval(
            Arc::new(SlowSink(delay)),
            Duration::from_millis(10),
        )))
    }

    fn fill(handle: &SinkHandle, count: usize) {
        let dispatcher = handle.as_dispatcher().unwrap();
        for i in 0..count {
            dispatcher.enqueue(LogEntry::new(LogLevel::Information, "Tests", i.to_string()));
        }
    }

    #[tokio::test]
    async fn test_registration_is_idempotent() {
        let coordinator = ShutdownCoordinator::new(Some(Handle::current()));
        let handle = async_handle(Duration::ZERO);
        let dispatcher = handle.as_dispatcher().unwrap();

        assert!(coordinator.register(handle.id(), dispatcher));
        assert!(!coordinator.register(handle.id(), dispatcher));
        assert_eq!(coordinator.drain_task_count(), 1);

        coordinator.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_drains_every_sink() {
        let coordinator = ShutdownCoordinator::new(Some(Handle::current()));
        let handles = [async_handle(Duration::from_millis(2)), async_handle(Duration::from_millis(3))];
        for handle in &handles {
            fill(handle, 10);
            coordinator.register(handle.id(), handle.as_dispatcher().unwrap());
        }

        assert_eq!(coordinator.shutdown().await, ShutdownOutcome::Completed);
        assert_eq!(coordinator.pending_entries(), 0);
    }

    #[tokio::test]
    async fn test_timeout_aborts_and_waits_for_loops() {
        let coordinator = ShutdownCoordinator::new(Some(Handle::current()));
        let handle = async_handle(Duration::from_millis(100));
        fill(&handle, 10);
        coordinator.register(handle.id(), handle.as_dispatcher().unwrap());

        let outcome = coordinator.shutdown_timeout(Duration::from_millis(150)).await;

        assert!(matches!(outcome, ShutdownOutcome::Aborted { pending_entries } if pending_entries > 0));
        assert_eq!(
            handle.as_dispatcher().unwrap().state(),
            crate::core::DrainState::Stopped
        );
    }

    #[tokio::test]
    async fn test_repeated_shutdown_settles() {
        let coordinator = ShutdownCoordinator::new(Some(Handle::current()));
        let handle = async_handle(Duration::from_millis(5));
        fill(&handle, 5);
        coordinator.register(handle.id(), handle.as_dispatcher().unwrap());

        let (first, second) = tokio::join!(coordinator.shutdown(), coordinator.shutdown());
        assert_eq!(first, ShutdownOutcome::Completed);
        assert_eq!(second, ShutdownOutcome::Completed);
        assert_eq!(coordinator.shutdown().await, ShutdownOutcome::Completed);
    }

    #[tokio::test]
    async fn test_waits_for_loops_registered_during_shutdown() {
        let coordinator = ShutdownCoordinator::new(Some(Handle::current()));
        let early = async_handle(Duration::from_millis(10));
        fill(&early, 5);
        coordinator.register(early.id(), early.as_dispatcher().unwrap());

        let late = async_handle(Duration::from_millis(30));
        fill(&late, 10);

        let (outcome, _) = tokio::join!(coordinator.shutdown(), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            assert!(coordinator.register(late.id(), late.as_dispatcher().unwrap()));
        });

        assert_eq!(outcome, ShutdownOutcome::Completed);
        let late = late.as_dispatcher().unwrap();
        assert_eq!(late.state(), crate::core::DrainState::Stopped);
        assert_eq!(late.queue_len(), 0);
    }

    #[tokio::test]
    async fn test_stopped_loop_with_queue_reports_incomplete() {
        let coordinator = ShutdownCoordinator::new(Some(Handle::current()));
        let handle = async_handle(Duration::ZERO);
        let dispatcher = handle.as_dispatcher().unwrap();
        fill(&handle, 3);

        // Loop run and aborted outside this coordinator leaves its queue behind
        let abort = Signal::new();
        abort.fire();
        dispatcher
            .run(&Signal::new().listener(), &abort.listener())
            .await
            .unwrap();
        coordinator.tasks.lock().insert(
            handle.id(),
            DrainTask {
                dispatcher: Arc::clone(dispatcher),
                handle: tokio::spawn(async {}),
            },
        );

        let outcome = coordinator.shutdown().await;
        assert_eq!(outcome, ShutdownOutcome::Incomplete { pending_entries: 3 });
        assert_eq!(outcome.pending_entries(), 3);
        assert!(!outcome.is_completed());
    }

    #[test]
    fn test_register_without_runtime_fails() {
        let coordinator = ShutdownCoordinator::new(None);
        let handle = async_handle(Duration::ZERO);
        assert!(!coordinator.register(handle.id(), handle.as_dispatcher().unwrap()));
        assert_eq!(coordinator.drain_task_count(), 0);
    }
}
