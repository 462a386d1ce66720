//! Async sink trait for queued, non-blocking log delivery

use super::{error::Result, log_entry::LogEntry, signal::SignalListener};
use async_trait::async_trait;

/// Trait for destinations that are fed by a background drain loop.
///
/// Writers never call these methods directly; entries are queued on the
/// sink's [`AsyncDispatcher`](super::AsyncDispatcher) and delivered one at a
/// time, in order, by its drain loop.
///
/// # Example
///
/// ```no_run
/// use rust_log_facade::core::{AsyncSink, LogEntry, Result, SignalListener};
/// use async_trait::async_trait;
///
/// struct MyAsyncSink;
///
/// #[async_trait]
/// impl AsyncSink for MyAsyncSink {
///     async fn deliver(&self, entry: &LogEntry, _abort: &SignalListener) -> Result<()> {
///         // Send the entry somewhere
///         Ok(())
///     }
///
///     fn name(&self) -> &str {
///         "my_async_sink"
///     }
/// }
/// ```
#[async_trait]
pub trait AsyncSink: Send + Sync {
    /// Deliver a single entry.
    ///
    /// `abort` fires when shutdown is cancelled; long operations may watch
    /// it, though the drain loop also drops the returned future on abort.
    /// A returned error is recorded against the sink and the next entry is
    /// still attempted.
    async fn deliver(&self, entry: &LogEntry, abort: &SignalListener) -> Result<()>;

    /// Called once after a graceful drain has emptied the queue
    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str;
}
