//! Sink trait for synchronous log destinations, and the tagged handle the
//! factory wires into logs

use super::async_sink::AsyncSink;
use super::dispatch::AsyncDispatcher;
use super::{error::Result, log_entry::LogEntry, log_level::LogLevel};
use std::fmt;
use std::sync::Arc;

/// A destination that handles each entry inline on the writing thread.
///
/// Implementations may block. Errors are reported as diagnostics by the
/// caller and never reach application code.
pub trait Sink: Send + Sync {
    fn accept(&self, entry: &LogEntry) -> Result<()>;

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str;
}

/// Identity of a shared sink instance, used to deduplicate wiring and
/// drain-loop registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SinkId(usize);

impl SinkId {
    fn of<T: ?Sized>(ptr: &Arc<T>) -> Self {
        SinkId(Arc::as_ptr(ptr) as *const () as usize)
    }
}

impl fmt::Display for SinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sink#{:x}", self.0)
    }
}

/// A configured sink: either handled inline or queued for a drain loop.
#[derive(Clone)]
pub enum SinkHandle {
    Sync(Arc<dyn Sink>),
    Async(Arc<AsyncDispatcher>),
}

impl SinkHandle {
    pub fn sync<S: Sink + 'static>(sink: S) -> Self {
        SinkHandle::Sync(Arc::new(sink))
    }

    /// Wrap an asynchronous sink in a new dispatcher with the default drain interval
    pub fn from_async<S: AsyncSink + 'static>(sink: S) -> Self {
        SinkHandle::Async(Arc::new(AsyncDispatcher::new(Arc::new(sink))))
    }

    pub fn id(&self) -> SinkId {
        match self {
            SinkHandle::Sync(sink) => SinkId::of(sink),
            SinkHandle::Async(dispatcher) => SinkId::of(dispatcher),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SinkHandle::Sync(sink) => sink.name(),
            SinkHandle::Async(dispatcher) => dispatcher.name(),
        }
    }

    pub fn is_async(&self) -> bool {
        matches!(self, SinkHandle::Async(_))
    }

    pub fn as_dispatcher(&self) -> Option<&Arc<AsyncDispatcher>> {
        match self {
            SinkHandle::Async(dispatcher) => Some(dispatcher),
            SinkHandle::Sync(_) => None,
        }
    }
}

impl From<Arc<dyn Sink>> for SinkHandle {
    fn from(sink: Arc<dyn Sink>) -> Self {
        SinkHandle::Sync(sink)
    }
}

impl From<Arc<AsyncDispatcher>> for SinkHandle {
    fn from(dispatcher: Arc<AsyncDispatcher>) -> Self {
        SinkHandle::Async(dispatcher)
    }
}

impl fmt::Debug for SinkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_async() { "Async" } else { "Sync" };
        write!(f, "SinkHandle::{}({}, {})", kind, self.name(), self.id())
    }
}

/// A sink plus its optional minimum level override
#[derive(Debug, Clone)]
pub struct WiredSink {
    pub handle: SinkHandle,
    pub min_level: Option<LogLevel>,
}

impl WiredSink {
    pub fn new(handle: SinkHandle, min_level: Option<LogLevel>) -> Self {
        Self { handle, min_level }
    }

    #[inline]
    pub fn accepts(&self, level: LogLevel) -> bool {
        self.min_level.map_or(true, |min| level.passes(min))
    }
}
