//! Log factory: creates per-source logs and owns the shutdown coordinator

use super::{
    async_sink::AsyncSink,
    dispatch::AsyncDispatcher,
    error::{LoggerError, Result},
    level_filter::LevelFilterResolver,
    log::Log,
    log_level::LogLevel,
    options::{FilterEntry, LogFactoryOptions},
    shutdown::{ShutdownCoordinator, ShutdownOutcome},
    sink::{Sink, SinkHandle, WiredSink},
    source_name::SourceName,
};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

/// Creates [`Log`] handles and shuts their asynchronous sinks down.
///
/// Filters and sinks are fixed once the factory is built. Each asynchronous
/// sink gets its drain loop started the first time a log wired to it is
/// created; [`shutdown`](Self::shutdown) waits for all of those loops.
///
/// # Example
///
/// ```no_run
/// use rust_log_facade::prelude::*;
///
/// # async fn example() -> rust_log_facade::Result<()> {
/// let factory = LogFactory::builder()
///     .min_level(LogLevel::Information)
///     .filter("App.Storage", LogLevel::Debug)
///     .console()
///     .build()?;
///
/// let log = factory.create("App.Storage.Cache")?;
/// log.debug("cache warmed");
///
/// factory.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct LogFactory {
    resolver: LevelFilterResolver,
    sinks: Arc<[WiredSink]>,
    coordinator: ShutdownCoordinator,
    shutdown_timeout: Duration,
}

impl LogFactory {
    #[must_use]
    pub fn builder() -> LogFactoryBuilder {
        LogFactoryBuilder::new()
    }

    /// Create a log for `name`, e.g. `"App.Storage"`.
    ///
    /// Fails only if `name` is not a valid source name.
    pub fn create<N>(&self, name: N) -> Result<Log>
    where
        N: TryInto<SourceName>,
        N::Error: Into<LoggerError>,
    {
        let source = name.try_into().map_err(Into::into)?;
        Ok(self.create_for_source(source))
    }

    /// Create a log named after the module that defines `T`
    pub fn create_for<T: ?Sized>(&self) -> Log {
        self.create_for_source(SourceName::of::<T>())
    }

    fn create_for_source(&self, source: SourceName) -> Log {
        let min_level = self.resolver.resolve(&source);

        for wired in self.sinks.iter() {
            if let Some(dispatcher) = wired.handle.as_dispatcher() {
                self.coordinator.register(wired.handle.id(), dispatcher);
            }
        }

        tracing::debug!(source = %source, level = %min_level, "created log");
        Log::new(source, min_level, Arc::clone(&self.sinks))
    }

    /// Effective minimum level for `source`
    pub fn level_for(&self, source: &SourceName) -> LogLevel {
        self.resolver.resolve(source)
    }

    pub fn resolver(&self) -> &LevelFilterResolver {
        &self.resolver
    }

    pub fn sinks(&self) -> &[WiredSink] {
        &self.sinks
    }

    pub fn coordinator(&self) -> &ShutdownCoordinator {
        &self.coordinator
    }

    /// Wait until every asynchronous sink has delivered its queue
    pub async fn shutdown(&self) -> ShutdownOutcome {
        self.coordinator.shutdown().await
    }

    /// Wait for queues to drain; abort delivery if `cancel` resolves first.
    ///
    /// Returns once every drain loop has actually stopped.
    pub async fn shutdown_with_cancellation<F>(&self, cancel: F) -> ShutdownOutcome
    where
        F: Future<Output = ()>,
    {
        self.coordinator.shutdown_with_cancellation(cancel).await
    }

    pub async fn shutdown_timeout(&self, timeout: Duration) -> ShutdownOutcome {
        self.coordinator.shutdown_timeout(timeout).await
    }

    /// Shut down with the configured timeout
    pub async fn shutdown_default(&self) -> ShutdownOutcome {
        self.coordinator.shutdown_timeout(self.shutdown_timeout).await
    }
}

impl std::fmt::Debug for LogFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogFactory")
            .field("resolver", &self.resolver)
            .field("sinks", &self.sinks)
            .field("coordinator", &self.coordinator)
            .finish()
    }
}

enum PendingSink {
    Sync(Arc<dyn Sink>),
    Async(Arc<dyn AsyncSink>),
    Dispatcher(Arc<AsyncDispatcher>),
}

impl PendingSink {
    fn identity(&self) -> usize {
        match self {
            PendingSink::Sync(sink) => Arc::as_ptr(sink) as *const () as usize,
            PendingSink::Async(sink) => Arc::as_ptr(sink) as *const () as usize,
            PendingSink::Dispatcher(dispatcher) => Arc::as_ptr(dispatcher) as *const () as usize,
        }
    }
}

/// Builder for constructing a [`LogFactory`] with a fluent API
///
/// Invalid settings are collected and reported by [`build`](Self::build),
/// so configuration mistakes surface before any log is written.
///
/// # Example
/// ```
/// use rust_log_facade::prelude::*;
/// use std::time::Duration;
///
/// let factory = LogFactory::builder()
///     .min_level(LogLevel::Warning)
///     .filter("App", LogLevel::Information)
///     .filter("App.Noisy", LogLevel::None)
///     .drain_interval(Duration::from_millis(50))
///     .build()
///     .unwrap();
///
/// let log = factory.create("App.Noisy.Worker").unwrap();
/// assert!(!log.is_enabled(LogLevel::Critical));
/// ```
pub struct LogFactoryBuilder {
    options: LogFactoryOptions,
    sinks: Vec<(PendingSink, Option<LogLevel>)>,
    runtime: Option<Handle>,
    console_added: bool,
    errors: Vec<LoggerError>,
}

impl LogFactoryBuilder {
    pub fn new() -> Self {
        Self {
            options: LogFactoryOptions::default(),
            sinks: Vec::new(),
            runtime: None,
            console_added: false,
            errors: Vec::new(),
        }
    }

    /// Replace all options (filters included); sinks already added are kept
    #[must_use = "builder methods return a new value"]
    pub fn options(mut self, options: LogFactoryOptions) -> Self {
        self.options = options;
        self
    }

    /// Level used for sources no filter matches
    #[must_use = "builder methods return a new value"]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.options.default_level = level;
        self
    }

    /// Minimum level for `source` and all sources below it
    #[must_use = "builder methods return a new value"]
    pub fn filter(mut self, source: impl AsRef<str>, level: LogLevel) -> Self {
        match SourceName::new(source) {
            Ok(source) => self.options.filters.push(FilterEntry { source, level }),
            Err(e) => self.errors.push(e),
        }
        self
    }

    /// Pause between queue checks for idle asynchronous sinks
    #[must_use = "builder methods return a new value"]
    pub fn drain_interval(mut self, interval: Duration) -> Self {
        self.options.drain_interval_ms = millis_rounded_up(interval);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.options.shutdown_timeout_ms = millis_rounded_up(timeout);
        self
    }

    /// Runtime that drain loops are spawned on.
    ///
    /// Defaults to the runtime `build` is called from.
    #[must_use = "builder methods return a new value"]
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn sink<S: Sink + 'static>(self, sink: S) -> Self {
        self.shared_sink(Arc::new(sink), None)
    }

    #[must_use = "builder methods return a new value"]
    pub fn sink_with_level<S: Sink + 'static>(self, sink: S, level: LogLevel) -> Self {
        self.shared_sink(Arc::new(sink), Some(level))
    }

    /// Add a sink the caller keeps a reference to. Adding the same instance
    /// twice wires it once.
    #[must_use = "builder methods return a new value"]
    pub fn shared_sink(mut self, sink: Arc<dyn Sink>, level: Option<LogLevel>) -> Self {
        self.sinks.push((PendingSink::Sync(sink), level));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn async_sink<S: AsyncSink + 'static>(self, sink: S) -> Self {
        self.shared_async_sink(Arc::new(sink), None)
    }

    #[must_use = "builder methods return a new value"]
    pub fn async_sink_with_level<S: AsyncSink + 'static>(self, sink: S, level: LogLevel) -> Self {
        self.shared_async_sink(Arc::new(sink), Some(level))
    }

    /// Add an asynchronous sink the caller keeps a reference to. It gets a
    /// dispatcher using the configured drain interval.
    #[must_use = "builder methods return a new value"]
    pub fn shared_async_sink(mut self, sink: Arc<dyn AsyncSink>, level: Option<LogLevel>) -> Self {
        self.sinks.push((PendingSink::Async(sink), level));
        self
    }

    /// Add a prebuilt dispatcher, e.g. to inspect its queue from outside.
    ///
    /// A dispatcher has one drain loop, so it can belong to one factory
    /// only; `build` fails if another factory already owns it.
    #[must_use = "builder methods return a new value"]
    pub fn dispatcher(mut self, dispatcher: Arc<AsyncDispatcher>, level: Option<LogLevel>) -> Self {
        self.sinks.push((PendingSink::Dispatcher(dispatcher), level));
        self
    }

    /// Add the console sink. Repeated calls add it once.
    #[cfg(feature = "console")]
    #[must_use = "builder methods return a new value"]
    pub fn console(mut self) -> Self {
        if !self.console_added {
            self.console_added = true;
            self = self.sink(crate::sinks::ConsoleSink::new());
        }
        self
    }

    /// Build the factory
    pub fn build(self) -> Result<LogFactory> {
        if let Some(error) = self.errors.into_iter().next() {
            return Err(error);
        }
        self.options.validate()?;
        let resolver = self.options.resolver()?;
        let drain_interval = self.options.drain_interval();

        let mut seen = HashSet::new();
        let mut sinks = Vec::with_capacity(self.sinks.len());
        for (pending, level) in self.sinks {
            if !seen.insert(pending.identity()) {
                continue;
            }
            let handle = match pending {
                PendingSink::Sync(sink) => SinkHandle::Sync(sink),
                PendingSink::Async(sink) => SinkHandle::Async(Arc::new(
                    AsyncDispatcher::with_drain_interval(sink, drain_interval),
                )),
                PendingSink::Dispatcher(dispatcher) => SinkHandle::Async(dispatcher),
            };
            sinks.push(WiredSink::new(handle, level));
        }

        let has_async = sinks.iter().any(|wired| wired.handle.is_async());
        let runtime = self.runtime.or_else(|| Handle::try_current().ok());
        if has_async && runtime.is_none() {
            return Err(LoggerError::config(
                "LogFactoryBuilder",
                "asynchronous sinks need a tokio runtime; build inside one or call runtime()",
            ));
        }

        let mut claimed: Vec<&Arc<AsyncDispatcher>> = Vec::new();
        for wired in &sinks {
            let Some(dispatcher) = wired.handle.as_dispatcher() else {
                continue;
            };
            if !dispatcher.claim() {
                for owned in claimed {
                    owned.release();
                }
                return Err(LoggerError::config(
                    "LogFactoryBuilder",
                    format!("dispatcher for sink '{}' already belongs to another factory", dispatcher.name()),
                ));
            }
            claimed.push(dispatcher);
        }

        Ok(LogFactory {
            resolver,
            sinks: sinks.into(),
            coordinator: ShutdownCoordinator::new(runtime),
            shutdown_timeout: self.options.shutdown_timeout(),
        })
    }
}

/// Options hold whole milliseconds; a non-zero duration never becomes zero
fn millis_rounded_up(duration: Duration) -> u64 {
    let millis = duration.as_nanos().div_ceil(1_000_000);
    u64::try_from(millis).unwrap_or(u64::MAX)
}

impl Default for LogFactoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
