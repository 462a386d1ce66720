//! Per-source log handle

use super::{
    log_context::LogContext,
    log_entry::LogEntry,
    log_level::LogLevel,
    sink::{Sink, SinkHandle, WiredSink},
    source_name::SourceName,
};
use serde::Serialize;
use std::sync::Arc;

/// Writes entries for one source to every wired sink.
///
/// Created by [`LogFactory::create`](crate::LogFactory::create). The minimum
/// level is fixed when the handle is created. Cloning is cheap and clones
/// share the same sinks.
///
/// Writes never fail and never panic because of a sink: synchronous sinks
/// run inline with their errors and panics reported as diagnostics, and
/// asynchronous sinks only have the entry queued.
#[derive(Debug, Clone)]
pub struct Log {
    source: SourceName,
    min_level: LogLevel,
    sinks: Arc<[WiredSink]>,
}

impl Log {
    pub(crate) fn new(source: SourceName, min_level: LogLevel, sinks: Arc<[WiredSink]>) -> Self {
        Self {
            source,
            min_level,
            sinks,
        }
    }

    pub fn source(&self) -> &SourceName {
        &self.source
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    pub fn sinks(&self) -> &[WiredSink] {
        &self.sinks
    }

    #[inline]
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level.passes(self.min_level)
    }

    pub fn write(&self, level: LogLevel, message: impl Into<String>) {
        if !self.is_enabled(level) {
            return;
        }
        self.dispatch(LogEntry::new(level, self.source.as_str(), message));
    }

    /// Write structured data, serialized on the calling thread
    pub fn write_data<T: Serialize + ?Sized>(&self, level: LogLevel, data: &T) {
        if !self.is_enabled(level) {
            return;
        }
        self.dispatch(self.data_entry(level, data));
    }

    pub fn write_with_context(&self, level: LogLevel, message: impl Into<String>, context: &LogContext) {
        if !self.is_enabled(level) {
            return;
        }
        let entry = LogEntry::new(level, self.source.as_str(), message).with_context(context.clone());
        self.dispatch(entry);
    }

    pub fn write_data_with_context<T: Serialize + ?Sized>(
        &self,
        level: LogLevel,
        data: &T,
        context: &LogContext,
    ) {
        if !self.is_enabled(level) {
            return;
        }
        self.dispatch(self.data_entry(level, data).with_context(context.clone()));
    }

    /// Write an error with a message describing what was being done.
    ///
    /// The error and its chain of sources become the entry's data.
    pub fn write_error(&self, level: LogLevel, context: impl Into<String>, error: &(dyn std::error::Error + 'static)) {
        if !self.is_enabled(level) {
            return;
        }

        let mut causes = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        let data = serde_json::json!({
            "error": error.to_string(),
            "causes": causes,
        });

        let entry = LogEntry::with_data(level, self.source.as_str(), data).with_message(context);
        self.dispatch(entry);
    }

    /// Send a prepared entry to the sinks if its level is enabled
    pub fn write_entry(&self, entry: LogEntry) {
        if self.is_enabled(entry.level) {
            self.dispatch(entry);
        }
    }

    #[inline]
    pub fn debug(&self, message: impl Into<String>) {
        self.write(LogLevel::Debug, message);
    }

    #[inline]
    pub fn info(&self, message: impl Into<String>) {
        self.write(LogLevel::Information, message);
    }

    #[inline]
    pub fn warn(&self, message: impl Into<String>) {
        self.write(LogLevel::Warning, message);
    }

    #[inline]
    pub fn error(&self, message: impl Into<String>) {
        self.write(LogLevel::Error, message);
    }

    #[inline]
    pub fn critical(&self, message: impl Into<String>) {
        self.write(LogLevel::Critical, message);
    }

    fn data_entry<T: Serialize + ?Sized>(&self, level: LogLevel, data: &T) -> LogEntry {
        match serde_json::to_value(data) {
            Ok(value) => LogEntry::with_data(level, self.source.as_str(), value),
            Err(e) => LogEntry::new(
                level,
                self.source.as_str(),
                format!("<unserializable log data: {}>", e),
            ),
        }
    }

    fn dispatch(&self, entry: LogEntry) {
        for wired in self.sinks.iter() {
            if !wired.accepts(entry.level) {
                continue;
            }
            match &wired.handle {
                SinkHandle::Sync(sink) => Self::accept_isolated(sink.as_ref(), &entry),
                SinkHandle::Async(dispatcher) => dispatcher.enqueue(entry.clone()),
            }
        }
    }

    /// Run a synchronous sink so that neither an error nor a panic escapes
    fn accept_isolated(sink: &dyn Sink, entry: &LogEntry) {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| sink.accept(entry)));

        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(sink = sink.name(), error = %e, "sink failed to accept log entry");
            }
            Err(panic_info) => {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                tracing::error!(sink = sink.name(), panic = %panic_msg, "sink panicked while accepting log entry");
            }
        }
    }
}
