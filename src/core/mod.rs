//! Core facade types and traits

pub mod async_sink;
pub mod dispatch;
pub mod error;
pub mod factory;
pub mod level_filter;
pub mod log;
pub mod log_context;
pub mod log_entry;
pub mod log_level;
pub mod metrics;
pub mod options;
pub mod shutdown;
pub mod signal;
pub mod sink;
pub mod source_name;

pub use async_sink::AsyncSink;
pub use dispatch::{AsyncDispatcher, DrainOutcome, DrainState, DEFAULT_DRAIN_INTERVAL};
pub use error::{LoggerError, Result};
pub use factory::{LogFactory, LogFactoryBuilder};
pub use level_filter::LevelFilterResolver;
pub use log::Log;
pub use log_context::LogContext;
pub use log_entry::LogEntry;
pub use log_level::LogLevel;
pub use metrics::DispatchMetrics;
pub use options::{FilterEntry, LogFactoryOptions};
pub use shutdown::{ShutdownCoordinator, ShutdownOutcome, DEFAULT_SHUTDOWN_TIMEOUT};
pub use signal::{Signal, SignalListener};
pub use sink::{Sink, SinkHandle, SinkId, WiredSink};
pub use source_name::{Ancestors, SourceName};
