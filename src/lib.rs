//! # Rust Log Facade
//!
//! A structured logging facade: applications write through per-source
//! [`Log`] handles, a [`LogFactory`] decides each source's minimum level from
//! hierarchical filters, and entries fan out to synchronous and asynchronous
//! sinks.
//!
//! ## Features
//!
//! - **Hierarchical filters**: `App.Storage` configures `App.Storage.Cache`
//!   unless a closer filter exists
//! - **Non-blocking async sinks**: writes only enqueue; one drain loop per
//!   sink delivers in order
//! - **Graceful shutdown**: wait for every queue to drain, or cancel and
//!   abandon what is left
//! - **Isolation**: a failing or panicking sink never reaches the caller
//!
//! ## Example
//!
//! ```no_run
//! use rust_log_facade::prelude::*;
//! use rust_log_facade::info;
//!
//! #[tokio::main]
//! async fn main() -> rust_log_facade::Result<()> {
//!     let factory = LogFactory::builder()
//!         .filter("App.Storage", LogLevel::Debug)
//!         .console()
//!         .build()?;
//!
//!     let log = factory.create("App.Storage")?;
//!     info!(log, "opened {} segments", 12);
//!
//!     factory.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod macros;
pub mod sinks;

pub mod prelude {
    #[cfg(feature = "console")]
    pub use crate::sinks::ConsoleSink;
    pub use crate::core::{
        AsyncSink, Log, LogContext, LogEntry, LogFactory, LogFactoryBuilder, LogFactoryOptions,
        LogLevel, LoggerError, Result, ShutdownOutcome, SignalListener, Sink, SourceName,
    };
}

#[cfg(feature = "console")]
pub use crate::sinks::ConsoleSink;
pub use crate::sinks::UdpSink;
pub use crate::core::{
    Ancestors, AsyncDispatcher, AsyncSink, DispatchMetrics, DrainOutcome, DrainState, FilterEntry,
    LevelFilterResolver, Log, LogContext, LogEntry, LogFactory, LogFactoryBuilder,
    LogFactoryOptions, LogLevel, LoggerError, Result, ShutdownCoordinator, ShutdownOutcome, Signal,
    SignalListener, Sink, SinkHandle, SinkId, SourceName, WiredSink, DEFAULT_DRAIN_INTERVAL,
    DEFAULT_SHUTDOWN_TIMEOUT,
};
