//! Logging macros for ergonomic log message formatting.
//!
//! These macros take a [`Log`](crate::Log) handle and `format!` arguments.
//! Arguments are only formatted when the level is enabled for the handle.
//!
//! # Examples
//!
//! ```
//! use rust_log_facade::prelude::*;
//! use rust_log_facade::info;
//!
//! let factory = LogFactory::builder().build().unwrap();
//! let log = factory.create("App.Server").unwrap();
//!
//! // Basic logging
//! info!(log, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(log, "Server listening on port {}", port);
//! ```

/// Log a message at the given level with automatic formatting.
///
/// # Examples
///
/// ```
/// # use rust_log_facade::prelude::*;
/// # let factory = LogFactory::builder().build().unwrap();
/// # let log = factory.create("App").unwrap();
/// use rust_log_facade::log;
/// log!(log, LogLevel::Information, "Simple message");
/// log!(log, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($log:expr, $level:expr, $($arg:tt)+) => {{
        let level = $level;
        let log = &$log;
        if log.is_enabled(level) {
            log.write(level, format!($($arg)+));
        }
    }};
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($log:expr, $($arg:tt)+) => {
        $crate::log!($log, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an information-level message.
#[macro_export]
macro_rules! info {
    ($log:expr, $($arg:tt)+) => {
        $crate::log!($log, $crate::LogLevel::Information, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// # Examples
///
/// ```
/// # use rust_log_facade::prelude::*;
/// # let factory = LogFactory::builder().build().unwrap();
/// # let log = factory.create("App").unwrap();
/// use rust_log_facade::warn;
/// warn!(log, "Retry attempt {} of {}", 3, 5);
/// ```
#[macro_export]
macro_rules! warn {
    ($log:expr, $($arg:tt)+) => {
        $crate::log!($log, $crate::LogLevel::Warning, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($log:expr, $($arg:tt)+) => {
        $crate::log!($log, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a critical-level message.
#[macro_export]
macro_rules! critical {
    ($log:expr, $($arg:tt)+) => {
        $crate::log!($log, $crate::LogLevel::Critical, $($arg)+)
    };
}
