//! Log entry structure

use super::log_context::LogContext;
use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::sync::OnceLock;

// Thread-local caches for thread information to avoid repeated allocations
thread_local! {
    static THREAD_ID_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
    static THREAD_NAME_CACHE: RefCell<Option<Option<String>>> = const { RefCell::new(None) };
}

static HOST_NAME: OnceLock<Option<String>> = OnceLock::new();

fn get_thread_id() -> String {
    THREAD_ID_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| format!("{:?}", std::thread::current().id()))
            .clone()
    })
}

fn get_thread_name() -> Option<String> {
    THREAD_NAME_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| std::thread::current().name().map(String::from))
            .clone()
    })
}

/// Host name, looked up once per process
fn get_host_name() -> Option<String> {
    HOST_NAME
        .get_or_init(|| {
            ["HOSTNAME", "COMPUTERNAME"]
                .iter()
                .find_map(|var| std::env::var(var).ok())
                .or_else(|| std::fs::read_to_string("/etc/hostname").ok())
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
        })
        .clone()
}

/// One logging event.
///
/// Built on the calling thread when a write is accepted, so the thread,
/// process and host fields describe the caller. Sinks receive it by reference
/// or as an owned clone and never mutate it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<i32>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    pub process_id: u32,
    pub thread_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_name: Option<String>,
    #[serde(default, skip_serializing_if = "LogContext::is_empty")]
    pub context: LogContext,
}

impl LogEntry {
    fn base(level: LogLevel, source: &str) -> Self {
        Self {
            level,
            source: source.to_string(),
            message: None,
            data: None,
            event_id: None,
            timestamp: Utc::now(),
            host_name: get_host_name(),
            process_id: std::process::id(),
            thread_id: get_thread_id(),
            thread_name: get_thread_name(),
            context: LogContext::default(),
        }
    }

    pub fn new(level: LogLevel, source: &str, message: impl Into<String>) -> Self {
        let mut entry = Self::base(level, source);
        entry.message = Some(message.into());
        entry
    }

    pub fn with_data(level: LogLevel, source: &str, data: serde_json::Value) -> Self {
        let mut entry = Self::base(level, source);
        entry.data = Some(data);
        entry
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_event_id(mut self, event_id: i32) -> Self {
        self.event_id = Some(event_id);
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: LogContext) -> Self {
        self.context = context;
        self
    }

    /// Message text, or the compact JSON of the data when there is no message
    pub fn text(&self) -> String {
        match (&self.message, &self.data) {
            (Some(message), Some(data)) => format!("{} {}", message, data),
            (Some(message), None) => message.clone(),
            (None, Some(data)) => data.to_string(),
            (None, None) => String::new(),
        }
    }
}
