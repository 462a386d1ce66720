//! Per-call correlation context
//!
//! Correlation tags are passed explicitly with each write instead of being
//! held in thread-local or process-wide defaults, so concurrent requests
//! never see each other's tags.

use serde::{Deserialize, Serialize};

/// Customer and session tags attached to a single log entry
///
/// # Example
///
/// ```
/// use rust_log_facade::LogContext;
///
/// let ctx = LogContext::new()
///     .with_customer_id("c-42")
///     .with_session_id("s-7");
/// assert!(ctx.has_customer_id());
/// assert!(ctx.has_session_id());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl LogContext {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_customer_id(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn has_customer_id(&self) -> bool {
        self.customer_id.as_deref().is_some_and(|id| !id.is_empty())
    }

    pub fn has_session_id(&self) -> bool {
        self.session_id.as_deref().is_some_and(|id| !id.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        !self.has_customer_id() && !self.has_session_id()
    }

    /// Fill tags missing here from `defaults`
    #[must_use]
    pub fn or(mut self, defaults: &LogContext) -> Self {
        if !self.has_customer_id() {
            self.customer_id = defaults.customer_id.clone();
        }
        if !self.has_session_id() {
            self.session_id = defaults.session_id.clone();
        }
        self
    }
}
