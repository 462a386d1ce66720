//! Built-in sink implementations

#[cfg(feature = "console")]
pub mod console;
pub mod udp;

#[cfg(feature = "console")]
pub use console::ConsoleSink;
pub use udp::UdpSink;

pub use crate::core::{AsyncSink, Sink};
