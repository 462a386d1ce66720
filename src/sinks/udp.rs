//! UDP sink for remote logging
//!
//! Sends each entry as one JSON datagram. Useful for shipping logs to a
//! collector without holding a connection open.

use crate::core::{AsyncSink, LogEntry, LoggerError, Result, SignalListener};
use async_trait::async_trait;
use std::net::SocketAddr;
use tokio::net::{lookup_host, UdpSocket};

/// Largest payload a single UDP datagram can carry over IPv4
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Asynchronous sink that sends entries to a remote collector over UDP
///
/// # Example
///
/// ```no_run
/// use rust_log_facade::prelude::*;
/// use rust_log_facade::sinks::UdpSink;
///
/// # async fn example() -> rust_log_facade::Result<()> {
/// let factory = LogFactory::builder()
///     .async_sink(UdpSink::connect("127.0.0.1:5140").await?)
///     .build()?;
///
/// factory.create("App")?.info("sent to 127.0.0.1:5140");
/// factory.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct UdpSink {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpSink {
    /// Resolve `target` and bind a local socket of the matching family.
    ///
    /// # Errors
    ///
    /// Returns an error if the address does not resolve or binding fails
    pub async fn connect(target: &str) -> Result<Self> {
        let target = lookup_host(target)
            .await
            .map_err(|e| LoggerError::io_operation("resolving udp target", target, e))?
            .next()
            .ok_or_else(|| LoggerError::config("UdpSink", format!("'{}' did not resolve", target)))?;

        let local: SocketAddr = if target.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|e| LoggerError::io_operation("binding udp socket", local.to_string(), e))?;

        Ok(Self { socket, target })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

#[async_trait]
impl AsyncSink for UdpSink {
    async fn deliver(&self, entry: &LogEntry, _abort: &SignalListener) -> Result<()> {
        let payload = serde_json::to_vec(entry)?;
        if payload.len() > MAX_DATAGRAM_SIZE {
            return Err(LoggerError::delivery(
                self.name(),
                format!("entry is {} bytes, larger than one datagram", payload.len()),
            ));
        }

        self.socket
            .send_to(&payload, self.target)
            .await
            .map_err(|e| LoggerError::io_operation("sending datagram", self.target.to_string(), e))?;
        Ok(())
    }

    fn name(&self) -> &str {
        "udp"
    }
}
