//! The contract between the messaging agent and a text transport.
//!
//! A [`Transport`] opens connections; each connection is represented by a
//! [`TransportHandle`] used to write, close or cancel it. Everything the
//! connection observes is reported asynchronously as a [`TransportEvent`]
//! through the [`EventSink`] supplied to [`Transport::open`].

use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Normal closure status code.
pub const CLOSE_NORMAL: u16 = 1000;

/// Maximum size of a close reason in bytes (a control frame payload is 125
/// bytes, two of which carry the code).
pub const MAX_CLOSE_REASON_LEN: usize = 123;

/// Errors returned by transport operations or reported as failure events.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The connection is already closed or its worker has stopped.
    #[error("transport closed")]
    Closed,
    /// Close code outside the ranges an endpoint may send.
    #[error("invalid close code: {0}")]
    InvalidCloseCode(u16),
    /// Close reason longer than 123 bytes.
    #[error("close reason too long: {0} bytes")]
    ReasonTooLong(usize),
    /// Connect, write or liveness deadline expired.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    /// No async runtime is available to drive the connection.
    #[error("runtime unavailable: {0}")]
    Runtime(String),
    /// WebSocket protocol or I/O error.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
}

/// Check a close request the way RFC 6455 constrains what an endpoint may
/// send: codes 1000-1003, 1007-1014 and 3000-4999, reason at most 123 bytes.
pub fn validate_close(code: u16, reason: Option<&str>) -> Result<(), TransportError> {
    match code {
        1000..=1003 | 1007..=1014 | 3000..=4999 => {}
        _ => return Err(TransportError::InvalidCloseCode(code)),
    }
    let len = reason.map_or(0, str::len);
    if len > MAX_CLOSE_REASON_LEN {
        return Err(TransportError::ReasonTooLong(len));
    }
    Ok(())
}

/// Timeouts applied when opening a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    /// Interval between keep-alive pings.
    pub keep_alive_interval: Duration,
}

impl OpenOptions {
    /// Use the same duration for every timeout and the keep-alive interval.
    pub fn uniform(timeout: Duration) -> Self {
        Self {
            connect_timeout: timeout,
            read_timeout: timeout,
            write_timeout: timeout,
            keep_alive_interval: timeout,
        }
    }
}

/// Something that happened on a connection.
#[derive(Debug)]
pub enum TransportEvent {
    /// The connection is established and writable.
    Open,
    /// A text message arrived.
    Text(String),
    /// A binary message arrived.
    Binary(Bytes),
    /// The peer started the closing handshake.
    Closing { code: u16, reason: String },
    /// The connection is fully closed.
    Closed { code: u16, reason: String },
    /// The connection failed; no further events follow.
    Failure(TransportError),
}

/// Receiver of [`TransportEvent`]s, called from the transport's worker.
#[derive(Clone)]
pub struct EventSink {
    deliver: Arc<dyn Fn(TransportEvent) + Send + Sync>,
}

impl EventSink {
    pub fn new<F>(deliver: F) -> Self
    where
        F: Fn(TransportEvent) + Send + Sync + 'static,
    {
        Self {
            deliver: Arc::new(deliver),
        }
    }

    pub fn emit(&self, event: TransportEvent) {
        (self.deliver)(event)
    }
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink").finish_non_exhaustive()
    }
}

/// A live connection.
///
/// Every method must return without waiting on the network.
pub trait TransportHandle: Send + Sync {
    /// Queue a text payload for transmission.
    fn send_text(&self, payload: String) -> Result<(), TransportError>;

    /// Start a graceful close with `code` and an optional `reason`.
    fn close(&self, code: u16, reason: Option<&str>) -> Result<(), TransportError>;

    /// Drop the connection immediately, discarding queued writes.
    fn cancel(&self);
}

/// Factory for connections.
pub trait Transport: Send + Sync {
    type Handle: TransportHandle + 'static;

    /// Start connecting to `url`. Completion or failure is reported through
    /// `events`; events must not be delivered from within this call.
    fn open(
        &self,
        url: &str,
        options: OpenOptions,
        events: EventSink,
    ) -> Result<Self::Handle, TransportError>;
}
