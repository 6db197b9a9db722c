//! Minimal STOMP client over WebSocket.
//!
//! An [`Agent`] connects to a broker described by a [`Destination`],
//! announces itself with `CONNECT`, subscribes to topics and delivers every
//! inbound frame to a registered callback.

pub mod agent;
pub mod codec;
pub mod destination;
pub mod frame;
pub mod transport;
pub mod ws;

pub use agent::{Agent, AgentError, Callback, ConnectionState, SendStatus};
pub use codec::{DecodeError, decode, encode, is_heartbeat};
pub use destination::{DEFAULT_TIMEOUT_MS, Destination};
pub use frame::{ContentType, Frame};
pub use transport::{
    EventSink, OpenOptions, Transport, TransportError, TransportEvent, TransportHandle,
};
pub use ws::{WebSocketHandle, WebSocketTransport};
