use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::codec;
use crate::destination::Destination;
use crate::frame::{self, ContentType, Frame};
use crate::transport::{
    CLOSE_NORMAL, EventSink, OpenOptions, Transport, TransportError, TransportEvent,
    TransportHandle,
};
use crate::ws::WebSocketTransport;

/// Reason sent with the close request issued by `disconnect`.
const NORMAL_CLOSURE_REASON: &str = "Normal closure.";

/// Errors returned by `Agent` operations.
///
/// Every error is also logged when it occurs, so callers that only need
/// best-effort delivery may ignore the result.
#[derive(Error, Debug)]
pub enum AgentError {
    /// The destination url does not use the `ws://` or `wss://` scheme.
    #[error("invalid destination: {0}")]
    InvalidDestination(String),
    /// The topic is empty.
    #[error("invalid topic: topic is empty")]
    InvalidTopic,
    /// The topic is already in the subscription set.
    #[error("topic already subscribed: {0}")]
    AlreadySubscribed(String),
    /// The transport refused an open, write or close request.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Lifecycle state of the agent's connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    /// A transport handle exists and the open event has not arrived yet.
    Connecting,
    Connected,
}

/// Outcome of a successful `send` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendStatus {
    /// The frame was queued on the transport.
    Sent,
    /// Not connected; the frame was discarded.
    Dropped,
}

/// Observer of inbound frames: `(topic, frame)` where the topic is the
/// frame's `destination` header.
pub type Callback = Arc<dyn Fn(Option<&str>, &Frame) + Send + Sync>;

struct AgentState<H> {
    state: ConnectionState,
    destination: Option<Destination>,
    handle: Option<H>,
    topics: BTreeSet<String>,
    /// Incremented whenever a handle is opened or torn down; events stamped
    /// with an older value belong to a previous handle.
    generation: u64,
}

impl<H> Default for AgentState<H> {
    fn default() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            destination: None,
            handle: None,
            topics: BTreeSet::new(),
            generation: 0,
        }
    }
}

struct Core<H> {
    state: Mutex<AgentState<H>>,
    callback: Mutex<Option<Callback>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn transmit<H: TransportHandle>(handle: &H, frame: &Frame) -> Result<(), TransportError> {
    debug!(command = %frame.command, destination = ?frame.destination(), "sending frame");
    handle.send_text(codec::encode(frame)).inspect_err(|e| {
        warn!(command = %frame.command, error = %e, "failed to send frame");
    })
}

/// STOMP messaging agent.
///
/// The agent owns at most one transport connection, the set of subscribed
/// topics and a single callback slot. Operations never wait on the network:
/// `connect` returns once the transport handle exists and the STOMP
/// handshake runs when the transport reports that it is open.
///
/// Transport events arrive on the transport's own worker while operations
/// may be called from any thread; all state lives behind one mutex. The
/// callback runs on the transport worker without that mutex held, so it
/// may call back into the agent but should not block.
pub struct Agent<T: Transport = WebSocketTransport> {
    transport: T,
    core: Arc<Core<T::Handle>>,
}

impl Agent<WebSocketTransport> {
    /// Create an agent backed by the WebSocket transport.
    pub fn new() -> Self {
        Self::with_transport(WebSocketTransport::new())
    }
}

impl Default for Agent<WebSocketTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport + Clone> Clone for Agent<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            core: self.core.clone(),
        }
    }
}

impl<T: Transport> Agent<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            core: Arc::new(Core {
                state: Mutex::new(AgentState::default()),
                callback: Mutex::new(None),
            }),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Register the observer for inbound frames, replacing any previous one.
    pub fn set_callback<F>(&self, callback: F)
    where
        F: Fn(Option<&str>, &Frame) + Send + Sync + 'static,
    {
        *lock(&self.core.callback) = Some(Arc::new(callback));
    }

    pub fn clear_callback(&self) {
        *lock(&self.core.callback) = None;
    }

    pub fn state(&self) -> ConnectionState {
        lock(&self.core.state).state
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// The destination of the current connection attempt, if any.
    pub fn destination(&self) -> Option<Destination> {
        lock(&self.core.state).destination.clone()
    }

    /// Subscribed topics in sorted order.
    pub fn subscriptions(&self) -> Vec<String> {
        lock(&self.core.state).topics.iter().cloned().collect()
    }

    /// Open a connection to `destination`.
    ///
    /// An existing connection is torn down first with the same semantics as
    /// [`Agent::disconnect`], which also clears the subscription set. The
    /// transport is opened with every timeout and the keep-alive interval set
    /// to the destination's timeout and the agent enters
    /// [`ConnectionState::Connecting`].
    pub fn connect(&self, destination: Destination) -> Result<(), AgentError> {
        if !destination.has_websocket_scheme() {
            warn!(%destination, "connect: invalid destination");
            return Err(AgentError::InvalidDestination(destination.url().to_string()));
        }

        let mut state = lock(&self.core.state);
        // Never layer a second connection over a live one.
        let _ = Core::teardown(&mut *state);

        info!(%destination, "connect");
        state.generation += 1;
        let events = self.event_sink(state.generation);
        let options = OpenOptions::uniform(destination.timeout());
        let handle = self
            .transport
            .open(destination.url(), options, events)
            .inspect_err(|e| warn!(%destination, error = %e, "connect: transport open failed"))?;

        state.destination = Some(destination);
        state.handle = Some(handle);
        state.state = ConnectionState::Connecting;
        Ok(())
    }

    /// Tear down the current connection.
    ///
    /// Does nothing without a transport handle. A connection that never
    /// reached `Connected` is cancelled; a normal close (1000) is always
    /// requested as well. The agent ends up `Disconnected` with no
    /// destination and no subscriptions even when the close request fails;
    /// that failure is returned.
    pub fn disconnect(&self) -> Result<(), AgentError> {
        let mut state = lock(&self.core.state);
        Core::teardown(&mut *state).map_err(AgentError::from)
    }

    /// Add `topic` to the subscription set.
    ///
    /// When connected the `SUBSCRIBE` frame is sent right away; otherwise it
    /// is sent when the transport opens, together with every other topic.
    /// The subscription id is the destination's client id.
    pub fn subscribe(&self, topic: &str) -> Result<(), AgentError> {
        if topic.is_empty() {
            warn!("subscribe: empty topic");
            return Err(AgentError::InvalidTopic);
        }

        let mut guard = lock(&self.core.state);
        let state = &mut *guard;
        if !state.topics.insert(topic.to_string()) {
            warn!(topic, "subscribe: topic already subscribed");
            return Err(AgentError::AlreadySubscribed(topic.to_string()));
        }

        if state.state != ConnectionState::Connected {
            return Ok(());
        }
        if let (Some(handle), Some(destination)) = (&state.handle, &state.destination) {
            transmit(handle, &frame::to_subscribe(destination.client_id(), topic))?;
        }
        Ok(())
    }

    /// Remove `topic` from the local subscription set. No `UNSUBSCRIBE`
    /// frame is sent. Returns whether the topic was present.
    pub fn unsubscribe(&self, topic: &str) -> bool {
        let removed = lock(&self.core.state).topics.remove(topic);
        debug!(topic, removed, "unsubscribe");
        removed
    }

    /// Send `content` to `topic`.
    ///
    /// Returns [`SendStatus::Dropped`] when not connected; messages are not
    /// queued or retried.
    pub fn send(
        &self,
        topic: &str,
        content: &str,
        content_type: ContentType,
    ) -> Result<SendStatus, AgentError> {
        if topic.is_empty() {
            warn!("send: empty topic");
            return Err(AgentError::InvalidTopic);
        }

        let state = lock(&self.core.state);
        match (&state.state, &state.handle, &state.destination) {
            (ConnectionState::Connected, Some(handle), Some(_)) => {
                transmit(handle, &frame::to_send(topic, content, content_type))?;
                Ok(SendStatus::Sent)
            }
            _ => {
                debug!(topic, state = ?state.state, "send: not connected, dropping message");
                Ok(SendStatus::Dropped)
            }
        }
    }

    /// Send a JSON document to `topic`.
    pub fn send_json(&self, topic: &str, content: &str) -> Result<SendStatus, AgentError> {
        self.send(topic, content, ContentType::Json)
    }

    /// Send plain text to `topic`.
    pub fn send_text(&self, topic: &str, content: &str) -> Result<SendStatus, AgentError> {
        self.send(topic, content, ContentType::Text)
    }

    fn event_sink(&self, generation: u64) -> EventSink {
        let core = Arc::downgrade(&self.core);
        EventSink::new(move |event| {
            if let Some(core) = core.upgrade() {
                core.handle_event(generation, event);
            }
        })
    }
}

impl<H: TransportHandle> Core<H> {
    fn teardown(state: &mut AgentState<H>) -> Result<(), TransportError> {
        let Some(handle) = state.handle.take() else {
            return Ok(());
        };

        let url = state
            .destination
            .as_ref()
            .map(|d| d.url().to_string())
            .unwrap_or_default();
        info!(%url, "disconnect");

        if state.state != ConnectionState::Connected {
            handle.cancel();
        }
        let result = handle.close(CLOSE_NORMAL, Some(NORMAL_CLOSURE_REASON));
        if let Err(e) = &result {
            warn!(%url, error = %e, "disconnect: close failed");
        }

        state.destination = None;
        state.state = ConnectionState::Disconnected;
        state.topics.clear();
        state.generation += 1;
        result
    }

    fn handle_event(&self, generation: u64, event: TransportEvent) {
        let mut state = lock(&self.state);
        if state.generation != generation {
            trace!(generation, current = state.generation, ?event, "ignoring event from stale transport");
            return;
        }

        match event {
            TransportEvent::Text(text) => {
                drop(state);
                self.dispatch(&text);
            }
            other => Self::apply(&mut state, other),
        }
    }

    /// Apply a lifecycle event to the locked state.
    fn apply(state: &mut AgentState<H>, event: TransportEvent) {
        match event {
            TransportEvent::Open => {
                state.state = ConnectionState::Connected;
                let (Some(handle), Some(destination)) = (&state.handle, &state.destination) else {
                    return;
                };
                info!(url = destination.url(), "transport open, sending CONNECT");
                if transmit(handle, &frame::to_connect()).is_err() {
                    return;
                }
                for topic in &state.topics {
                    let subscribe = frame::to_subscribe(destination.client_id(), topic);
                    if transmit(handle, &subscribe).is_err() {
                        return;
                    }
                }
            }
            // Dispatched by `handle_event` without the lock held.
            TransportEvent::Text(_) => {}
            TransportEvent::Binary(bytes) => {
                info!(len = bytes.len(), "binary message ignored");
            }
            TransportEvent::Closing { code, reason } => {
                info!(code, %reason, "transport closing");
                state.state = ConnectionState::Disconnected;
                if let Some(handle) = &state.handle {
                    if let Err(e) = handle.close(CLOSE_NORMAL, None) {
                        warn!(error = %e, "close after closing handshake failed");
                    }
                }
            }
            TransportEvent::Closed { code, reason } => {
                info!(code, %reason, "transport closed");
                state.state = ConnectionState::Disconnected;
            }
            TransportEvent::Failure(e) => {
                warn!(error = %e, state = ?state.state, "transport failure");
            }
        }
    }

    fn dispatch(&self, text: &str) {
        if codec::is_heartbeat(text) {
            trace!("heart-beat received");
            return;
        }
        let frame = match codec::decode(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, len = text.len(), "discarding undecodable frame");
                return;
            }
        };
        if frame.command == "CONNECTED" {
            info!(
                version = frame.get_header("version").unwrap_or(""),
                heart_beat = frame.get_header("heart-beat").unwrap_or(""),
                "broker accepted connection"
            );
        }

        let callback = lock(&self.callback).clone();
        match callback {
            Some(callback) => callback(frame.destination(), &frame),
            None => debug!(command = %frame.command, "no callback registered, frame dropped"),
        }
    }
}
