use futures::{Sink, SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{
    self, Message,
    protocol::{CloseFrame, frame::coding::CloseCode},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::transport::{
    CLOSE_NORMAL, EventSink, OpenOptions, Transport, TransportError, TransportEvent,
    TransportHandle, validate_close,
};

/// Status reported when the peer closed without a code.
const CLOSE_NO_STATUS: u16 = 1005;

/// Commands queued from a `WebSocketHandle` to its worker task.
enum Command {
    Text(String),
    Close { code: u16, reason: String },
}

/// [`Transport`] backed by `tokio-tungstenite`.
///
/// Each `open` spawns one worker task on the current Tokio runtime. The task
/// owns the socket, writes queued payloads, sends keep-alive pings and
/// reports everything it observes through the [`EventSink`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for WebSocketTransport {
    type Handle = WebSocketHandle;

    fn open(
        &self,
        url: &str,
        options: OpenOptions,
        events: EventSink,
    ) -> Result<WebSocketHandle, TransportError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| TransportError::Runtime(e.to_string()))?;
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        runtime.spawn(run_connection(
            url.to_string(),
            options,
            events,
            commands_rx,
            cancel.clone(),
        ));

        Ok(WebSocketHandle {
            commands: commands_tx,
            cancel,
            close_requested: AtomicBool::new(false),
        })
    }
}

/// Handle to a connection opened by [`WebSocketTransport`].
///
/// Dropping the handle without closing it starts a normal close.
pub struct WebSocketHandle {
    commands: mpsc::UnboundedSender<Command>,
    cancel: CancellationToken,
    close_requested: AtomicBool,
}

impl TransportHandle for WebSocketHandle {
    fn send_text(&self, payload: String) -> Result<(), TransportError> {
        if self.close_requested.load(Ordering::SeqCst) || self.cancel.is_cancelled() {
            return Err(TransportError::Closed);
        }
        self.commands
            .send(Command::Text(payload))
            .map_err(|_| TransportError::Closed)
    }

    fn close(&self, code: u16, reason: Option<&str>) -> Result<(), TransportError> {
        validate_close(code, reason)?;
        if self.close_requested.swap(true, Ordering::SeqCst) || self.cancel.is_cancelled() {
            return Ok(());
        }
        // A stopped worker has nothing left to close.
        let _ = self.commands.send(Command::Close {
            code,
            reason: reason.unwrap_or_default().to_string(),
        });
        Ok(())
    }

    fn cancel(&self) {
        self.cancel.cancel();
    }
}

async fn write<S>(sink: &mut S, msg: Message, limit: Duration) -> Result<(), TransportError>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    match tokio::time::timeout(limit, sink.send(msg)).await {
        Ok(res) => res.map_err(TransportError::from),
        Err(_) => Err(TransportError::Timeout(limit)),
    }
}

fn close_message(code: u16, reason: String) -> Message {
    Message::Close(Some(CloseFrame {
        code: CloseCode::from(code),
        reason: reason.into(),
    }))
}

async fn run_connection(
    url: String,
    options: OpenOptions,
    events: EventSink,
    mut commands: mpsc::UnboundedReceiver<Command>,
    cancel: CancellationToken,
) {
    let connect = tokio::time::timeout(options.connect_timeout, connect_async(url.as_str()));
    let ws = tokio::select! {
        _ = cancel.cancelled() => {
            debug!(%url, "connect cancelled");
            return;
        }
        res = connect => match res {
            Ok(Ok((ws, _response))) => ws,
            Ok(Err(e)) => {
                events.emit(TransportEvent::Failure(e.into()));
                return;
            }
            Err(_) => {
                events.emit(TransportEvent::Failure(TransportError::Timeout(options.connect_timeout)));
                return;
            }
        }
    };

    events.emit(TransportEvent::Open);

    let (mut sink, mut stream) = ws.split();
    let keep_alive = options.keep_alive_interval.max(Duration::from_millis(1));
    let mut ping = tokio::time::interval_at(Instant::now() + keep_alive, keep_alive);
    let mut seen_since_ping = true;

    // Set once a Close frame was sent or received; from then on only the
    // remaining inbound traffic is drained.
    let mut closing = false;
    let mut close_deadline = Instant::now();
    let mut close_code = CLOSE_NO_STATUS;
    let mut close_reason = String::new();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(%url, "connection cancelled");
                return;
            }
            _ = tokio::time::sleep_until(close_deadline), if closing => {
                debug!(%url, "closing handshake timed out");
                break;
            }
            cmd = commands.recv(), if !closing => {
                let (code, reason) = match cmd {
                    Some(Command::Text(payload)) => {
                        if let Err(e) = write(&mut sink, Message::text(payload), options.write_timeout).await {
                            events.emit(TransportEvent::Failure(e));
                            return;
                        }
                        continue;
                    }
                    Some(Command::Close { code, reason }) => (code, reason),
                    None => (CLOSE_NORMAL, String::new()),
                };
                closing = true;
                close_deadline = Instant::now() + options.read_timeout;
                close_code = code;
                close_reason = reason.clone();
                if let Err(e) = write(&mut sink, close_message(code, reason), options.write_timeout).await {
                    debug!(%url, error = %e, "failed to send close frame");
                    break;
                }
            }
            _ = ping.tick(), if !closing => {
                if !seen_since_ping {
                    events.emit(TransportEvent::Failure(TransportError::Timeout(options.read_timeout)));
                    return;
                }
                seen_since_ping = false;
                if let Err(e) = write(&mut sink, Message::Ping(Default::default()), options.write_timeout).await {
                    events.emit(TransportEvent::Failure(e));
                    return;
                }
            }
            msg = stream.next() => {
                seen_since_ping = true;
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        events.emit(TransportEvent::Text(text.as_str().to_owned()));
                    }
                    Some(Ok(Message::Binary(bytes))) => {
                        events.emit(TransportEvent::Binary(bytes));
                    }
                    Some(Ok(Message::Close(frame))) => {
                        if let Some(frame) = frame {
                            close_code = u16::from(frame.code);
                            close_reason = frame.reason.as_str().to_owned();
                        } else {
                            close_code = CLOSE_NO_STATUS;
                            close_reason.clear();
                        }
                        if !closing {
                            // The reply is queued by tungstenite itself.
                            closing = true;
                            close_deadline = Instant::now() + options.read_timeout;
                            events.emit(TransportEvent::Closing {
                                code: close_code,
                                reason: close_reason.clone(),
                            });
                        }
                    }
                    Some(Ok(other)) => {
                        trace!(%url, kind = ?other, "control message");
                    }
                    Some(Err(e)) => {
                        events.emit(TransportEvent::Failure(e.into()));
                        return;
                    }
                    None => break,
                }
            }
        }
    }

    events.emit(TransportEvent::Closed {
        code: close_code,
        reason: close_reason,
    });
}
