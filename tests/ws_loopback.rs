//! End-to-end tests against a WebSocket server on the loopback interface.

use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::{CloseFrame, frame::coding::CloseCode};

use stomp_ws::{
    Agent, AgentError, ConnectionState, Destination, EventSink, Frame, OpenOptions, SendStatus,
    Transport, TransportError, WebSocketTransport, decode,
};

const WAIT: Duration = Duration::from_secs(5);

type Inbound = mpsc::UnboundedReceiver<(Option<String>, Frame)>;

fn recording_agent() -> (Agent, Inbound) {
    let agent = Agent::new();
    let (tx, rx) = mpsc::unbounded_channel();
    agent.set_callback(move |topic, frame| {
        let _ = tx.send((topic.map(str::to_string), frame.clone()));
    });
    (agent, rx)
}

async fn next_frame(rx: &mut Inbound) -> (Option<String>, Frame) {
    timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for a frame")
        .expect("callback channel closed")
}

async fn wait_for_state(agent: &Agent, expected: ConnectionState) {
    let deadline = tokio::time::Instant::now() + WAIT;
    while agent.state() != expected {
        assert!(
            tokio::time::Instant::now() < deadline,
            "agent stuck in {:?}, expected {:?}",
            agent.state(),
            expected
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// A tiny broker: answers CONNECT with CONNECTED, confirms each SUBSCRIBE
/// with a MESSAGE on that topic and echoes SEND bodies to `/topic/echo`.
/// Returns the commands it received once the client goes away.
async fn serve_one(listener: TcpListener) -> Vec<String> {
    let (tcp, _) = listener.accept().await.expect("accept");
    let mut ws = accept_async(tcp).await.expect("handshake");
    let mut seen = Vec::new();

    while let Some(msg) = ws.next().await {
        let text = match msg {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => continue,
        };
        let frame = decode(text.as_str()).expect("client sent a bad frame");
        seen.push(frame.command.clone());
        let reply = match frame.command.as_str() {
            "CONNECT" => "CONNECTED\nversion:1.1\nheart-beat:0,0\n\n\0".to_string(),
            "SUBSCRIBE" => format!(
                "MESSAGE\ndestination:{}\nsubscription:{}\nmessage-id:1\n\nwelcome\0",
                frame.get_header("destination").unwrap_or_default(),
                frame.get_header("id").unwrap_or_default()
            ),
            "SEND" => format!(
                "MESSAGE\ndestination:/topic/echo\nmessage-id:2\n\n{}\0",
                frame.content
            ),
            _ => continue,
        };
        // Heart-beat ahead of the reply; the agent must skip it.
        if ws.send(Message::text("\n")).await.is_err() || ws.send(Message::text(reply)).await.is_err() {
            break;
        }
    }
    seen
}

#[tokio::test]
async fn stomp_session_over_loopback() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let server = tokio::spawn(serve_one(listener));

    let (agent, mut rx) = recording_agent();
    agent.subscribe("/topic/greetings").expect("subscribe");
    agent
        .connect(Destination::new(format!("ws://{addr}/cm-websocket"), "TmsTms", 2000))
        .expect("connect");

    let (topic, connected) = next_frame(&mut rx).await;
    assert_eq!(topic, None);
    assert_eq!(connected.command, "CONNECTED");
    assert_eq!(connected.get_header("version"), Some("1.1"));
    assert!(agent.is_connected());

    let (topic, welcome) = next_frame(&mut rx).await;
    assert_eq!(topic.as_deref(), Some("/topic/greetings"));
    assert_eq!(welcome.get_header("subscription"), Some("TmsTms"));
    assert_eq!(welcome.content, "welcome");

    let status = agent
        .send_json("/app/hello", "{\"name\":\"TmsTms\"}")
        .expect("send");
    assert_eq!(status, SendStatus::Sent);
    let (topic, echo) = next_frame(&mut rx).await;
    assert_eq!(topic.as_deref(), Some("/topic/echo"));
    assert_eq!(echo.content, "{\"name\":\"TmsTms\"}");

    agent.disconnect().expect("disconnect");
    assert_eq!(agent.state(), ConnectionState::Disconnected);

    let seen = timeout(WAIT, server)
        .await
        .expect("server did not finish")
        .expect("server panicked");
    assert_eq!(seen, vec!["CONNECT", "SUBSCRIBE", "SEND"]);
}

#[tokio::test]
async fn server_close_moves_agent_to_disconnected() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.expect("accept");
        let mut ws = accept_async(tcp).await.expect("handshake");
        // Wait for CONNECT, then go away.
        let _ = ws.next().await;
        ws.close(Some(CloseFrame {
            code: CloseCode::Away,
            reason: "bye".into(),
        }))
        .await
        .expect("close");
        while ws.next().await.is_some() {}
    });

    let (agent, _rx) = recording_agent();
    agent
        .connect(Destination::new(format!("ws://{addr}/"), "c", 2000))
        .expect("connect");
    // Connecting -> Connected -> Disconnected; the middle state may be too
    // short-lived to observe.
    wait_for_state(&agent, ConnectionState::Disconnected).await;

    timeout(WAIT, server)
        .await
        .expect("server did not finish")
        .expect("server panicked");
    // The handle is still held until disconnect.
    assert!(agent.destination().is_some());
    agent.disconnect().expect("disconnect");
    assert!(agent.destination().is_none());
}

#[tokio::test]
async fn refused_connection_keeps_agent_connecting() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let (agent, _rx) = recording_agent();
    agent
        .connect(Destination::new(format!("ws://{addr}/"), "c", 500))
        .expect("connect");
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(agent.state(), ConnectionState::Connecting);
    assert_eq!(agent.send_text("/app/x", "y").expect("send"), SendStatus::Dropped);
    agent.disconnect().expect("disconnect");
    assert_eq!(agent.state(), ConnectionState::Disconnected);
}

#[test]
fn open_outside_runtime_fails() {
    let result = WebSocketTransport::new().open(
        "ws://127.0.0.1:1/",
        OpenOptions::uniform(Duration::from_millis(100)),
        EventSink::new(|_| {}),
    );
    assert!(matches!(result, Err(TransportError::Runtime(_))));

    let agent = Agent::new();
    let err = agent
        .connect(Destination::new("ws://127.0.0.1:1/", "c", 100))
        .unwrap_err();
    assert!(matches!(err, AgentError::Transport(TransportError::Runtime(_))));
    assert_eq!(agent.state(), ConnectionState::Disconnected);
}
