use std::time::Duration;
use stomp_ws::{Agent, Destination};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // This example expects a STOMP-over-WebSocket endpoint on localhost:8080
    // (e.g. a Spring Boot app with a simple broker mapped at /cm-websocket).

    let agent = Agent::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    agent.set_callback(move |topic, frame| {
        let _ = tx.send((topic.map(str::to_string), frame.clone()));
    });

    agent.subscribe("/topic/greetings")?;
    agent.connect(Destination::new("ws://127.0.0.1:8080/cm-websocket", "quickstart", 5000))?;

    // Give the handshake a moment, then say hello.
    tokio::time::sleep(Duration::from_secs(1)).await;
    let status = agent.send_json("/app/hello", "{\"name\":\"quickstart\"}")?;
    println!("send: {:?}", status);

    // Print whatever arrives in the next 5s.
    let deadline = tokio::time::sleep(Duration::from_secs(5));
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            Some((topic, frame)) = rx.recv() => {
                println!("received on {}:\n{}", topic.as_deref().unwrap_or("-"), frame);
            }
        }
    }

    agent.disconnect()?;
    Ok(())
}
