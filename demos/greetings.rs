//! Subscribe before connecting, greet once connected, then stay connected
//! and log everything until Ctrl-C.

use std::time::Duration;
use stomp_ws::{Agent, Destination};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ws://127.0.0.1:8080/cm-websocket".to_string());
    let destination = Destination::new(url, "TmsTms", 5000);
    let client_id = destination.client_id().to_string();

    let agent = Agent::new();
    agent.set_callback(|topic, frame| {
        println!("{} <- {}: {}", topic.unwrap_or("-"), frame.command, frame.content);
    });
    agent.subscribe("/topic/greetings")?;
    agent.connect(destination)?;

    let mut tick = tokio::time::interval(Duration::from_secs(10));
    tick.tick().await;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = tick.tick() => {
                let body = format!("{{\"name\":\"{}\"}}", client_id);
                println!("hello -> {:?}", agent.send_json("/app/hello", &body)?);
            }
        }
    }

    agent.disconnect()?;
    Ok(())
}
