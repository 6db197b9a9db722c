use std::io::{self, BufRead, Write};
use std::time::Duration;
use stomp_ws::{Agent, AgentError, Destination, Frame, SendStatus};
use tokio::sync::mpsc;

use super::args::Cli;
use super::commands::{CommandResult, execute_command, print_help};
use super::exit_codes;

/// Run the CLI: subscribe, connect, optionally greet, then read commands
/// until `quit`, end of input or Ctrl-C.
pub async fn run(cli: &Cli) -> Result<(), (String, u8)> {
    let agent = Agent::new();
    agent.set_callback(print_frame);

    for topic in &cli.subscribe {
        if let Err(e) = agent.subscribe(topic) {
            eprintln!("Skipping subscription '{}': {}", topic, e);
        }
    }

    let destination = Destination::new(&cli.url, &cli.client_id, cli.timeout_ms);
    let timeout = destination.timeout();
    println!("Connecting to {}...", destination);
    agent.connect(destination).map_err(format_connect_error)?;

    if let Some(topic) = &cli.hello {
        greet(&agent, topic, &cli.client_id, timeout).await;
    }

    // Channel to receive user commands from stdin reader
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<String>(16);

    // Spawn blocking stdin reader
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(l) => {
                    if cmd_tx.blocking_send(l).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    println!();
    print_help();
    println!();

    loop {
        print!("> ");
        let _ = io::stdout().flush();

        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = cmd_rx.recv() => match line {
                Some(l) => l,
                None => break,
            },
        };

        match execute_command(&line, &agent) {
            CommandResult::Ok => {}
            CommandResult::Quit => break,
            CommandResult::Info(msg) => println!("{}", msg),
            CommandResult::Error(msg) => eprintln!("{}", msg),
        }
    }

    println!("Disconnecting...");
    if let Err(e) = agent.disconnect() {
        eprintln!("Disconnect error: {}", e);
    }
    Ok(())
}

/// Wait for the connection to come up and send the JSON greeting.
async fn greet(agent: &Agent, topic: &str, client_id: &str, timeout: Duration) {
    let deadline = tokio::time::Instant::now() + timeout;
    while !agent.is_connected() && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let body = serde_json::json!({ "name": client_id }).to_string();
    match agent.send_json(topic, &body) {
        Ok(SendStatus::Sent) => println!("Sent {} to {}", body, topic),
        Ok(SendStatus::Dropped) => eprintln!("Not connected after {:?}, greeting dropped", timeout),
        Err(e) => eprintln!("Greeting failed: {}", e),
    }
}

/// Print an inbound frame
fn print_frame(topic: Option<&str>, frame: &Frame) {
    let now = chrono::Local::now().format("%H:%M:%S%.3f");
    println!("\n[{}] {} {}", now, topic.unwrap_or("-"), frame.command);
    for (k, v) in &frame.headers {
        println!("  {}: {}", k, v);
    }
    if !frame.content.is_empty() {
        println!("  Body: {}", frame.content);
    }
    print!("> ");
    let _ = io::stdout().flush();
}

/// Map a connect error to a message and exit code
fn format_connect_error(err: AgentError) -> (String, u8) {
    match err {
        AgentError::InvalidDestination(url) => (
            format!("Invalid destination '{}': expected a ws:// or wss:// url", url),
            exit_codes::USAGE_ERROR,
        ),
        other => (format!("Connection failed: {}", other), exit_codes::CONNECT_ERROR),
    }
}
