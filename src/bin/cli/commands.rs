use stomp_ws::{Agent, SendStatus};

/// Result of executing a command
pub enum CommandResult {
    /// Command executed successfully
    Ok,
    /// Command requests exit
    Quit,
    /// Informational output
    Info(String),
    /// Error executing command
    Error(String),
}

/// Parse and execute a command
pub fn execute_command(line: &str, agent: &Agent) -> CommandResult {
    let parts: Vec<&str> = line.trim().splitn(3, ' ').collect();
    if parts.is_empty() || parts[0].is_empty() {
        return CommandResult::Ok;
    }

    match parts[0] {
        "quit" | "exit" | "q" => CommandResult::Quit,

        "send" | "json" => {
            if parts.len() < 3 {
                return CommandResult::Error(format!("Usage: {} <topic> <message>", parts[0]));
            }
            let (topic, body) = (parts[1], parts[2]);
            let result = if parts[0] == "json" {
                if let Err(e) = serde_json::from_str::<serde_json::Value>(body) {
                    return CommandResult::Error(format!("Invalid JSON: {}", e));
                }
                agent.send_json(topic, body)
            } else {
                agent.send_text(topic, body)
            };
            match result {
                Ok(SendStatus::Sent) => CommandResult::Ok,
                Ok(SendStatus::Dropped) => {
                    CommandResult::Error("Not connected, message dropped".to_string())
                }
                Err(e) => CommandResult::Error(format!("Send error: {}", e)),
            }
        }

        "sub" | "subscribe" => {
            if parts.len() < 2 {
                return CommandResult::Error("Usage: sub <topic>".to_string());
            }
            match agent.subscribe(parts[1]) {
                Ok(()) => CommandResult::Info(format!("Subscribed to: {}", parts[1])),
                Err(e) => CommandResult::Error(format!("Subscribe error: {}", e)),
            }
        }

        "unsub" | "unsubscribe" => {
            if parts.len() < 2 {
                return CommandResult::Error("Usage: unsub <topic>".to_string());
            }
            if agent.unsubscribe(parts[1]) {
                CommandResult::Info(format!("Unsubscribed from: {}", parts[1]))
            } else {
                CommandResult::Error(format!("Not subscribed: {}", parts[1]))
            }
        }

        "state" | "status" => {
            let destination = agent
                .destination()
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string());
            CommandResult::Info(format!(
                "State: {:?}\nDestination: {}\nSubscriptions: {}",
                agent.state(),
                destination,
                agent.subscriptions().join(", ")
            ))
        }

        "help" | "?" => {
            print_help();
            CommandResult::Ok
        }

        _ => CommandResult::Error(format!("Unknown command: {}. Type 'help' for commands.", parts[0])),
    }
}

/// Print help text
pub fn print_help() {
    println!("Commands:");
    println!("  send <topic> <message>  - Send a text/plain message");
    println!("  json <topic> <json>     - Send an application/json message");
    println!("  sub <topic>             - Subscribe to a topic");
    println!("  unsub <topic>           - Forget a topic locally");
    println!("  state                   - Show connection state and subscriptions");
    println!("  quit                    - Disconnect and exit");
}
