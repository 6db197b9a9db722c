use clap::Parser;

#[derive(Parser)]
#[command(name = "wsstomp")]
#[command(version)]
#[command(about = "Interactive STOMP over WebSocket client CLI")]
pub struct Cli {
    /// Broker endpoint (ws:// or wss://)
    #[arg(short, long, default_value = "ws://127.0.0.1:8080/cm-websocket")]
    pub url: String,

    /// Client identifier, also used as the subscription id
    #[arg(short, long, default_value = "TmsTms")]
    pub client_id: String,

    /// Connect/read/write timeout and keep-alive interval in ms (<= 0 means 5000)
    #[arg(short, long, default_value_t = 5000, allow_negative_numbers = true)]
    pub timeout_ms: i64,

    /// Topics to subscribe to (can be specified multiple times)
    #[arg(short, long)]
    pub subscribe: Vec<String>,

    /// Send {"name":"<client-id>"} to this topic once connected
    #[arg(long)]
    pub hello: Option<String>,
}
