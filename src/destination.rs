use std::fmt;
use std::time::Duration;

/// Timeout used when a non-positive value is supplied.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

const WS_SCHEMES: [&str; 2] = ["ws://", "wss://"];

/// Where the agent connects and which identity it presents.
///
/// A `Destination` is an immutable value: the agent keeps its own copy for
/// the lifetime of a connection and a new one replaces it on reconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    url: String,
    client_id: String,
    timeout_ms: u64,
}

impl Destination {
    /// Build a destination.
    ///
    /// Parameters
    /// - `url`: broker endpoint, e.g. `ws://127.0.0.1:8080/cm-websocket`.
    /// - `client_id`: identity used as the subscription id.
    /// - `timeout_ms`: connect/read/write timeout and keep-alive interval in
    ///   milliseconds. Zero or negative values fall back to
    ///   [`DEFAULT_TIMEOUT_MS`].
    pub fn new(url: impl Into<String>, client_id: impl Into<String>, timeout_ms: i64) -> Self {
        let timeout_ms = if timeout_ms <= 0 {
            DEFAULT_TIMEOUT_MS
        } else {
            timeout_ms as u64
        };
        Self {
            url: url.into(),
            client_id: client_id.into(),
            timeout_ms,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Whether the url starts with `ws://` or `wss://`.
    pub fn has_websocket_scheme(&self) -> bool {
        WS_SCHEMES.iter().any(|scheme| self.url.starts_with(scheme))
    }
}

impl Default for Destination {
    fn default() -> Self {
        Self::new("", "", 0)
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{url={} timeout={}, client={}}}",
            self.url, self.timeout_ms, self.client_id
        )
    }
}
