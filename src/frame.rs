use std::collections::BTreeMap;
use std::fmt;

pub const COMMAND_CONNECT: &str = "CONNECT";
pub const COMMAND_SUBSCRIBE: &str = "SUBSCRIBE";
pub const COMMAND_SEND: &str = "SEND";

pub const HEADER_ACCEPT_VERSION: &str = "accept-version";
pub const HEADER_HEARTBEAT: &str = "heart-beat";
pub const HEADER_ID: &str = "id";
pub const HEADER_DESTINATION: &str = "destination";
pub const HEADER_CONTENT_TYPE: &str = "content-type";

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_TEXT: &str = "text/plain";

/// Protocol version advertised in `CONNECT`.
pub const ACCEPT_VERSION: &str = "1.1";
/// Heart-beat intervals (ms) advertised in `CONNECT`.
pub const CLIENT_HEARTBEAT: &str = "10000,10000";

/// A text STOMP frame.
///
/// `Frame` contains the command (e.g. "SEND", "MESSAGE"), a header map and
/// the text body. Header names are unique and case-sensitive; the map is
/// ordered so that encoding iterates deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    /// STOMP command (e.g. CONNECT, SEND, SUBSCRIBE)
    pub command: String,
    /// Headers keyed by name
    pub headers: BTreeMap<String, String>,
    /// Frame body, possibly empty
    pub content: String,
}

impl Frame {
    /// Create a new frame with the given command and empty headers/body.
    ///
    /// Parameters
    /// - `command`: the STOMP command name (for example, `"SEND"` or
    ///   `"SUBSCRIBE"`). Accepts any type convertible into `String`.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            headers: BTreeMap::new(),
            content: String::new(),
        }
    }

    /// Set a header (builder style). A header with the same name is replaced.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set the frame body (builder style).
    pub fn set_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Get the value of a header by name (case-sensitive).
    pub fn get_header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    /// The `destination` header, used as the topic of inbound frames.
    pub fn destination(&self) -> Option<&str> {
        self.get_header(HEADER_DESTINATION)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Command: {}", self.command)?;
        for (k, v) in &self.headers {
            writeln!(f, "{}: {}", k, v)?;
        }
        writeln!(f, "Body ({} bytes)", self.content.len())
    }
}

/// Content type of an outbound `SEND` frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Json,
    Text,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Json => CONTENT_TYPE_JSON,
            ContentType::Text => CONTENT_TYPE_TEXT,
        }
    }
}

/// `CONNECT` frame announcing protocol 1.1 and 10s heart-beats both ways.
pub fn to_connect() -> Frame {
    Frame::new(COMMAND_CONNECT)
        .header(HEADER_ACCEPT_VERSION, ACCEPT_VERSION)
        .header(HEADER_HEARTBEAT, CLIENT_HEARTBEAT)
}

/// `SUBSCRIBE` frame for `topic` using `id` as the subscription id.
pub fn to_subscribe(id: &str, topic: &str) -> Frame {
    Frame::new(COMMAND_SUBSCRIBE)
        .header(HEADER_ID, id)
        .header(HEADER_DESTINATION, topic)
}

/// `SEND` frame carrying `content` with the given content type.
pub fn to_send(topic: &str, content: &str, content_type: ContentType) -> Frame {
    Frame::new(COMMAND_SEND)
        .header(HEADER_DESTINATION, topic)
        .header(HEADER_CONTENT_TYPE, content_type.as_str())
        .set_content(content)
}

pub fn to_send_json(topic: &str, content: &str) -> Frame {
    to_send(topic, content, ContentType::Json)
}

pub fn to_send_text(topic: &str, content: &str) -> Frame {
    to_send(topic, content, ContentType::Text)
}
