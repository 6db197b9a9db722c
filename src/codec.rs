use std::collections::BTreeMap;
use thiserror::Error;

use crate::frame::Frame;

/// Errors produced while decoding an inbound text frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The payload had no command line.
    #[error("frame has no command")]
    MissingCommand,
}

/// Encode a `Frame` into its text wire form.
///
/// The output is `COMMAND\n`, one `name:value\n` line per header (in header
/// name order), a blank line, the body and a trailing NUL. Header values are
/// not escaped: a value containing a newline or a colon corrupts framing.
pub fn encode(frame: &Frame) -> String {
    let headers_len: usize = frame
        .headers
        .iter()
        .map(|(k, v)| k.len() + v.len() + 2)
        .sum();
    let mut out =
        String::with_capacity(frame.command.len() + headers_len + frame.content.len() + 3);

    out.push_str(&frame.command);
    out.push('\n');
    for (k, v) in &frame.headers {
        out.push_str(k);
        out.push(':');
        out.push_str(v);
        out.push('\n');
    }
    out.push('\n');
    out.push_str(&frame.content);
    out.push('\0');
    out
}

/// Decode one text frame.
///
/// Parsing rules:
/// - Everything from the first NUL on is discarded; the NUL ends the frame.
/// - Leading EOLs (heart-beats that preceded the frame) are skipped.
/// - The first line, trimmed, is the command.
/// - Following lines up to the first blank line are headers, split on the
///   first colon with both sides trimmed. A line without a colon is a header
///   with an empty value. When a name repeats, the last value is kept.
/// - The rest is the body with surrounding whitespace trimmed; inner
///   newlines are kept.
pub fn decode(text: &str) -> Result<Frame, DecodeError> {
    let text = match text.find('\0') {
        Some(end) => &text[..end],
        None => text,
    };
    let text = text.trim_start_matches(['\r', '\n']);

    let mut lines = text.split_inclusive('\n');
    let first = lines.next().unwrap_or_default();
    let command = first.trim();
    if command.is_empty() {
        return Err(DecodeError::MissingCommand);
    }

    let mut offset = first.len();
    let mut headers = BTreeMap::new();
    let mut has_body = false;
    for raw in lines {
        offset += raw.len();
        let line = raw.trim();
        if line.is_empty() {
            has_body = true;
            break;
        }
        let (name, value) = match line.split_once(':') {
            Some((name, value)) => (name.trim(), value.trim()),
            None => (line, ""),
        };
        headers.insert(name.to_string(), value.to_string());
    }

    let content = if has_body { text[offset..].trim() } else { "" };

    Ok(Frame {
        command: command.to_string(),
        headers,
        content: content.to_string(),
    })
}

/// Returns true when `text` is a STOMP heart-beat: one or more EOLs and
/// nothing else.
pub fn is_heartbeat(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b == b'\n' || b == b'\r')
}
