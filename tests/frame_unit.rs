//! Unit tests for the Frame struct and the outbound frame builders.

use stomp_ws::Frame;
use stomp_ws::frame::{self, ContentType};

// =============================================================================
// Construction Tests
// =============================================================================

#[test]
fn frame_new_creates_empty() {
    let frame = Frame::new("SEND");
    assert_eq!(frame.command, "SEND");
    assert!(frame.headers.is_empty());
    assert!(frame.content.is_empty());
}

#[test]
fn frame_new_with_string() {
    let cmd = String::from("MESSAGE");
    let frame = Frame::new(cmd);
    assert_eq!(frame.command, "MESSAGE");
}

#[test]
fn frame_default_is_empty() {
    let frame = Frame::default();
    assert_eq!(frame.command, "");
    assert!(frame.headers.is_empty());
}

// =============================================================================
// Builder Pattern Tests
// =============================================================================

#[test]
fn frame_header_builder_multiple() {
    let frame = Frame::new("SEND")
        .header("destination", "/queue/test")
        .header("content-type", "text/plain")
        .header("custom-header", "custom-value");
    assert_eq!(frame.headers.len(), 3);
    assert_eq!(frame.get_header("destination"), Some("/queue/test"));
    assert_eq!(frame.get_header("content-type"), Some("text/plain"));
    assert_eq!(frame.get_header("custom-header"), Some("custom-value"));
}

#[test]
fn frame_headers_iterate_in_name_order() {
    let frame = Frame::new("SEND")
        .header("z-header", "z")
        .header("a-header", "a")
        .header("m-header", "m");
    let names: Vec<&str> = frame.headers.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["a-header", "m-header", "z-header"]);
}

#[test]
fn frame_get_header_is_case_sensitive() {
    let frame = Frame::new("MESSAGE").header("Destination", "/topic/a");
    assert_eq!(frame.get_header("destination"), None);
    assert_eq!(frame.get_header("Destination"), Some("/topic/a"));
    assert_eq!(frame.destination(), None);
}

#[test]
fn frame_builder_chain() {
    let frame = Frame::new("SEND")
        .header("destination", "/queue/test")
        .header("content-type", "application/json")
        .set_content("{\"key\": \"value\"}");

    assert_eq!(frame.command, "SEND");
    assert_eq!(frame.headers.len(), 2);
    assert_eq!(frame.content, "{\"key\": \"value\"}");
}

#[test]
fn frame_header_special_characters() {
    let frame = Frame::new("SEND")
        .header("url", "http://example.com:8080/path?query=value&other=123");
    assert_eq!(
        frame.get_header("url"),
        Some("http://example.com:8080/path?query=value&other=123")
    );
}

// =============================================================================
// Display Trait Tests
// =============================================================================

#[test]
fn frame_display_command_and_headers() {
    let frame = Frame::new("SEND")
        .header("destination", "/queue/test")
        .header("content-type", "text/plain");
    let display = format!("{}", frame);
    assert!(display.contains("Command: SEND"));
    assert!(display.contains("destination: /queue/test"));
    assert!(display.contains("content-type: text/plain"));
}

#[test]
fn frame_display_body_length() {
    let frame = Frame::new("SEND").set_content("hello");
    assert!(format!("{}", frame).contains("Body (5 bytes)"));
    assert!(format!("{}", Frame::new("SEND")).contains("Body (0 bytes)"));
}

// =============================================================================
// Equality Tests
// =============================================================================

#[test]
fn frame_eq_ignores_header_insertion_order() {
    let frame1 = Frame::new("SEND").header("a", "1").header("b", "2");
    let frame2 = Frame::new("SEND").header("b", "2").header("a", "1");
    assert_eq!(frame1, frame2);
}

#[test]
fn frame_ne_different_headers() {
    let frame1 = Frame::new("SEND").header("destination", "/queue/a");
    let frame2 = Frame::new("SEND").header("destination", "/queue/b");
    assert_ne!(frame1, frame2);
}

#[test]
fn frame_ne_different_body() {
    let frame1 = Frame::new("SEND").set_content("hello");
    let frame2 = Frame::new("SEND").set_content("world");
    assert_ne!(frame1, frame2);
}

// =============================================================================
// Builders
// =============================================================================

#[test]
fn to_connect_announces_version_and_heartbeat() {
    let f = frame::to_connect();
    assert_eq!(f.command, "CONNECT");
    assert_eq!(f.headers.len(), 2);
    assert_eq!(f.get_header("accept-version"), Some("1.1"));
    assert_eq!(f.get_header("heart-beat"), Some("10000,10000"));
}

#[test]
fn to_subscribe_has_id_and_destination_only() {
    let f = frame::to_subscribe("C1", "/topic/x");
    assert_eq!(f.command, "SUBSCRIBE");
    let pairs: Vec<(&str, &str)> = f
        .headers
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    assert_eq!(pairs, vec![("destination", "/topic/x"), ("id", "C1")]);
    assert!(f.content.is_empty());
}

#[test]
fn to_send_sets_content_type() {
    let f = frame::to_send("/app/hello", "{}", ContentType::Json);
    assert_eq!(f.get_header("content-type"), Some("application/json"));
    assert_eq!(f.get_header("destination"), Some("/app/hello"));

    let f = frame::to_send_text("/app/echo", "ping");
    assert_eq!(f.command, "SEND");
    assert_eq!(f.get_header("content-type"), Some("text/plain"));
    assert_eq!(f.content, "ping");
}

#[test]
fn content_type_strings() {
    assert_eq!(ContentType::Json.as_str(), "application/json");
    assert_eq!(ContentType::Text.as_str(), "text/plain");
}
