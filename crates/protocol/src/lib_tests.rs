use super::*;

#[test]
fn parse_agent_frame_rejects_garbage() {
    assert!(parse_agent_frame("{not json}").is_err());
}

#[test]
fn parse_browser_frame_rejects_garbage() {
    assert!(parse_browser_frame("[]").is_err());
}

#[test]
fn frame_error_displays_readable_message() {
    let err = parse_agent_frame("nope").unwrap_err();
    assert!(err.to_string().starts_with("malformed frame:"));
}
