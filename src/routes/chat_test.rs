use super::*;

#[test]
fn validate_accepts_normal_message() {
    assert!(validate_message("What projects are on this site?").is_ok());
}

#[test]
fn validate_rejects_blank() {
    assert!(validate_message("").is_err());
    assert!(validate_message(" \n\t").is_err());
}

#[test]
fn validate_counts_chars_not_bytes() {
    let at_limit = "é".repeat(MAX_MESSAGE_CHARS);
    assert!(at_limit.len() > MAX_MESSAGE_CHARS);
    assert!(validate_message(&at_limit).is_ok());

    let over = "a".repeat(MAX_MESSAGE_CHARS + 1);
    let err = validate_message(&over).unwrap_err();
    assert!(err.contains("at most 500"), "{err}");
}

#[test]
fn chat_response_omits_missing_timing() {
    let resp = ChatResponse { response: "hi".into(), timestamp: "t".into(), response_time_ms: None };
    let json = serde_json::to_value(&resp).unwrap();
    assert!(json.get("response_time_ms").is_none());
}

#[test]
fn chat_response_timestamp_is_rfc3339() {
    let resp = ChatResponse::new("hi".into(), Instant::now());
    assert!(resp.timestamp.contains('T'), "{}", resp.timestamp);
    assert!(resp.timestamp.ends_with('Z'), "{}", resp.timestamp);
    assert!(resp.response_time_ms.is_some());
}
