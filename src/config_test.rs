use super::*;

#[test]
fn defaults_when_nothing_set() {
    let cfg = ServerConfig::from_vars(None, None, None).unwrap();
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.socket_addr(), "0.0.0.0:8080".parse().unwrap());
    assert_eq!(cfg.cors_origins, vec!["http://localhost:3000", "http://localhost:5173"]);
}

#[test]
fn explicit_port_and_bind_addr() {
    let cfg = ServerConfig::from_vars(Some(" 9000 "), Some("127.0.0.1"), None).unwrap();
    assert_eq!(cfg.socket_addr(), "127.0.0.1:9000".parse().unwrap());
}

#[test]
fn invalid_port_errors() {
    let err = ServerConfig::from_vars(Some("eighty"), None, None).unwrap_err();
    assert_eq!(err.to_string(), "invalid PORT: \"eighty\"");
}

#[test]
fn invalid_bind_addr_errors() {
    assert!(matches!(
        ServerConfig::from_vars(None, Some("localhost"), None),
        Err(ConfigError::Invalid { var: "BIND_ADDR", .. })
    ));
}

#[test]
fn origins_are_trimmed_and_blank_entries_dropped() {
    let cfg = ServerConfig::from_vars(None, None, Some(" https://example.com/ ,, http://localhost:5173")).unwrap();
    assert_eq!(cfg.cors_origins, vec!["https://example.com", "http://localhost:5173"]);
}

#[test]
fn empty_origin_list_allows_none() {
    let cfg = ServerConfig::from_vars(None, None, Some("")).unwrap();
    assert!(cfg.cors_origins.is_empty());
}
