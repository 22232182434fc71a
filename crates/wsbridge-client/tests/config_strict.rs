#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use wsbridge_client::config;
use wsbridge_core::deprecation::{Deprecations, AUTOMOD_CAMEL_CASE_META};

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
socket:
  url: "ws://127.0.0.1:9000/ws"
  max_mesage_bytes: 2048 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert!(cfg.socket.url.is_none());
    assert_eq!(cfg.socket.max_message_bytes, 16 * 1024 * 1024);
    assert_eq!(cfg.socket.max_frame_bytes, 4 * 1024 * 1024);
    assert!(cfg.deprecations.enabled);
}

#[test]
fn wrong_version_rejected() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.code().as_str(), "UNSUPPORTED_VERSION");
}

#[test]
fn url_scheme_checked() {
    let bad = r#"
version: 1
socket:
  url: "http://example.com/gateway"
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
}

#[test]
fn frame_limit_bounded_by_message_limit() {
    let bad = r#"
version: 1
socket:
  max_message_bytes: 4096
  max_frame_bytes: 8192
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert!(err.to_string().contains("max_frame_bytes"));
}

#[test]
fn deprecations_section_switches_port() {
    let cfg = config::load_from_str(
        r#"
version: 1
socket:
  url: "wss://gateway.discord.gg/?v=10&encoding=json"
deprecations:
  enabled: false
"#,
    )
    .expect("must parse");

    let port = Deprecations::new();
    cfg.deprecations.apply(&port);
    assert!(!port.emit(&AUTOMOD_CAMEL_CASE_META));
    assert!(!port.is_enabled());
}

#[test]
fn missing_file_is_bad_config() {
    let err = config::load_from_file("does/not/exist.yaml").expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
}
