//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! End-to-end session behaviour over in-memory transports

mod common;

use common::*;
use iristerm_session::{
    Credentials, Encoding, LoginPhase, LoginTiming, SessionError, SessionEvent, TlsPolicy,
    TransportState,
};
use std::io;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};
use tokio::time::Instant;

#[tokio::test]
async fn test_scripted_login_writes_each_step_once() {
    let (client, mut server) = duplex(4096);
    let connector = MockConnector::new().with_plain(Attempt::Stream(client));
    let config = test_config()
        .with_tls_policy(TlsPolicy::Disable)
        .with_credentials(Credentials::new("bob", "pw"))
        .with_desired_context("USER");
    let (session, mut events) = open_session(config, connector);

    server.write_all(b"login: ").await.unwrap();
    expect_bytes(&mut server, b"bob\r\n").await;
    server.write_all(b"...").await.unwrap();
    server.write_all(b"password: ").await.unwrap();
    expect_bytes(&mut server, b"pw\r\n").await;
    server.write_all(b"...").await.unwrap();
    server.write_all(b"\r\nUSER>").await.unwrap();
    expect_bytes(&mut server, b"zn \"USER\"\r\n").await;

    server.write_all(b"\r\nlogin: password: USER>").await.unwrap();
    display_until(&mut events, "login: password: USER>").await;
    assert_eq!(session.status().login_phase, LoginPhase::Done);

    session.close();
    let mut rest = Vec::new();
    server.read_to_end(&mut rest).await.unwrap();
    assert!(rest.is_empty(), "unexpected writes: {rest:?}");
}

#[tokio::test(start_paused = true)]
async fn test_login_writes_are_paced() {
    let (client, mut server) = duplex(4096);
    let connector = MockConnector::new().with_plain(Attempt::Stream(client));
    let config = test_config()
        .with_tls_policy(TlsPolicy::Disable)
        .with_credentials(Credentials::new("bob", ""))
        .with_desired_context("%SYS")
        .with_login_timing(LoginTiming::default());
    let (_session, _events) = open_session(config, connector);

    let start = Instant::now();
    server.write_all(b"Username: ").await.unwrap();
    expect_bytes(&mut server, b"bob\r\n").await;
    assert!(start.elapsed() >= Duration::from_millis(300));

    let start = Instant::now();
    server.write_all(b"\r\nUSER>").await.unwrap();
    expect_bytes(&mut server, b"zn \"%SYS\"\r\n").await;
    assert!(start.elapsed() >= Duration::from_millis(600));
}

#[tokio::test]
async fn test_version_mismatch_falls_back_to_plaintext_once() {
    let (client, mut server) = duplex(4096);
    let connector = MockConnector::new()
        .with_secure(Attempt::Fail(version_mismatch()))
        .with_plain(Attempt::Stream(client));
    let (session, mut events) = open_session(test_config(), connector.clone());

    server.write_all(b"\r\nUSER>").await.unwrap();
    let seen = events_until(&mut events, |event| {
        *event == SessionEvent::ContextChanged("USER".into())
    })
    .await;

    assert!(errors(&seen).is_empty());
    assert!(!display_text(&seen).contains("Encrypted"));
    assert_eq!(connector.secure_attempts(), 1);
    assert_eq!(connector.plain_attempts(), 1);
    assert_eq!(session.status().transport, TransportState::Plaintext);
}

#[tokio::test(start_paused = true)]
async fn test_handshake_timeout_falls_back_to_plaintext() {
    let (client, mut server) = duplex(4096);
    let connector = MockConnector::new()
        .with_secure(Attempt::Hang)
        .with_plain(Attempt::Stream(client));
    let (session, mut events) = open_session(test_config(), connector.clone());

    server.write_all(b"Node: iris\r\n").await.unwrap();
    let seen = display_until(&mut events, "Node: iris").await;

    assert!(errors(&seen).is_empty());
    assert_eq!(connector.plain_attempts(), 1);
    assert_eq!(session.status().transport, TransportState::Plaintext);
}

#[tokio::test(start_paused = true)]
async fn test_silent_secure_peer_falls_back_to_plaintext() {
    let (secure, _secure_server) = duplex(4096);
    let (client, mut server) = duplex(4096);
    let connector = MockConnector::new()
        .with_secure(Attempt::Stream(secure))
        .with_plain(Attempt::Stream(client));
    let (session, mut events) = open_session(test_config(), connector.clone());

    server.write_all(b"USER>").await.unwrap();
    let seen = display_until(&mut events, "USER>").await;

    assert!(errors(&seen).is_empty());
    assert!(!display_text(&seen).contains("Encrypted"));
    assert_eq!(connector.secure_attempts(), 1);
    assert_eq!(connector.plain_attempts(), 1);
    assert_eq!(session.status().transport, TransportState::Plaintext);
}

#[tokio::test]
async fn test_secure_transport_announces_encryption() {
    let (client, mut server) = duplex(4096);
    let connector = MockConnector::new().with_secure(Attempt::Stream(client));
    let (session, mut events) = open_session(test_config(), connector.clone());

    server.write_all(b"Welcome\r\n%SYS>").await.unwrap();
    let seen = events_until(&mut events, |event| {
        matches!(event, SessionEvent::ContextChanged(_))
    })
    .await;

    let shown = display_text(&seen);
    let notice = shown.find("Encrypted connection established").unwrap();
    let data = shown.find("Welcome").unwrap();
    assert!(notice < data);
    assert_eq!(seen.last(), Some(&SessionEvent::ContextChanged("%SYS".into())));
    assert_eq!(session.status().transport, TransportState::Secure);
    assert_eq!(connector.plain_attempts(), 0);
}

#[tokio::test]
async fn test_non_allow_listed_secure_failure_is_fatal() {
    let connector = MockConnector::new()
        .with_secure(Attempt::Fail(io_error(io::ErrorKind::PermissionDenied)));
    let (session, mut events) = open_session(test_config(), connector.clone());

    let seen = events_until_closed(&mut events).await;
    assert_eq!(errors(&seen).len(), 1);
    assert!(display_text(&seen).contains("[ERROR]: "));
    assert!(!display_text(&seen).contains("Disconnected"));
    assert_eq!(connector.plain_attempts(), 0);
    assert_eq!(session.status().transport, TransportState::Closed);
}

#[tokio::test]
async fn test_failed_fallback_is_surfaced_without_retry() {
    let connector = MockConnector::new()
        .with_secure(Attempt::Fail(io_error(io::ErrorKind::ConnectionReset)))
        .with_plain(Attempt::Fail(io_error(io::ErrorKind::ConnectionRefused)));
    let (_session, mut events) = open_session(test_config(), connector.clone());

    let seen = events_until_closed(&mut events).await;
    let errors = errors(&seen);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("refused"), "{}", errors[0]);
    assert_eq!(connector.secure_attempts(), 1);
    assert_eq!(connector.plain_attempts(), 1);
}

#[tokio::test]
async fn test_require_policy_never_falls_back() {
    let connector = MockConnector::new().with_secure(Attempt::Fail(version_mismatch()));
    let config = test_config().with_tls_policy(TlsPolicy::Require);
    let (_session, mut events) = open_session(config, connector.clone());

    let seen = events_until_closed(&mut events).await;
    assert_eq!(errors(&seen).len(), 1);
    assert_eq!(connector.plain_attempts(), 0);
}

#[tokio::test]
async fn test_secure_close_before_data_is_an_error() {
    let (client, server) = duplex(64);
    drop(server);
    let connector = MockConnector::new().with_secure(Attempt::Stream(client));
    let (_session, mut events) = open_session(test_config(), connector.clone());

    let seen = events_until_closed(&mut events).await;
    assert_eq!(
        errors(&seen),
        vec![SessionError::ClosedBeforeData.to_string().as_str()]
    );
    assert_eq!(connector.plain_attempts(), 0);
}

#[tokio::test]
async fn test_double_close_emits_one_closed_event() {
    let (client, mut server) = duplex(4096);
    let connector = MockConnector::new().with_plain(Attempt::Stream(client));
    let config = test_config().with_tls_policy(TlsPolicy::Disable);
    let (session, mut events) = open_session(config, connector);

    server.write_all(b"USER>").await.unwrap();
    display_until(&mut events, "USER>").await;

    session.close();
    session.close();
    session.closed().await;

    let seen = events_until_closed(&mut events).await;
    assert_eq!(seen.last(), Some(&SessionEvent::Closed));
    assert!(!display_text(&seen).contains("Disconnected"));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(events.try_recv().is_err());
    assert_eq!(session.status().transport, TransportState::Closed);
}

#[tokio::test]
async fn test_remote_close_after_data_shows_disconnect_notice() {
    let (client, mut server) = duplex(4096);
    let connector = MockConnector::new().with_plain(Attempt::Stream(client));
    let config = test_config().with_tls_policy(TlsPolicy::Disable);
    let (_session, mut events) = open_session(config, connector);

    server.write_all(b"bye").await.unwrap();
    drop(server);

    let seen = events_until_closed(&mut events).await;
    assert!(display_text(&seen).ends_with("--- Disconnected ---\x1b[0m\r\n"));
    assert!(errors(&seen).is_empty());
}

#[tokio::test]
async fn test_close_completes_while_peer_stops_reading() {
    let (client, _server) = duplex(16);
    let connector = MockConnector::new().with_plain(Attempt::Stream(client));
    let config = test_config().with_tls_policy(TlsPolicy::Disable);
    let (session, mut events) = open_session(config, connector);
    session
        .subscribe()
        .wait_for(|s| s.transport.is_active())
        .await
        .unwrap();

    session.handle_input(&"x".repeat(1024));
    tokio::time::sleep(Duration::from_millis(20)).await;
    session.close();

    tokio::time::timeout(Duration::from_secs(2), session.closed())
        .await
        .expect("close() did not finish the session");
    let seen = events_until_closed(&mut events).await;
    assert_eq!(seen.last(), Some(&SessionEvent::Closed));
    assert_eq!(session.status().transport, TransportState::Closed);
}

#[tokio::test]
async fn test_transport_error_after_data_reports_then_closes() {
    let (client, mut server) = duplex(4096);
    let connector = MockConnector::new().with_plain(Attempt::Resetting(client));
    let config = test_config().with_tls_policy(TlsPolicy::Disable);
    let (_session, mut events) = open_session(config, connector);

    server.write_all(b"USER>").await.unwrap();
    display_until(&mut events, "USER>").await;
    drop(server);

    let seen = events_until_closed(&mut events).await;
    let errors = errors(&seen);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("I/O error"), "{}", errors[0]);

    let shown = display_text(&seen);
    let error_line = shown.find("[ERROR]: I/O error").unwrap();
    let notice = shown.find("--- Disconnected ---").unwrap();
    assert!(error_line < notice);

    let error_at = seen.iter().position(|e| matches!(e, SessionEvent::Error(_))).unwrap();
    assert!(error_at < seen.len() - 1);
    assert_eq!(seen.last(), Some(&SessionEvent::Closed));
}

#[tokio::test]
async fn test_remote_close_without_data_is_silent() {
    let (client, server) = duplex(64);
    drop(server);
    let connector = MockConnector::new().with_plain(Attempt::Stream(client));
    let config = test_config().with_tls_policy(TlsPolicy::Disable);
    let (_session, mut events) = open_session(config, connector);

    let seen = events_until_closed(&mut events).await;
    let shown = display_text(&seen);
    assert!(shown.starts_with("\x1b[36m--- IRIS Terminal: Test [UTF8] ---"));
    assert!(!shown.contains("Disconnected"));
    assert!(errors(&seen).is_empty());
}

#[tokio::test]
async fn test_bare_line_feeds_are_translated() {
    let (client, mut server) = duplex(4096);
    let connector = MockConnector::new().with_plain(Attempt::Stream(client));
    let config = test_config().with_tls_policy(TlsPolicy::Disable);
    let (_session, mut events) = open_session(config, connector);

    server.write_all(b"a\nb\r\nc").await.unwrap();
    let seen = display_until(&mut events, "a\r\nb\r\nc").await;
    assert!(display_text(&seen).ends_with("a\r\nb\r\nc"));
}

#[tokio::test]
async fn test_context_events_only_on_change() {
    let (client, mut server) = duplex(4096);
    let connector = MockConnector::new().with_plain(Attempt::Stream(client));
    let config = test_config()
        .with_tls_policy(TlsPolicy::Disable)
        .with_desired_context("user");
    let (session, mut events) = open_session(config, connector);
    assert_eq!(session.status().context, "USER");

    server.write_all(b"USER>").await.unwrap();
    let first = display_until(&mut events, "USER>").await;
    assert!(!first.iter().any(|e| matches!(e, SessionEvent::ContextChanged(_))));

    server.write_all(b"zn \"%SYS\"\r\n%SYS>").await.unwrap();
    let second = events_until(&mut events, |e| matches!(e, SessionEvent::ContextChanged(_))).await;
    assert_eq!(second.last(), Some(&SessionEvent::ContextChanged("%SYS".into())));
    assert_eq!(session.title(), "IRIS: Test [%SYS]");
}

#[tokio::test]
async fn test_input_before_transport_is_dropped() {
    let (client, mut server) = duplex(4096);
    let connector = MockConnector::new().with_plain(Attempt::Stream(client));
    let config = test_config().with_tls_policy(TlsPolicy::Disable);
    let (handler, mut events) = iristerm_session::ChannelHandler::new();
    let session = iristerm_session::Session::with_connector(config, connector)
        .with_handler(std::sync::Arc::new(handler));

    session.handle_input("early");
    session.open().unwrap();
    let mut status = session.subscribe();
    status
        .wait_for(|s| s.transport.is_active())
        .await
        .unwrap();

    session.handle_input("ab\x7f\r\n");
    expect_bytes(&mut server, b"ab\x08\r\n").await;

    session.close();
    events_until_closed(&mut events).await;
    session.handle_input("late");
    let mut rest = Vec::new();
    server.read_to_end(&mut rest).await.unwrap();
    assert!(rest.is_empty());
}

#[tokio::test]
async fn test_legacy_encoding_in_both_directions() {
    let (client, mut server) = duplex(4096);
    let connector = MockConnector::new().with_plain(Attempt::Stream(client));
    let config = test_config()
        .with_tls_policy(TlsPolicy::Disable)
        .with_encoding(Encoding::Legacy8Bit);
    let (session, mut events) = open_session(config, connector);

    server.write_all(b"\xE9\xF9\xF8\xE0\xEC\r\n%SYS>").await.unwrap();
    let seen = events_until(&mut events, |e| matches!(e, SessionEvent::ContextChanged(_))).await;
    assert!(display_text(&seen).contains("ישראל\r\n%SYS>"));
    assert!(display_text(&seen).contains("[WINDOWS1255]"));

    session.handle_input("א?");
    expect_bytes(&mut server, &[0x80, b'?']).await;
}

#[tokio::test]
async fn test_every_listener_sees_every_event() {
    let (client, mut server) = duplex(4096);
    let connector = MockConnector::new().with_plain(Attempt::Stream(client));
    let config = test_config().with_tls_policy(TlsPolicy::Disable);
    let (first, mut first_events) = iristerm_session::ChannelHandler::new();
    let (second, mut second_events) = iristerm_session::ChannelHandler::new();
    let session = iristerm_session::Session::with_connector(config, connector)
        .with_handler(std::sync::Arc::new(first))
        .with_handler(std::sync::Arc::new(second));
    session.open().unwrap();

    server.write_all(b"hello").await.unwrap();
    drop(server);

    let a = events_until_closed(&mut first_events).await;
    let b = events_until_closed(&mut second_events).await;
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_open_twice_is_rejected() {
    let connector = MockConnector::new().with_plain(Attempt::Hang);
    let config = test_config().with_tls_policy(TlsPolicy::Disable);
    let (session, _events) = open_session(config, connector);
    assert!(matches!(session.open(), Err(SessionError::AlreadyOpen)));
    session.close();
}
