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

//! Shared fixtures: an in-memory connector and event helpers

#![allow(dead_code)]

use async_trait::async_trait;
use iristerm_session::{
    ChannelHandler, Connector, LoginTiming, Result, Session, SessionConfig, SessionError,
    SessionEvent,
};
use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, ready};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, DuplexStream, ReadBuf};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

/// Scripted outcome of one dial
pub enum Attempt {
    Stream(DuplexStream),
    /// Stream whose end of input surfaces as a connection reset
    Resetting(DuplexStream),
    Fail(SessionError),
    Hang,
}

#[derive(Default)]
struct MockState {
    secure: Mutex<VecDeque<Attempt>>,
    plain: Mutex<VecDeque<Attempt>>,
    secure_attempts: AtomicUsize,
    plain_attempts: AtomicUsize,
}

/// Connector replaying scripted attempts
#[derive(Clone, Default)]
pub struct MockConnector {
    state: Arc<MockState>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secure(self, attempt: Attempt) -> Self {
        self.state.secure.lock().unwrap().push_back(attempt);
        self
    }

    pub fn with_plain(self, attempt: Attempt) -> Self {
        self.state.plain.lock().unwrap().push_back(attempt);
        self
    }

    pub fn secure_attempts(&self) -> usize {
        self.state.secure_attempts.load(Ordering::SeqCst)
    }

    pub fn plain_attempts(&self) -> usize {
        self.state.plain_attempts.load(Ordering::SeqCst)
    }

    async fn replay(queue: &Mutex<VecDeque<Attempt>>) -> Result<MockStream> {
        let next = queue.lock().unwrap().pop_front();
        match next {
            Some(Attempt::Stream(inner)) => Ok(MockStream {
                inner,
                reset_on_eof: false,
            }),
            Some(Attempt::Resetting(inner)) => Ok(MockStream {
                inner,
                reset_on_eof: true,
            }),
            Some(Attempt::Fail(error)) => Err(error),
            Some(Attempt::Hang) => std::future::pending().await,
            None => Err(io::Error::from(io::ErrorKind::ConnectionRefused).into()),
        }
    }
}

#[async_trait]
impl Connector for MockConnector {
    type Stream = MockStream;

    async fn connect_plain(&self, _host: &str, _port: u16) -> Result<MockStream> {
        self.state.plain_attempts.fetch_add(1, Ordering::SeqCst);
        Self::replay(&self.state.plain).await
    }

    async fn connect_secure(&self, _host: &str, _port: u16) -> Result<MockStream> {
        self.state.secure_attempts.fetch_add(1, Ordering::SeqCst);
        Self::replay(&self.state.secure).await
    }
}

/// Client end of a scripted connection
pub struct MockStream {
    inner: DuplexStream,
    reset_on_eof: bool,
}

impl AsyncRead for MockStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        ready!(Pin::new(&mut this.inner).poll_read(cx, buf))?;
        if this.reset_on_eof && buf.filled().len() == before && buf.remaining() > 0 {
            return Poll::Ready(Err(io::ErrorKind::ConnectionReset.into()));
        }
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().inner).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

/// The error tokio-rustls reports when the server answers a ClientHello with plain text
pub fn version_mismatch() -> SessionError {
    SessionError::Io(io::Error::new(
        io::ErrorKind::InvalidData,
        rustls::Error::InvalidMessage(rustls::InvalidMessage::InvalidContentType),
    ))
}

pub fn io_error(kind: io::ErrorKind) -> SessionError {
    SessionError::Io(io::Error::from(kind))
}

pub fn test_config() -> SessionConfig {
    SessionConfig::new("iris.test")
        .with_display_name("Test")
        .with_login_timing(LoginTiming::immediate())
}

/// Open a session with one channel listener
pub fn open_session(
    config: SessionConfig,
    connector: MockConnector,
) -> (Session<MockConnector>, UnboundedReceiver<SessionEvent>) {
    let (handler, events) = ChannelHandler::new();
    let session = Session::with_connector(config, connector).with_handler(Arc::new(handler));
    session.open().unwrap();
    (session, events)
}

pub async fn next_event(events: &mut UnboundedReceiver<SessionEvent>) -> SessionEvent {
    timeout(WAIT, events.recv())
        .await
        .expect("timed out waiting for a session event")
        .expect("event channel closed")
}

/// Collect events up to and including the first one matching `done`
pub async fn events_until(
    events: &mut UnboundedReceiver<SessionEvent>,
    mut done: impl FnMut(&SessionEvent) -> bool,
) -> Vec<SessionEvent> {
    let mut seen = Vec::new();
    loop {
        let event = next_event(events).await;
        let finished = done(&event);
        seen.push(event);
        if finished {
            return seen;
        }
    }
}

/// Collect events until the session reports it closed
pub async fn events_until_closed(
    events: &mut UnboundedReceiver<SessionEvent>,
) -> Vec<SessionEvent> {
    events_until(events, |event| *event == SessionEvent::Closed).await
}

/// Collect events until the concatenated display text contains `needle`
pub async fn display_until(
    events: &mut UnboundedReceiver<SessionEvent>,
    needle: &str,
) -> Vec<SessionEvent> {
    let mut shown = String::new();
    events_until(events, move |event| {
        if let SessionEvent::DisplayText(text) = event {
            shown.push_str(text);
        }
        shown.contains(needle)
    })
    .await
}

pub fn display_text(events: &[SessionEvent]) -> String {
    events
        .iter()
        .filter_map(|event| match event {
            SessionEvent::DisplayText(text) => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

pub fn errors(events: &[SessionEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|event| match event {
            SessionEvent::Error(message) => Some(message.as_str()),
            _ => None,
        })
        .collect()
}

/// Read exactly `expected.len()` bytes from the server side and compare
pub async fn expect_bytes(server: &mut DuplexStream, expected: &[u8]) {
    let mut buf = vec![0u8; expected.len()];
    timeout(WAIT, server.read_exact(&mut buf))
        .await
        .expect("timed out waiting for client bytes")
        .expect("read failed");
    assert_eq!(
        buf.as_slice(),
        expected,
        "client sent {:?}",
        String::from_utf8_lossy(&buf)
    );
}
