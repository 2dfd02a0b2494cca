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

//! Session controller
//!
//! A [`Session`] is the host-facing handle. `open()` spawns one task that owns every
//! piece of mutable session state; the handle talks to it over an unbounded command
//! channel and observes it through a `watch` snapshot.

use crate::display::{self, NewlineTranslator};
use crate::{
    Connector, LoginPhase, LoginSequencer, Negotiated, Result, SessionConfig, SessionError,
    SessionHandler, TcpConnector, TlsPolicy, TransportKind, TransportNegotiator, TransportState,
    prompt,
};
use futures_util::StreamExt;
use iristerm_charcodec::{CharsetCodec, encode, translate_backspace};
use metrics::counter;
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tokio_util::codec::{Decoder, FramedRead};
use tracing::{Instrument, debug, error, info, instrument, trace};

/// Snapshot of the session state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    /// Transport lifecycle
    pub transport: TransportState,
    /// Login progress
    pub login_phase: LoginPhase,
    /// Last namespace seen at a prompt, or the configured one
    pub context: String,
    /// Whether any server data has been received
    pub data_received: bool,
}

#[derive(Debug)]
enum SessionCommand {
    Input(Vec<u8>),
    Close,
}

/// One terminal session against an IRIS server
///
/// # Example
///
/// ```no_run
/// use iristerm_session::{ChannelHandler, Credentials, Session, SessionConfig, SessionEvent};
/// use std::sync::Arc;
///
/// # async fn run() -> iristerm_session::Result<()> {
/// let config = SessionConfig::new("iris.example.com")
///     .with_credentials(Credentials::new("_SYSTEM", "SYS"))
///     .with_desired_context("USER");
///
/// let (handler, mut events) = ChannelHandler::new();
/// let mut session = Session::new(config)?;
/// session.add_handler(Arc::new(handler));
/// session.open()?;
///
/// while let Some(event) = events.recv().await {
///     match event {
///         SessionEvent::DisplayText(text) => print!("{text}"),
///         SessionEvent::Closed => break,
///         _ => {}
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct Session<C: Connector = TcpConnector> {
    config: Arc<SessionConfig>,
    connector: Arc<C>,
    handlers: Vec<Arc<dyn SessionHandler>>,
    status_tx: Arc<watch::Sender<SessionStatus>>,
    status_rx: watch::Receiver<SessionStatus>,
    commands: OnceLock<mpsc::UnboundedSender<SessionCommand>>,
    close_requested: Arc<AtomicBool>,
}

impl Session<TcpConnector> {
    /// Create a session dialing real sockets
    pub fn new(config: SessionConfig) -> Result<Self> {
        Ok(Self::with_connector(config, TcpConnector::new()?))
    }
}

impl<C: Connector> Session<C> {
    /// Create a session dialing through `connector`
    pub fn with_connector(config: SessionConfig, connector: C) -> Self {
        let (status_tx, status_rx) = watch::channel(SessionStatus {
            transport: TransportState::Idle,
            login_phase: LoginSequencer::new(
                config.credentials.clone(),
                config.desired_context.clone(),
                config.login_timing,
            )
            .phase(),
            context: config.initial_context(),
            data_received: false,
        });
        Self {
            config: Arc::new(config),
            connector: Arc::new(connector),
            handlers: Vec::new(),
            status_tx: Arc::new(status_tx),
            status_rx,
            commands: OnceLock::new(),
            close_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Register a listener. Listeners added after `open()` receive nothing.
    pub fn add_handler(&mut self, handler: Arc<dyn SessionHandler>) {
        self.handlers.push(handler);
    }

    /// Builder-style [`add_handler`](Self::add_handler)
    pub fn with_handler(mut self, handler: Arc<dyn SessionHandler>) -> Self {
        self.add_handler(handler);
        self
    }

    /// Start the session task. Must be called from within a tokio runtime.
    pub fn open(&self) -> Result<()> {
        if self.close_requested.load(Ordering::SeqCst) {
            return Err(SessionError::Closed);
        }
        let (sender, receiver) = mpsc::unbounded_channel();
        self.commands
            .set(sender)
            .map_err(|_| SessionError::AlreadyOpen)?;

        counter!("iristerm.sessions.opened").increment(1);
        let task = SessionTask {
            login: LoginSequencer::new(
                self.config.credentials.clone(),
                self.config.desired_context.clone(),
                self.config.login_timing,
            ),
            context: self.config.initial_context(),
            config: self.config.clone(),
            connector: self.connector.clone(),
            handlers: self.handlers.clone(),
            commands: receiver,
            status: self.status_tx.clone(),
            close_requested: self.close_requested.clone(),
            transport: TransportState::Idle,
            kind: None,
            newlines: NewlineTranslator::default(),
            data_received: false,
            pending: VecDeque::new(),
        };
        tokio::spawn(task.run());
        Ok(())
    }

    /// Send user keystrokes. Dropped unless a transport is carrying data.
    pub fn handle_input(&self, text: &str) {
        if !self.status_rx.borrow().transport.is_active() {
            trace!("input dropped, no active transport");
            return;
        }
        let Some(commands) = self.commands.get() else {
            return;
        };
        let bytes = encode(&translate_backspace(text), self.config.encoding);
        if commands.send(SessionCommand::Input(bytes)).is_err() {
            trace!("input dropped, session task finished");
        }
    }

    /// Tear the session down. Safe to call any number of times.
    pub fn close(&self) {
        if self.close_requested.swap(true, Ordering::SeqCst) {
            return;
        }
        match self.commands.get() {
            Some(commands) => {
                // The task may already have exited on its own.
                let _ = commands.send(SessionCommand::Close);
            }
            None => {
                self.status_tx
                    .send_modify(|status| status.transport = TransportState::Closed);
            }
        }
    }

    /// Current state snapshot
    pub fn status(&self) -> SessionStatus {
        self.status_rx.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status_rx.clone()
    }

    /// Wait until the session reaches [`TransportState::Closed`]
    pub async fn closed(&self) {
        let mut status = self.status_rx.clone();
        let _ = status
            .wait_for(|status| status.transport == TransportState::Closed)
            .await;
    }

    /// Terminal title for the current context
    pub fn title(&self) -> String {
        self.config.title_for(&self.status_rx.borrow().context)
    }
}

impl<C: Connector> std::fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("address", &self.config.address())
            .field("handlers", &self.handlers.len())
            .field("status", &*self.status_rx.borrow())
            .finish()
    }
}

struct PendingWrite {
    due: Instant,
    phase: LoginPhase,
    bytes: Vec<u8>,
}

enum Exit {
    HostClosed,
    RemoteClosed,
    Failed(SessionError),
}

struct SessionTask<C: Connector> {
    config: Arc<SessionConfig>,
    connector: Arc<C>,
    handlers: Vec<Arc<dyn SessionHandler>>,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
    status: Arc<watch::Sender<SessionStatus>>,
    close_requested: Arc<AtomicBool>,
    transport: TransportState,
    kind: Option<TransportKind>,
    login: LoginSequencer,
    newlines: NewlineTranslator,
    context: String,
    data_received: bool,
    pending: VecDeque<PendingWrite>,
}

impl<C: Connector> SessionTask<C> {
    #[instrument(name = "session", skip(self), fields(address = %self.config.address()))]
    async fn run(mut self) {
        info!("session opened");
        let banner = display::banner(&self.config.display_name, self.config.encoding);
        self.display(&banner).await;

        let exit = match self.negotiate().await {
            Ok(Some(negotiated)) => self.drive(negotiated).await,
            Ok(None) => Exit::HostClosed,
            Err(error) => Exit::Failed(error),
        };
        self.finish(exit).await;
    }

    async fn negotiate(&mut self) -> Result<Option<Negotiated<C::Stream>>> {
        if self.config.tls_policy != TlsPolicy::Disable {
            self.set_transport(TransportState::NegotiatingSecure);
        }
        let negotiator = TransportNegotiator::new(self.connector.clone(), self.config.clone());
        let negotiation = negotiator.negotiate();
        tokio::pin!(negotiation);

        loop {
            tokio::select! {
                biased;
                command = self.commands.recv() => match command {
                    Some(SessionCommand::Input(_)) => trace!("input dropped during negotiation"),
                    Some(SessionCommand::Close) | None => return Ok(None),
                },
                result = &mut negotiation => return result.map(Some),
            }
        }
    }

    async fn drive(&mut self, negotiated: Negotiated<C::Stream>) -> Exit {
        let Negotiated {
            stream,
            kind,
            initial,
            fallback,
        } = negotiated;
        info!(?kind, ?fallback, "transport established");
        self.kind = Some(kind);
        self.set_transport(kind.into());

        let (reader, writer) = tokio::io::split(stream);
        let mut codec = CharsetCodec::new(self.config.encoding);
        let mut leftover = bytes::BytesMut::new();
        if let Some(mut initial) = initial {
            match codec.decode(&mut initial) {
                Ok(Some(text)) => self.process_chunk(&text).await,
                Ok(None) => {}
                Err(error) => return Exit::Failed(error.into()),
            }
            leftover = initial;
        }
        let mut frames = FramedRead::with_capacity(reader, codec, self.config.buffer_size);
        frames.read_buffer_mut().extend_from_slice(&leftover);

        // Writes run on their own task; it is aborted on exit, even mid-write.
        let (outbound, queued) = mpsc::unbounded_channel();
        let mut writes = tokio::spawn(write_loop(writer, queued).in_current_span());
        let exit = self.pump(&mut frames, &outbound, &mut writes).await;
        writes.abort();
        exit
    }

    async fn pump<R: AsyncRead + Unpin>(
        &mut self,
        frames: &mut FramedRead<R, CharsetCodec>,
        outbound: &mpsc::UnboundedSender<Vec<u8>>,
        writes: &mut JoinHandle<Result<()>>,
    ) -> Exit {
        loop {
            let next_due = self.pending.front().map(|write| write.due);
            tokio::select! {
                biased;
                command = self.commands.recv() => match command {
                    Some(SessionCommand::Input(bytes)) => {
                        if outbound.send(bytes).is_err() {
                            trace!("input dropped, writer finished");
                        }
                    }
                    Some(SessionCommand::Close) | None => return Exit::HostClosed,
                },
                joined = &mut *writes => {
                    return match joined {
                        Ok(Ok(())) => Exit::RemoteClosed,
                        Ok(Err(error)) => Exit::Failed(error),
                        Err(error) => Exit::Failed(io::Error::other(error).into()),
                    };
                },
                () = sleep_until(next_due.unwrap_or_else(Instant::now)), if next_due.is_some() => {
                    if let Some(write) = self.pending.pop_front() {
                        debug!(phase = %write.phase, "sending login step");
                        if outbound.send(write.bytes).is_err() {
                            trace!("login step dropped, writer finished");
                        }
                    }
                },
                frame = frames.next() => match frame {
                    Some(Ok(text)) => self.process_chunk(&text).await,
                    Some(Err(error)) => return Exit::Failed(error.into()),
                    None => return Exit::RemoteClosed,
                },
            }
        }
    }

    async fn process_chunk(&mut self, text: &str) {
        trace!(len = text.len(), "chunk received");
        counter!("iristerm.bytes.received").increment(text.len() as u64);

        if !self.data_received {
            self.data_received = true;
            if self.kind == Some(TransportKind::Secure) {
                self.display(&display::encrypted_notice()).await;
            }
        }

        let shown = self.newlines.translate(text);
        self.display(&shown).await;

        if let Some(token) = prompt::match_context(text) {
            if token != self.context {
                info!(%token, "context changed");
                self.context = token;
                self.publish();
                if !self.stopping() {
                    for handler in &self.handlers {
                        handler.on_context_changed(&self.context).await;
                    }
                }
            }
        }

        let now = Instant::now();
        for step in self.login.observe(text) {
            let earliest = self.pending.back().map_or(now, |write| write.due);
            let due = (now + step.delay).max(earliest);
            debug!(phase = %step.phase, delay = ?step.delay, "login step scheduled");
            self.pending.push_back(PendingWrite {
                due,
                phase: step.phase,
                bytes: encode(&step.text, self.config.encoding),
            });
        }
        self.publish();
    }

    async fn finish(&mut self, exit: Exit) {
        match exit {
            Exit::Failed(failure) => {
                error!(error = %failure, "session failed");
                let message = failure.to_string();
                self.display(&display::error_line(&message)).await;
                if !self.stopping() {
                    for handler in &self.handlers {
                        handler.on_error(&message).await;
                    }
                }
            }
            Exit::RemoteClosed => info!("server closed the connection"),
            Exit::HostClosed => info!("session closed by host"),
        }
        if self.data_received {
            self.display(&display::disconnect_notice()).await;
        }
        self.pending.clear();
        self.set_transport(TransportState::Closed);
        for handler in &self.handlers {
            handler.on_closed().await;
        }
    }

    async fn display(&self, text: &str) {
        if self.stopping() {
            return;
        }
        for handler in &self.handlers {
            handler.on_display_text(text).await;
        }
    }

    fn stopping(&self) -> bool {
        self.close_requested.load(Ordering::SeqCst)
    }

    fn set_transport(&mut self, state: TransportState) {
        debug!(from = %self.transport, to = %state, "transport state");
        self.transport = state;
        self.publish();
    }

    fn publish(&self) {
        self.status.send_replace(SessionStatus {
            transport: self.transport,
            login_phase: self.login.phase(),
            context: self.context.clone(),
            data_received: self.data_received,
        });
    }
}

async fn write_loop<W: AsyncWrite + Unpin>(
    mut writer: W,
    mut queued: mpsc::UnboundedReceiver<Vec<u8>>,
) -> Result<()> {
    while let Some(bytes) = queued.recv().await {
        send(&mut writer, &bytes).await?;
    }
    writer.shutdown().await?;
    Ok(())
}

async fn send<W: AsyncWrite + Unpin>(writer: &mut W, bytes: &[u8]) -> Result<()> {
    writer.write_all(bytes).await?;
    writer.flush().await?;
    counter!("iristerm.bytes.sent").increment(bytes.len() as u64);
    trace!(len = bytes.len(), "bytes sent");
    Ok(())
}
