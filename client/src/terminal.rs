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

//! Local terminal plumbing: session output, raw mode and keyboard input

use async_trait::async_trait;
use bytes::BytesMut;
use crossterm::terminal::{SetTitle, disable_raw_mode, enable_raw_mode};
use crossterm::{ExecutableCommand, queue};
use iristerm_charcodec::{CharsetCodec, Encoding};
use iristerm_session::{SessionConfig, SessionHandler};
use std::io::{self, Read, Write};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio_util::codec::Decoder;
use tracing::{debug, warn};

/// Key that ends the session locally (Ctrl-])
pub const QUIT_KEY: char = '\x1d';

/// Writes session output to a local terminal
pub struct TerminalOutput<W> {
    writer: Mutex<W>,
    config: SessionConfig,
    failed: AtomicBool,
}

impl<W: Write + Send + 'static> TerminalOutput<W> {
    /// Create an output for the given session configuration
    pub fn new(writer: W, config: SessionConfig) -> Self {
        Self {
            writer: Mutex::new(writer),
            config,
            failed: AtomicBool::new(false),
        }
    }

    /// Whether the session reported an error
    pub fn failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }

    /// Consume the output and return the writer
    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_with(&self, write: impl FnOnce(&mut W) -> io::Result<()>) {
        let mut writer = match self.writer.lock() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(err) = write(&mut writer).and_then(|()| writer.flush()) {
            warn!(%err, "terminal write failed");
        }
    }
}

#[async_trait]
impl<W: Write + Send + 'static> SessionHandler for TerminalOutput<W> {
    async fn on_display_text(&self, text: &str) {
        self.write_with(|out| out.write_all(text.as_bytes()));
    }

    async fn on_context_changed(&self, token: &str) {
        let title = self.config.title_for(token);
        self.write_with(|out| queue!(out, SetTitle(title)));
    }

    async fn on_error(&self, message: &str) {
        debug!(message, "session reported an error");
        self.failed.store(true, Ordering::SeqCst);
    }
}

/// Keeps the local terminal in raw mode while alive
#[derive(Debug)]
pub struct RawMode(());

impl RawMode {
    /// Switch the terminal to raw mode
    pub fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(RawMode(()))
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if let Err(err) = disable_raw_mode() {
            warn!(%err, "failed to restore terminal mode");
        }
    }
}

/// Set the title of the controlling terminal
pub fn set_title(title: &str) -> io::Result<()> {
    io::stdout().execute(SetTitle(title)).map(|_| ())
}

/// One chunk of local keyboard input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keystrokes {
    /// Text to forward to the session
    Text(String),
    /// The quit key was pressed; anything typed before it is forwarded first
    Quit(String),
}

/// Split a chunk at the first quit key
pub fn split_quit(text: String) -> Keystrokes {
    match text.find(QUIT_KEY) {
        Some(at) => Keystrokes::Quit(text[..at].to_string()),
        None => Keystrokes::Text(text),
    }
}

/// Read stdin on a dedicated thread.
///
/// Tokio's stdin keeps the runtime alive on a blocking read, so a plain thread
/// feeds the channel instead. The channel closes at end of input.
pub fn spawn_keyboard() -> mpsc::UnboundedReceiver<Keystrokes> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let stdin = io::stdin();
        let mut stdin = stdin.lock();
        if let Err(err) = pump_keys(&mut stdin, &tx) {
            debug!(%err, "keyboard reader stopped");
        }
    });
    rx
}

/// Decode keystrokes from `source` until end of input or the quit key
pub fn pump_keys(
    source: &mut impl Read,
    tx: &mpsc::UnboundedSender<Keystrokes>,
) -> io::Result<()> {
    let mut codec = CharsetCodec::new(Encoding::Utf8);
    let mut pending = BytesMut::new();
    let mut buf = [0u8; 1024];
    loop {
        let read = source.read(&mut buf)?;
        if read == 0 {
            return Ok(());
        }
        pending.extend_from_slice(&buf[..read]);
        while let Some(text) = codec.decode(&mut pending)? {
            let keys = split_quit(text);
            let quit = matches!(keys, Keystrokes::Quit(_));
            if tx.send(keys).is_err() || quit {
                return Ok(());
            }
        }
    }
}
