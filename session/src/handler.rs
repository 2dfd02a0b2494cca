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

//! Session event handler traits

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Session event handler trait
///
/// Implement this trait to receive the output of a session. All methods are async
/// and have default implementations that do nothing. Any number of handlers may be
/// registered with one session; each receives every event in order.
///
/// # Example
///
/// ```no_run
/// use iristerm_session::SessionHandler;
/// use async_trait::async_trait;
///
/// struct Printer;
///
/// #[async_trait]
/// impl SessionHandler for Printer {
///     async fn on_display_text(&self, text: &str) {
///         print!("{text}");
///     }
///
///     async fn on_closed(&self) {
///         println!("bye");
///     }
/// }
/// ```
#[async_trait]
pub trait SessionHandler: Send + Sync + 'static {
    /// Called with text to render, already decoded and newline-normalized
    async fn on_display_text(&self, _text: &str) {}

    /// Called when the server prompt shows a namespace different from the last one
    async fn on_context_changed(&self, _token: &str) {}

    /// Called when the session fails
    ///
    /// The session closes after this method returns.
    async fn on_error(&self, _message: &str) {}

    /// Called exactly once when the session ends, for whatever reason
    async fn on_closed(&self) {}
}

/// Callback-based handler implementation
///
/// ```no_run
/// use iristerm_session::CallbackHandler;
/// use std::sync::Arc;
///
/// let handler = Arc::new(CallbackHandler {
///     on_display_text: Some(Box::new(|text| print!("{text}"))),
///     on_closed: Some(Box::new(|| println!("closed"))),
///     ..Default::default()
/// });
/// ```
#[derive(Default)]
pub struct CallbackHandler {
    /// Called on display text
    pub on_display_text: Option<Box<dyn Fn(&str) + Send + Sync + 'static>>,

    /// Called on context change
    pub on_context_changed: Option<Box<dyn Fn(&str) + Send + Sync + 'static>>,

    /// Called on error
    pub on_error: Option<Box<dyn Fn(&str) + Send + Sync + 'static>>,

    /// Called on close
    pub on_closed: Option<Box<dyn Fn() + Send + Sync + 'static>>,
}

#[async_trait]
impl SessionHandler for CallbackHandler {
    async fn on_display_text(&self, text: &str) {
        if let Some(ref f) = self.on_display_text {
            f(text);
        }
    }

    async fn on_context_changed(&self, token: &str) {
        if let Some(ref f) = self.on_context_changed {
            f(token);
        }
    }

    async fn on_error(&self, message: &str) {
        if let Some(ref f) = self.on_error {
            f(message);
        }
    }

    async fn on_closed(&self) {
        if let Some(ref f) = self.on_closed {
            f();
        }
    }
}

/// Owned copy of a handler callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Text to render
    DisplayText(String),
    /// New namespace token
    ContextChanged(String),
    /// Failure message
    Error(String),
    /// Session ended
    Closed,
}

/// Handler forwarding every callback into an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelHandler {
    sender: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelHandler {
    /// Create a handler and the receiver its events arrive on
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    fn forward(&self, event: SessionEvent) {
        // Receiver gone means the host stopped listening.
        let _ = self.sender.send(event);
    }
}

#[async_trait]
impl SessionHandler for ChannelHandler {
    async fn on_display_text(&self, text: &str) {
        self.forward(SessionEvent::DisplayText(text.to_string()));
    }

    async fn on_context_changed(&self, token: &str) {
        self.forward(SessionEvent::ContextChanged(token.to_string()));
    }

    async fn on_error(&self, message: &str) {
        self.forward(SessionEvent::Error(message.to_string()));
    }

    async fn on_closed(&self) {
        self.forward(SessionEvent::Closed);
    }
}
