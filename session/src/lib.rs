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

//! # IRIS Terminal Session Engine
//!
//! Line-mode terminal sessions against InterSystems IRIS and Caché servers.
//!
//! ## Features
//!
//! - **Opportunistic TLS** - Tries TLS first and falls back to plaintext once when the
//!   server clearly does not speak it
//! - **Scripted Login** - Answers the username, password and namespace prompts once each
//! - **Context Tracking** - Reports namespace changes seen at `NAME>` prompts
//! - **Event-Driven** - Any number of [`SessionHandler`] listeners per session
//! - **Legacy Encodings** - Hebrew single-byte and UTF-8 via `iristerm-charcodec`
//!
//! ## Quick Start
//!
//! ```no_run
//! use iristerm_session::{CallbackHandler, Credentials, Session, SessionConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SessionConfig::new("iris.example.com")
//!         .with_display_name("Production")
//!         .with_credentials(Credentials::new("_SYSTEM", "SYS"))
//!         .with_desired_context("USER");
//!
//!     let session = Session::new(config)?.with_handler(Arc::new(CallbackHandler {
//!         on_display_text: Some(Box::new(|text| print!("{text}"))),
//!         ..Default::default()
//!     }));
//!     session.open()?;
//!     session.handle_input("write $ZV\r\n");
//!     session.closed().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Global Dumps
//!
//! ```
//! use iristerm_session::WireValue;
//!
//! let value = WireValue::parse("^Global=\"a*b**c\"");
//! assert_eq!(value.name, "^Global");
//! assert_eq!(value.pieces, vec!["a", "b", "", "c"]);
//! ```

#![warn(
    clippy::cargo,
    missing_docs,
    clippy::pedantic,
    future_incompatible,
    rust_2018_idioms
)]
#![allow(
    clippy::option_if_let_else,
    clippy::module_name_repetitions,
    clippy::missing_errors_doc
)]

mod config;
mod display;
mod error;
mod handler;
mod login;
mod negotiator;
mod payload;
pub mod prompt;
mod session;
mod transport;

pub use config::{Credentials, DEFAULT_PORT, LoginTiming, SessionConfig, TlsPolicy};
pub use error::{FallbackSignature, Result, SessionError};
pub use handler::{CallbackHandler, ChannelHandler, SessionEvent, SessionHandler};
pub use login::{LoginPhase, LoginSequencer, LoginStep};
pub use negotiator::{Negotiated, TransportNegotiator};
pub use payload::{PIECE_DELIMITER, UNNAMED_REFERENCE, WireValue};
pub use prompt::match_context;
pub use session::{Session, SessionStatus};
pub use transport::{
    Connector, TcpConnector, TransportKind, TransportState, TransportStream,
    unverified_client_config,
};

// Re-export codec types hosts need to configure a session
pub use iristerm_charcodec::{Encoding, UnknownEncoding};
