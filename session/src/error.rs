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

//! Error types for the session engine

use std::fmt;
use std::io;
use thiserror::Error;

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

/// Session error types
#[derive(Debug, Error)]
pub enum SessionError {
    /// I/O error from the underlying socket or TLS stream
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TLS configuration or protocol error
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Plaintext connect did not complete in time
    #[error("Connection to {0} timed out")]
    ConnectTimeout(String),

    /// TCP connect plus TLS handshake did not complete in time
    #[error("TLS handshake with {0} timed out")]
    HandshakeTimeout(String),

    /// Host cannot be used as a TLS server name
    #[error("Invalid server name: {0}")]
    InvalidServerName(String),

    /// Secure transport closed before any data was received
    #[error("Secure connection closed before any data was received")]
    ClosedBeforeData,

    /// `open()` was called on a session that was already opened
    #[error("Session already opened")]
    AlreadyOpen,

    /// The session has been closed
    #[error("Session closed")]
    Closed,
}

/// Failure signatures that mark an endpoint as "does not speak TLS".
///
/// A secure attempt failing with one of the signatures listed in
/// [`SessionConfig::fallback_on`](crate::SessionConfig) is retried once in plaintext.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FallbackSignature {
    /// The peer answered with something that is not a TLS record, or refused our version.
    ProtocolMismatch,
    /// The peer reset the connection during the handshake.
    ConnectionReset,
    /// The handshake did not complete within the handshake timeout.
    Timeout,
}

impl FallbackSignature {
    /// The default allow-list.
    pub const DEFAULTS: [FallbackSignature; 3] = [
        FallbackSignature::ProtocolMismatch,
        FallbackSignature::ConnectionReset,
        FallbackSignature::Timeout,
    ];
}

impl fmt::Display for FallbackSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackSignature::ProtocolMismatch => f.write_str("protocol mismatch"),
            FallbackSignature::ConnectionReset => f.write_str("connection reset"),
            FallbackSignature::Timeout => f.write_str("timeout"),
        }
    }
}

impl SessionError {
    /// Classify the error as a fallback signature, if it is one.
    pub fn fallback_signature(&self) -> Option<FallbackSignature> {
        match self {
            SessionError::HandshakeTimeout(_) => Some(FallbackSignature::Timeout),
            SessionError::Tls(error) => classify_tls(error),
            SessionError::Io(error) => match error.kind() {
                io::ErrorKind::ConnectionReset => Some(FallbackSignature::ConnectionReset),
                io::ErrorKind::TimedOut => Some(FallbackSignature::Timeout),
                io::ErrorKind::InvalidData => error
                    .get_ref()
                    .and_then(|inner| inner.downcast_ref::<rustls::Error>())
                    .and_then(classify_tls),
                _ => None,
            },
            _ => None,
        }
    }
}

fn classify_tls(error: &rustls::Error) -> Option<FallbackSignature> {
    use rustls::AlertDescription;

    let mismatch = matches!(
        error,
        rustls::Error::InvalidMessage(_)
            | rustls::Error::InappropriateMessage { .. }
            | rustls::Error::InappropriateHandshakeMessage { .. }
            | rustls::Error::PeerIncompatible(_)
            | rustls::Error::AlertReceived(
                AlertDescription::ProtocolVersion | AlertDescription::HandshakeFailure
            )
    );
    mismatch.then_some(FallbackSignature::ProtocolMismatch)
}
