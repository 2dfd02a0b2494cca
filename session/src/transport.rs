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

//! Byte transports
//!
//! [`TransportStream`] hides whether the socket is wrapped in TLS. [`Connector`] is the
//! seam the negotiator dials through, so tests can substitute in-memory streams.

use crate::{Result, SessionError};
use async_trait::async_trait;
use pin_project_lite::pin_project;
use rustls::DigitallySignedStruct;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use std::fmt;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tracing::debug;

/// Kind of an established transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// Unencrypted telnet
    Plain,
    /// TLS-wrapped telnet
    Secure,
}

/// Transport lifecycle as seen by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransportState {
    /// Session created, `open()` not yet called
    #[default]
    Idle,
    /// Dialing, or waiting for the first secure data
    NegotiatingSecure,
    /// Plaintext transport carrying data
    Plaintext,
    /// Secure transport carrying data
    Secure,
    /// Session ended
    Closed,
}

impl TransportState {
    /// Whether user input may be written
    pub fn is_active(self) -> bool {
        matches!(self, TransportState::Plaintext | TransportState::Secure)
    }
}

impl From<TransportKind> for TransportState {
    fn from(kind: TransportKind) -> Self {
        match kind {
            TransportKind::Plain => TransportState::Plaintext,
            TransportKind::Secure => TransportState::Secure,
        }
    }
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportState::Idle => "idle",
            TransportState::NegotiatingSecure => "negotiating-secure",
            TransportState::Plaintext => "plaintext",
            TransportState::Secure => "secure",
            TransportState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Dials plaintext and secure streams to a host.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Stream type produced by both dial methods
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Open a plaintext stream
    async fn connect_plain(&self, host: &str, port: u16) -> Result<Self::Stream>;

    /// Open a stream and complete a TLS handshake over it
    async fn connect_secure(&self, host: &str, port: u16) -> Result<Self::Stream>;
}

pin_project! {
    /// A TCP stream, optionally wrapped in TLS
    #[project = TransportStreamProj]
    pub enum TransportStream {
        /// Unencrypted socket
        Plain { #[pin] inner: TcpStream },
        /// TLS client stream
        Secure { #[pin] inner: Box<TlsStream<TcpStream>> },
    }
}

impl TransportStream {
    /// Kind of this stream
    pub fn kind(&self) -> TransportKind {
        match self {
            Self::Plain { .. } => TransportKind::Plain,
            Self::Secure { .. } => TransportKind::Secure,
        }
    }

    /// Get a reference to the underlying socket.
    pub fn get_ref(&self) -> &TcpStream {
        match self {
            Self::Plain { inner } => inner,
            Self::Secure { inner } => inner.get_ref().0,
        }
    }
}

impl fmt::Debug for TransportStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportStream")
            .field("kind", &self.kind())
            .field("peer", &self.get_ref().peer_addr().ok())
            .finish()
    }
}

impl AsyncRead for TransportStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.project() {
            TransportStreamProj::Plain { inner } => inner.poll_read(cx, buf),
            TransportStreamProj::Secure { inner } => inner.poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for TransportStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.project() {
            TransportStreamProj::Plain { inner } => inner.poll_write(cx, buf),
            TransportStreamProj::Secure { inner } => inner.poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.project() {
            TransportStreamProj::Plain { inner } => inner.poll_flush(cx),
            TransportStreamProj::Secure { inner } => inner.poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.project() {
            TransportStreamProj::Plain { inner } => inner.poll_shutdown(cx),
            TransportStreamProj::Secure { inner } => inner.poll_shutdown(cx),
        }
    }
}

/// Connector dialing real TCP sockets
#[derive(Clone)]
pub struct TcpConnector {
    tls: TlsConnector,
}

impl TcpConnector {
    /// Create a connector whose TLS handshakes accept any server certificate.
    ///
    /// IRIS terminal services are routinely deployed with self-signed certificates;
    /// encryption is opportunistic and the peer is not authenticated.
    pub fn new() -> Result<Self> {
        Ok(Self {
            tls: TlsConnector::from(unverified_client_config()?),
        })
    }
}

impl fmt::Debug for TcpConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TcpConnector").finish_non_exhaustive()
    }
}

#[async_trait]
impl Connector for TcpConnector {
    type Stream = TransportStream;

    async fn connect_plain(&self, host: &str, port: u16) -> Result<TransportStream> {
        let stream = TcpStream::connect((host, port)).await?;
        stream.set_nodelay(true)?;
        debug!(host, port, "plaintext socket connected");
        Ok(TransportStream::Plain { inner: stream })
    }

    async fn connect_secure(&self, host: &str, port: u16) -> Result<TransportStream> {
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|_| SessionError::InvalidServerName(host.to_string()))?;
        let stream = TcpStream::connect((host, port)).await?;
        stream.set_nodelay(true)?;
        let tls = self.tls.connect(server_name, stream).await?;
        debug!(host, port, "TLS handshake complete");
        Ok(TransportStream::Secure {
            inner: Box::new(tls),
        })
    }
}

/// Build a rustls client config that skips certificate verification.
pub fn unverified_client_config() -> Result<Arc<rustls::ClientConfig>> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let verifier = Arc::new(AcceptAnyCertificate {
        schemes: provider
            .signature_verification_algorithms
            .supported_schemes(),
    });
    let config = rustls::ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(verifier)
        .with_no_client_auth();
    Ok(Arc::new(config))
}

#[derive(Debug)]
struct AcceptAnyCertificate {
    schemes: Vec<rustls::SignatureScheme>,
}

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        self.schemes.clone()
    }
}
