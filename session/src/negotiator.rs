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

//! TLS-first transport negotiation with a single plaintext fallback

use crate::{
    Connector, FallbackSignature, Result, SessionConfig, SessionError, TlsPolicy, TransportKind,
};
use bytes::BytesMut;
use metrics::counter;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

/// An established transport
#[derive(Debug)]
pub struct Negotiated<S> {
    /// The active stream
    pub stream: S,
    /// Whether the stream is encrypted
    pub kind: TransportKind,
    /// Bytes read while confirming the secure transport
    pub initial: Option<BytesMut>,
    /// Signature that caused a fallback to plaintext, if any
    pub fallback: Option<FallbackSignature>,
}

/// Chooses between a secure and a plaintext transport for one session.
#[derive(Debug)]
pub struct TransportNegotiator<C> {
    connector: Arc<C>,
    config: Arc<SessionConfig>,
}

impl<C: Connector> TransportNegotiator<C> {
    /// Create a negotiator
    pub fn new(connector: Arc<C>, config: Arc<SessionConfig>) -> Self {
        Self { connector, config }
    }

    /// Produce exactly one active transport.
    ///
    /// The secure candidate counts as established only after its first non-empty
    /// read, and the handshake timeout covers everything up to that read. Any
    /// failure before that whose signature is allow-listed drops the
    /// candidate and makes one plaintext attempt; every other failure is returned.
    #[instrument(
        skip(self),
        fields(address = %self.config.address(), policy = ?self.config.tls_policy)
    )]
    pub async fn negotiate(&self) -> Result<Negotiated<C::Stream>> {
        if self.config.tls_policy == TlsPolicy::Disable {
            return self.connect_plain(None).await;
        }

        let error = match self.connect_secure().await {
            Ok(negotiated) => return Ok(negotiated),
            Err(error) => error,
        };

        match error.fallback_signature() {
            Some(signature) if self.config.allows_fallback(signature) => {
                warn!(%signature, %error, "secure attempt failed, retrying in plaintext");
                counter!("iristerm.transport.fallbacks").increment(1);
                self.connect_plain(Some(signature)).await
            }
            _ => Err(error),
        }
    }

    async fn connect_secure(&self) -> Result<Negotiated<C::Stream>> {
        let config = &self.config;
        timeout(config.handshake_timeout, self.confirm_secure())
            .await
            .map_err(|_| SessionError::HandshakeTimeout(config.address()))?
    }

    /// Connect, handshake and wait for the first non-empty read.
    async fn confirm_secure(&self) -> Result<Negotiated<C::Stream>> {
        let config = &self.config;
        let mut stream = self.connector.connect_secure(&config.host, config.port).await?;

        let mut initial = BytesMut::with_capacity(config.buffer_size);
        let read = stream.read_buf(&mut initial).await?;
        if read == 0 {
            return Err(SessionError::ClosedBeforeData);
        }

        info!(bytes = read, "secure transport confirmed");
        Ok(Negotiated {
            stream,
            kind: TransportKind::Secure,
            initial: Some(initial),
            fallback: None,
        })
    }

    async fn connect_plain(
        &self,
        fallback: Option<FallbackSignature>,
    ) -> Result<Negotiated<C::Stream>> {
        let config = &self.config;
        let stream = timeout(
            config.connect_timeout,
            self.connector.connect_plain(&config.host, config.port),
        )
        .await
        .map_err(|_| SessionError::ConnectTimeout(config.address()))??;

        debug!("plaintext transport established");
        Ok(Negotiated {
            stream,
            kind: TransportKind::Plain,
            initial: None,
            fallback,
        })
    }
}
