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

//! Session configuration

use crate::FallbackSignature;
use iristerm_charcodec::Encoding;
use std::fmt;
use std::time::Duration;

/// Default telnet port for IRIS and Caché terminal services
pub const DEFAULT_PORT: u16 = 23;

/// Login credentials. Empty values skip the matching login phase.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Username sent at the `login:` / `username:` prompt
    pub username: String,

    /// Password sent at the `password:` prompt
    pub password: String,
}

impl Credentials {
    /// Create credentials from a username and password
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Pacing applied before each scripted login write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginTiming {
    /// Delay before sending the username
    pub user_delay: Duration,

    /// Delay before sending the password
    pub password_delay: Duration,

    /// Delay before sending the namespace switch
    pub context_delay: Duration,
}

impl Default for LoginTiming {
    fn default() -> Self {
        Self {
            user_delay: Duration::from_millis(300),
            password_delay: Duration::from_millis(300),
            context_delay: Duration::from_millis(600),
        }
    }
}

impl LoginTiming {
    /// No pacing at all
    pub fn immediate() -> Self {
        Self {
            user_delay: Duration::ZERO,
            password_delay: Duration::ZERO,
            context_delay: Duration::ZERO,
        }
    }
}

/// Whether TLS is attempted before plaintext
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsPolicy {
    /// Try TLS first, fall back to plaintext on an allow-listed failure
    #[default]
    Prefer,
    /// TLS only; a failed handshake is fatal
    Require,
    /// Plaintext only
    Disable,
}

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Server hostname or IP address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Name shown in the banner and terminal title
    pub display_name: String,

    /// Login credentials
    pub credentials: Credentials,

    /// Namespace to switch to after login (empty skips the switch)
    pub desired_context: String,

    /// Character encoding used on the wire
    pub encoding: Encoding,

    /// TLS policy
    pub tls_policy: TlsPolicy,

    /// Upper bound on TCP connect plus TLS handshake
    pub handshake_timeout: Duration,

    /// Upper bound on the plaintext TCP connect
    pub connect_timeout: Duration,

    /// Secure failures that trigger the plaintext fallback
    pub fallback_on: Vec<FallbackSignature>,

    /// Login write pacing
    pub login_timing: LoginTiming,

    /// Read buffer capacity
    pub buffer_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            display_name: "localhost".to_string(),
            credentials: Credentials::default(),
            desired_context: String::new(),
            encoding: Encoding::default(),
            tls_policy: TlsPolicy::default(),
            handshake_timeout: Duration::from_millis(1500),
            connect_timeout: Duration::from_secs(10),
            fallback_on: FallbackSignature::DEFAULTS.to_vec(),
            login_timing: LoginTiming::default(),
            buffer_size: 8192,
        }
    }
}

impl SessionConfig {
    /// Create a configuration for the given host on the default port
    pub fn new(host: impl Into<String>) -> Self {
        let host = host.into();
        Self {
            display_name: host.clone(),
            host,
            ..Default::default()
        }
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the display name
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Set the login credentials
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Set the namespace to switch to after login
    pub fn with_desired_context(mut self, context: impl Into<String>) -> Self {
        self.desired_context = context.into();
        self
    }

    /// Set the wire encoding
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Set the TLS policy
    pub fn with_tls_policy(mut self, policy: TlsPolicy) -> Self {
        self.tls_policy = policy;
        self
    }

    /// Set the handshake timeout
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Set the plaintext connect timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Replace the fallback allow-list
    pub fn with_fallback_on(
        mut self,
        signatures: impl IntoIterator<Item = FallbackSignature>,
    ) -> Self {
        self.fallback_on = signatures.into_iter().collect();
        self
    }

    /// Set the login pacing
    pub fn with_login_timing(mut self, timing: LoginTiming) -> Self {
        self.login_timing = timing;
        self
    }

    /// Set the read buffer size
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Get the server address as a string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Initial value of the last known context
    pub fn initial_context(&self) -> String {
        self.desired_context.to_uppercase()
    }

    /// Terminal title for the given context token
    pub fn title_for(&self, token: &str) -> String {
        if token.is_empty() {
            format!("IRIS: {}", self.display_name)
        } else {
            format!("IRIS: {} [{}]", self.display_name, token)
        }
    }

    /// Check whether a failure signature triggers the plaintext fallback
    pub fn allows_fallback(&self, signature: FallbackSignature) -> bool {
        self.tls_policy == TlsPolicy::Prefer && self.fallback_on.contains(&signature)
    }
}
