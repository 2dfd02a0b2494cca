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

//! Server profiles
//!
//! Profiles live in a TOML file, one table per server:
//!
//! ```toml
//! [servers.prod]
//! host = "iris.example.com"
//! port = 23
//! description = "Production"
//! username = "_SYSTEM"
//! password = "SYS"
//! namespace = "USER"
//! encoding = "windows1255"
//! tls = "prefer"
//! ```

use crate::cli::TlsMode;
use crate::{ClientError, Result};
use iristerm_session::{Credentials, DEFAULT_PORT, Encoding, SessionConfig};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// All configured servers, keyed by profile id
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileFile {
    /// Profiles by id
    pub servers: BTreeMap<String, ServerProfile>,
}

/// Web server block; its host wins over the profile host
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WebServer {
    /// Host the management portal runs on
    pub host: String,
}

/// One server entry
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerProfile {
    /// Telnet host
    pub host: String,
    /// Telnet port
    pub port: u16,
    /// Human readable label
    pub description: Option<String>,
    /// Login username
    pub username: String,
    /// Login password
    pub password: String,
    /// Namespace to switch to after login
    pub namespace: String,
    /// Wire encoding name
    pub encoding: Option<String>,
    /// Web server settings
    #[serde(alias = "webServer")]
    pub web_server: Option<WebServer>,
    /// TLS policy
    pub tls: TlsMode,
}

impl Default for ServerProfile {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            description: None,
            username: String::new(),
            password: String::new(),
            namespace: String::new(),
            encoding: None,
            web_server: None,
            tls: TlsMode::default(),
        }
    }
}

impl ServerProfile {
    /// Host to dial: the web server host when set, otherwise `host`
    pub fn effective_host(&self) -> &str {
        match &self.web_server {
            Some(web) if !web.host.is_empty() => &web.host,
            _ => &self.host,
        }
    }

    /// Label shown in listings, falling back to the profile id
    pub fn label<'a>(&'a self, id: &'a str) -> &'a str {
        self.description.as_deref().filter(|d| !d.is_empty()).unwrap_or(id)
    }

    /// Parsed wire encoding (UTF-8 when unset)
    pub fn encoding(&self) -> Result<Encoding> {
        match &self.encoding {
            Some(name) => Ok(name.parse()?),
            None => Ok(Encoding::default()),
        }
    }

    /// Session configuration for this profile, named after its id
    pub fn to_session_config(&self, id: &str) -> Result<SessionConfig> {
        Ok(SessionConfig::new(self.effective_host())
            .with_port(self.port)
            .with_display_name(id)
            .with_credentials(Credentials::new(&self.username, &self.password))
            .with_desired_context(&self.namespace)
            .with_encoding(self.encoding()?)
            .with_tls_policy(self.tls.into()))
    }
}

impl ProfileFile {
    /// Parse profiles from TOML text
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        toml::from_str(text).map_err(|source| ClientError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load profiles from `path`; a missing file yields no profiles
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => {
                let profiles = Self::parse(&text, path)?;
                debug!(path = %path.display(), count = profiles.servers.len(), "loaded profiles");
                Ok(profiles)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no profile file");
                Ok(Self::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Look up a profile by id
    pub fn get(&self, id: &str) -> Option<&ServerProfile> {
        self.servers.get(id)
    }
}

/// Default profile file location
pub fn default_path() -> Option<PathBuf> {
    home_dir().map(|home| home.join(".iristerm").join("servers.toml"))
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE")
        .or_else(|| std::env::var_os("HOME"))
        .map(PathBuf::from)
}
