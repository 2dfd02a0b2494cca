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

//! Client error types

use iristerm_session::{SessionError, UnknownEncoding};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Profile file could not be parsed
    #[error("Invalid configuration {}: {source}", path.display())]
    Config {
        /// File that failed to parse
        path: PathBuf,
        /// Parser error
        source: toml::de::Error,
    },

    /// No profile with this id and no `--host` override
    #[error("Unknown server '{0}' (see `iris-terminal servers`)")]
    UnknownServer(String),

    /// Profile names an unsupported encoding
    #[error(transparent)]
    Encoding(#[from] UnknownEncoding),

    /// Session failed to start
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Tracing subscriber could not be installed
    #[error("Logging error: {0}")]
    Logging(String),
}

impl ClientError {
    /// Check if the error is caused by user-supplied configuration
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ClientError::Config { .. } | ClientError::UnknownServer(_) | ClientError::Encoding(_)
        )
    }
}
