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

//! Command line interface
//!
//! Provides command-line argument parsing using clap.

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use iristerm_session::{Encoding, TlsPolicy};
use serde::Deserialize;
use std::path::PathBuf;

/// Terminal for InterSystems IRIS and Caché servers.
#[derive(Debug, Parser)]
#[command(name = "iris-terminal", version, about)]
pub struct Cli {
    /// Server profile file (defaults to ~/.iristerm/servers.toml)
    #[arg(short = 'c', long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v warn, -vv info, -vvv debug, -vvvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Write logs to a file instead of stderr
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Open an interactive terminal to a server
    Connect(ConnectArgs),

    /// List the configured server profiles
    Servers,

    /// List the supported wire encodings
    Encodings,

    /// Pretty-print one `name=value` global node line
    Decode {
        /// Line as produced by a global dump
        line: String,
    },
}

/// Arguments of `connect`
#[derive(Debug, Clone, Args)]
pub struct ConnectArgs {
    /// Server profile id
    pub server: String,

    /// Override the profile host (or connect ad hoc when no profile matches)
    #[arg(long)]
    pub host: Option<String>,

    /// Override the profile port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Wire encoding (windows1255 or utf8)
    #[arg(short, long, value_parser = parse_encoding)]
    pub encoding: Option<Encoding>,

    /// Namespace to switch to after login
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// TLS policy
    #[arg(long, value_enum)]
    pub tls: Option<TlsMode>,
}

/// TLS policy as written on the command line and in profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    /// Try TLS, fall back to plaintext when the server does not speak it
    #[default]
    Prefer,
    /// TLS only
    Require,
    /// Plaintext only
    Disable,
}

impl From<TlsMode> for TlsPolicy {
    fn from(mode: TlsMode) -> Self {
        match mode {
            TlsMode::Prefer => TlsPolicy::Prefer,
            TlsMode::Require => TlsPolicy::Require,
            TlsMode::Disable => TlsPolicy::Disable,
        }
    }
}

fn parse_encoding(value: &str) -> Result<Encoding, String> {
    value.parse().map_err(|err: iristerm_session::UnknownEncoding| err.to_string())
}
