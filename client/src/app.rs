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

//! Subcommand dispatch

use crate::cli::{Cli, Command, ConnectArgs};
use crate::logging::init_logging;
use crate::profiles::{self, ProfileFile};
use crate::terminal::{Keystrokes, RawMode, TerminalOutput, set_title, spawn_keyboard};
use crate::{ClientError, Result};
use iristerm_session::{Encoding, Session, SessionConfig, WireValue};
use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};

/// Run the parsed command line
pub async fn run(cli: Cli) -> Result<ExitCode> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    match cli.command {
        Command::Connect(args) => {
            let profiles = load_profiles(cli.config.as_deref())?;
            connect(build_config(&profiles, &args)?).await
        }
        Command::Servers => {
            let profiles = load_profiles(cli.config.as_deref())?;
            write_server_list(&profiles, &mut io::stdout().lock())?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Encodings => {
            write_encoding_list(&mut io::stdout().lock())?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Decode { line } => {
            print!("{}", WireValue::parse(&line));
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_profiles(path: Option<&Path>) -> Result<ProfileFile> {
    match path.map(Path::to_path_buf).or_else(profiles::default_path) {
        Some(path) => ProfileFile::load(&path),
        None => Ok(ProfileFile::default()),
    }
}

/// Resolve the session configuration for `connect`.
///
/// The profile named by `args.server` is the base; command line flags override
/// it. Without a matching profile `--host` is required.
pub fn build_config(profiles: &ProfileFile, args: &ConnectArgs) -> Result<SessionConfig> {
    let mut config = match (profiles.get(&args.server), &args.host) {
        (Some(profile), _) => profile.to_session_config(&args.server)?,
        (None, Some(host)) => SessionConfig::new(host.clone()).with_display_name(&args.server),
        (None, None) => return Err(ClientError::UnknownServer(args.server.clone())),
    };

    if let Some(host) = &args.host {
        config.host.clone_from(host);
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(encoding) = args.encoding {
        config.encoding = encoding;
    }
    if let Some(namespace) = &args.namespace {
        config.desired_context.clone_from(namespace);
    }
    if let Some(tls) = args.tls {
        config.tls_policy = tls.into();
    }
    Ok(config)
}

/// Print one line per profile: id, label and dial address
pub fn write_server_list(profiles: &ProfileFile, out: &mut impl Write) -> io::Result<()> {
    if profiles.servers.is_empty() {
        return writeln!(out, "No servers configured");
    }
    for (id, profile) in &profiles.servers {
        writeln!(
            out,
            "{id:<16} {label:<32} {host}:{port}",
            label = profile.label(id),
            host = profile.effective_host(),
            port = profile.port,
        )?;
    }
    Ok(())
}

/// Print one line per supported encoding: name and description
pub fn write_encoding_list(out: &mut impl Write) -> io::Result<()> {
    for encoding in Encoding::ALL {
        writeln!(
            out,
            "{:<16} {}",
            encoding.label().to_lowercase(),
            encoding.description()
        )?;
    }
    Ok(())
}

async fn connect(config: SessionConfig) -> Result<ExitCode> {
    info!(address = %config.address(), name = %config.display_name, "connecting");
    let output = Arc::new(TerminalOutput::new(io::stdout(), config.clone()));
    let session = Session::new(config)?.with_handler(output.clone());

    if let Err(err) = set_title(&session.title()) {
        warn!(%err, "could not set terminal title");
    }
    let raw_mode = RawMode::enable()?;
    session.open()?;

    let mut keys = spawn_keyboard();
    let mut input_open = true;
    loop {
        tokio::select! {
            () = session.closed() => break,
            chunk = keys.recv(), if input_open => match chunk {
                Some(Keystrokes::Text(text)) => session.handle_input(&text),
                Some(Keystrokes::Quit(text)) => {
                    if !text.is_empty() {
                        session.handle_input(&text);
                    }
                    session.close();
                }
                // Piped input ran out; keep showing output until the server hangs up.
                None => input_open = false,
            },
        }
    }
    drop(raw_mode);

    Ok(if output.failed() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
