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

//! # iris-terminal
//!
//! Command line front end for [`iristerm_session`]: server profiles, raw-mode
//! keyboard relay, terminal title updates and a global node decoder.
//!
//! ```text
//! iris-terminal servers
//! iris-terminal encodings
//! iris-terminal connect prod --namespace USER
//! iris-terminal connect scratch --host 10.0.0.9 --tls disable -e windows1255
//! iris-terminal decode '^Data(1)="a*b*c"'
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

pub mod app;
pub mod cli;
mod error;
pub mod logging;
pub mod profiles;
pub mod terminal;

pub use cli::{Cli, Command, ConnectArgs, TlsMode};
pub use error::{ClientError, Result};
pub use profiles::{ProfileFile, ServerProfile};
