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

//! Text the session injects into the display stream

use iristerm_charcodec::Encoding;

const CYAN: &str = "\x1b[36m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// First line shown when a session opens
pub fn banner(display_name: &str, encoding: Encoding) -> String {
    format!("{CYAN}--- IRIS Terminal: {display_name} [{}] ---{RESET}\r\n", encoding.label())
}

/// Shown once, before the first data of a secure transport
pub fn encrypted_notice() -> String {
    format!("{GREEN}--- Encrypted connection established ---{RESET}\r\n")
}

/// Inline error annotation
pub fn error_line(message: &str) -> String {
    format!("\r\n{RED}[ERROR]: {message}{RESET}\r\n")
}

/// Shown when a transport that carried data closes
pub fn disconnect_notice() -> String {
    format!("\r\n{YELLOW}--- Disconnected ---{RESET}\r\n")
}

/// Turns bare `\n` into `\r\n`, remembering a trailing `\r` across chunks.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewlineTranslator {
    after_cr: bool,
}

impl NewlineTranslator {
    /// Translate one chunk
    pub fn translate(&mut self, text: &str) -> String {
        let mut out = String::with_capacity(text.len() + text.len() / 8);
        for ch in text.chars() {
            if ch == '\n' && !self.after_cr {
                out.push('\r');
            }
            out.push(ch);
            self.after_cr = ch == '\r';
        }
        out
    }
}
