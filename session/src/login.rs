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

//! Scripted login
//!
//! The sequencer watches decoded server output and answers the username, password
//! and namespace prompts exactly once each, in that order. Phases whose value is not
//! configured are skipped.

use crate::{Credentials, LoginTiming};
use std::fmt;
use std::time::Duration;

/// Login progress. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LoginPhase {
    /// Waiting for a `login:` or `username:` prompt
    AwaitingUser,
    /// Waiting for a `password:` prompt
    AwaitingPassword,
    /// Waiting for any `>` to send the namespace switch
    AwaitingContextSwitch,
    /// Nothing left to send
    Done,
}

impl LoginPhase {
    fn next(self) -> Self {
        match self {
            LoginPhase::AwaitingUser => LoginPhase::AwaitingPassword,
            LoginPhase::AwaitingPassword => LoginPhase::AwaitingContextSwitch,
            LoginPhase::AwaitingContextSwitch | LoginPhase::Done => LoginPhase::Done,
        }
    }
}

impl fmt::Display for LoginPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoginPhase::AwaitingUser => "awaiting-user",
            LoginPhase::AwaitingPassword => "awaiting-password",
            LoginPhase::AwaitingContextSwitch => "awaiting-context-switch",
            LoginPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// A login write scheduled by the sequencer
#[derive(Clone, PartialEq, Eq)]
pub struct LoginStep {
    /// Phase this step completes
    pub phase: LoginPhase,
    /// Text to send, including the trailing CRLF
    pub text: String,
    /// Pacing delay before the write
    pub delay: Duration,
}

impl fmt::Debug for LoginStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text: &dyn fmt::Debug = if self.phase == LoginPhase::AwaitingPassword {
            &"<redacted>"
        } else {
            &self.text
        };
        f.debug_struct("LoginStep")
            .field("phase", &self.phase)
            .field("text", text)
            .field("delay", &self.delay)
            .finish()
    }
}

/// Login state machine
#[derive(Debug, Clone)]
pub struct LoginSequencer {
    phase: LoginPhase,
    credentials: Credentials,
    context: String,
    timing: LoginTiming,
}

impl LoginSequencer {
    /// Create a sequencer, skipping any phase without a configured value.
    pub fn new(credentials: Credentials, context: impl Into<String>, timing: LoginTiming) -> Self {
        let mut sequencer = Self {
            phase: LoginPhase::AwaitingUser,
            credentials,
            context: context.into(),
            timing,
        };
        sequencer.skip_unconfigured();
        sequencer
    }

    /// Current phase
    pub fn phase(&self) -> LoginPhase {
        self.phase
    }

    /// Feed one decoded chunk and collect the steps it triggers, in order.
    pub fn observe(&mut self, chunk: &str) -> Vec<LoginStep> {
        let lowered = chunk.to_lowercase();
        let mut steps = Vec::new();

        while let Some(step) = self.step_for(chunk, &lowered) {
            steps.push(step);
            self.phase = self.phase.next();
            self.skip_unconfigured();
        }
        steps
    }

    fn step_for(&self, chunk: &str, lowered: &str) -> Option<LoginStep> {
        let (text, delay) = match self.phase {
            LoginPhase::AwaitingUser
                if lowered.contains("login:") || lowered.contains("username:") =>
            {
                (format!("{}\r\n", self.credentials.username), self.timing.user_delay)
            }
            LoginPhase::AwaitingPassword if lowered.contains("password:") => {
                (format!("{}\r\n", self.credentials.password), self.timing.password_delay)
            }
            LoginPhase::AwaitingContextSwitch if chunk.contains('>') => {
                (format!("zn \"{}\"\r\n", self.context), self.timing.context_delay)
            }
            _ => return None,
        };
        Some(LoginStep {
            phase: self.phase,
            text,
            delay,
        })
    }

    fn skip_unconfigured(&mut self) {
        loop {
            let configured = match self.phase {
                LoginPhase::AwaitingUser => !self.credentials.username.is_empty(),
                LoginPhase::AwaitingPassword => !self.credentials.password.is_empty(),
                LoginPhase::AwaitingContextSwitch => !self.context.is_empty(),
                LoginPhase::Done => true,
            };
            if configured {
                break;
            }
            self.phase = self.phase.next();
        }
    }
}
