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

//! Namespace prompt detection
//!
//! IRIS prints its current namespace as a prompt such as `USER>` or `%SYS>` at the
//! start of a line. The matcher only accepts tokens anchored at the start of the
//! buffer or immediately after a line feed.

/// Prompt terminator
const PROMPT_SUFFIX: u8 = b'>';

/// Find the last line-anchored namespace prompt in `text`, uppercased.
pub fn match_context(text: &str) -> Option<String> {
    text.split('\n').rev().find_map(token_at_line_start)
}

fn token_at_line_start(line: &str) -> Option<String> {
    let bytes = line.as_bytes();
    let len = bytes.iter().take_while(|b| is_token_byte(**b)).count();
    (len > 0 && bytes.get(len) == Some(&PROMPT_SUFFIX)).then(|| line[..len].to_ascii_uppercase())
}

fn is_token_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'%'
}
