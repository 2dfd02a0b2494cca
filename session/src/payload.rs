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

//! Decoder for `name="piece*piece*..."` global dumps

use std::fmt;

/// Name used when the line carries no `=`
pub const UNNAMED_REFERENCE: &str = "unnamed reference";

/// Piece separator inside a value
pub const PIECE_DELIMITER: char = '*';

/// A reference and its `*`-delimited pieces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireValue {
    /// Text before the first `=`
    pub name: String,
    /// Pieces in order, empty ones included
    pub pieces: Vec<String>,
}

impl WireValue {
    /// Decode one line. Never fails.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (name, source) = match line.split_once('=') {
            Some((name, source)) => (name, source),
            None => (UNNAMED_REFERENCE, line),
        };
        let value = strip_quotes(source);
        Self {
            name: name.to_string(),
            pieces: value.split(PIECE_DELIMITER).map(str::to_string).collect(),
        }
    }

    /// Pieces paired with their 1-based position
    pub fn numbered(&self) -> impl Iterator<Item = (usize, &str)> {
        self.pieces
            .iter()
            .enumerate()
            .map(|(index, piece)| (index + 1, piece.as_str()))
    }
}

impl From<&str> for WireValue {
    fn from(line: &str) -> Self {
        Self::parse(line)
    }
}

impl fmt::Display for WireValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        for (position, piece) in self.numbered() {
            writeln!(f, "  {position:>3}: {piece}")?;
        }
        Ok(())
    }
}

fn strip_quotes(source: &str) -> &str {
    source
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(source)
}
