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

use std::fmt;
use std::str::FromStr;

/// Character mapping applied to a terminal byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
    /// Single-byte mapping emulating the legacy Hebrew codepage used by Caché servers.
    ///
    /// Bytes `0x80..=0x9A` and `0xE0..=0xFA` decode to the Hebrew alphabet, everything
    /// else is treated as Latin-1.
    Legacy8Bit,
    /// Standard UTF-8, as spoken by IRIS servers.
    #[default]
    Utf8,
}

impl Encoding {
    /// Every supported encoding, in the order a host should offer them.
    pub const ALL: [Encoding; 2] = [Encoding::Legacy8Bit, Encoding::Utf8];

    /// Short uppercase label used in session banners.
    pub fn label(self) -> &'static str {
        match self {
            Encoding::Legacy8Bit => "WINDOWS1255",
            Encoding::Utf8 => "UTF8",
        }
    }

    /// Human readable description for selection prompts.
    pub fn description(self) -> &'static str {
        match self {
            Encoding::Legacy8Bit => "Hebrew (Windows-1255), Caché servers",
            Encoding::Utf8 => "UTF-8, IRIS servers",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when an encoding name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEncoding(pub String);

impl fmt::Display for UnknownEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown encoding '{}' (expected windows1255 or utf8)",
            self.0
        )
    }
}

impl std::error::Error for UnknownEncoding {}

impl FromStr for Encoding {
    type Err = UnknownEncoding;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "windows1255" | "windows-1255" | "cp1255" | "hebrew" | "legacy" | "legacy8bit" => {
                Ok(Encoding::Legacy8Bit)
            }
            "utf8" | "utf-8" => Ok(Encoding::Utf8),
            _ => Err(UnknownEncoding(s.to_string())),
        }
    }
}
