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

//! Stateless byte/text conversion
//!
//! These functions are total: every byte sequence decodes to some text and every
//! string encodes to some bytes. Under [`Encoding::Legacy8Bit`] the two directions
//! are deliberately asymmetric. Bytes from the high Hebrew sub-range (`0xE0..=0xFA`)
//! decode to Hebrew letters, but Hebrew letters always encode into the low
//! sub-range (`0x80..=0x9A`), which is what the legacy servers emit themselves.

use crate::Encoding;
use crate::consts::{
    BS, DEL, HEBREW_ALEF, HEBREW_TAV, HIGH_RANGE_END, HIGH_RANGE_START, LOW_RANGE_END,
    LOW_RANGE_START, REPLACEMENT_BYTE,
};
use std::borrow::Cow;

/// Decode a buffer received from the server into text.
///
/// UTF-8 decoding is lossy: invalid sequences become U+FFFD.
///
/// # Example
/// ```
/// use iristerm_charcodec::{Encoding, decode};
///
/// assert_eq!(decode(&[0x80, 0x81, b'!'], Encoding::Legacy8Bit), "אב!");
/// assert_eq!(decode("שלום".as_bytes(), Encoding::Utf8), "שלום");
/// ```
pub fn decode(bytes: &[u8], encoding: Encoding) -> String {
    match encoding {
        Encoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        Encoding::Legacy8Bit => bytes.iter().copied().map(decode_legacy_byte).collect(),
    }
}

/// Encode text for transmission to the server.
///
/// # Example
/// ```
/// use iristerm_charcodec::{Encoding, encode};
///
/// assert_eq!(encode("אב", Encoding::Legacy8Bit), vec![0x80, 0x81]);
/// assert_eq!(encode("€", Encoding::Legacy8Bit), vec![b'?']);
/// ```
pub fn encode(text: &str, encoding: Encoding) -> Vec<u8> {
    match encoding {
        Encoding::Utf8 => text.as_bytes().to_vec(),
        Encoding::Legacy8Bit => text.chars().map(encode_legacy_char).collect(),
    }
}

/// Map a single byte through the legacy Hebrew table.
pub fn decode_legacy_byte(byte: u8) -> char {
    let code = match byte {
        LOW_RANGE_START..=LOW_RANGE_END => HEBREW_ALEF + u32::from(byte - LOW_RANGE_START),
        HIGH_RANGE_START..=HIGH_RANGE_END => HEBREW_ALEF + u32::from(byte - HIGH_RANGE_START),
        _ => return char::from(byte),
    };
    char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
}

/// Map a single character back through the legacy Hebrew table.
///
/// Hebrew letters land in the low sub-range, other code points below 256 keep
/// their low byte and anything else becomes `?`.
pub fn encode_legacy_char(ch: char) -> u8 {
    let code = u32::from(ch);
    if (HEBREW_ALEF..=HEBREW_TAV).contains(&code) {
        return u8::try_from(code - HEBREW_ALEF).map_or(REPLACEMENT_BYTE, |offset| {
            LOW_RANGE_START + offset
        });
    }
    u8::try_from(code).unwrap_or(REPLACEMENT_BYTE)
}

/// Replace every DEL typed by the user with the BS control character.
///
/// Line-mode servers erase on BS, while terminals send DEL for the backspace key.
pub fn translate_backspace(input: &str) -> Cow<'_, str> {
    if input.contains(DEL) {
        Cow::Owned(input.replace(DEL, &BS.to_string()))
    } else {
        Cow::Borrowed(input)
    }
}

/// Length of the longest prefix of `bytes` that does not end inside a UTF-8 sequence.
///
/// Only a truncated multi-byte sequence at the very end is held back; invalid bytes
/// elsewhere are left for the lossy decoder.
pub(crate) fn utf8_complete_len(bytes: &[u8]) -> usize {
    let len = bytes.len();
    let floor = len.saturating_sub(4);
    let mut start = len;
    while start > floor {
        start -= 1;
        let byte = bytes[start];
        if byte & 0xC0 != 0x80 {
            let needed = match byte {
                0xC0..=0xDF => 2,
                0xE0..=0xEF => 3,
                0xF0..=0xF7 => 4,
                _ => 1,
            };
            return if len - start < needed { start } else { len };
        }
    }
    len
}
