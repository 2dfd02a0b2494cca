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

//! Byte and code point constants for the legacy Hebrew mapping

/// First byte of the low legacy Hebrew sub-range (canonical for encoding)
pub const LOW_RANGE_START: u8 = 0x80;
/// Last byte of the low legacy Hebrew sub-range
pub const LOW_RANGE_END: u8 = 0x9A;
/// First byte of the high legacy Hebrew sub-range (decode only)
pub const HIGH_RANGE_START: u8 = 0xE0;
/// Last byte of the high legacy Hebrew sub-range
pub const HIGH_RANGE_END: u8 = 0xFA;

/// HEBREW LETTER ALEF
pub const HEBREW_ALEF: u32 = 0x05D0;
/// HEBREW LETTER TAV
pub const HEBREW_TAV: u32 = 0x05EA;

/// Byte written for code points the legacy mapping cannot represent
pub const REPLACEMENT_BYTE: u8 = b'?';

/// Delete, as sent by most keyboards for the backspace key
pub const DEL: char = '\x7f';
/// Backspace, as expected by line-mode servers
pub const BS: char = '\x08';
