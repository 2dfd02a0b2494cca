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

//! # IRIS Terminal Character Codec
//!
//! Conversion between the raw bytes exchanged with a line-mode IRIS or Caché server
//! and the text shown to the user.
//!
//! ## Encodings
//!
//! - [`Encoding::Utf8`]: standard UTF-8, used by IRIS servers.
//! - [`Encoding::Legacy8Bit`]: a single-byte table emulating the Hebrew codepage used by
//!   older Caché installations. Two byte ranges map onto the Hebrew alphabet:
//!
//! | Bytes         | Decodes to          | Encodes from        |
//! |---------------|---------------------|---------------------|
//! | `0x80..=0x9A` | `U+05D0..=U+05EA`   | `U+05D0..=U+05EA`   |
//! | `0xE0..=0xFA` | `U+05D0..=U+05EA`   | (never produced)    |
//! | other         | same code point     | low byte, or `?` if >= 256 |
//!
//! ## Core Components
//!
//! ### Stateless functions
//!
//! [`decode`], [`encode`] and [`translate_backspace`] are pure and total.
//!
//! ### [`CharsetCodec`]
//!
//! A `tokio_util::codec` [`Decoder`](tokio_util::codec::Decoder) and
//! [`Encoder`](tokio_util::codec::Encoder) framing a byte stream into decoded text
//! chunks, buffering UTF-8 sequences split across reads.
//!
//! ## Usage Example
//!
//! ```rust
//! use iristerm_charcodec::{Encoding, decode, encode, translate_backspace};
//!
//! let text = decode(b"\xE9\xF9\xF8\xE0\xEC>", Encoding::Legacy8Bit);
//! assert_eq!(text, "ישראל>");
//!
//! let typed = translate_backspace("x\x7f");
//! assert_eq!(encode(&typed, Encoding::Legacy8Bit), b"x\x08".to_vec());
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

mod charset;
mod codec;
pub mod consts;
mod encoding;

pub use self::charset::{
    decode, decode_legacy_byte, encode, encode_legacy_char, translate_backspace,
};
pub use self::codec::CharsetCodec;
pub use self::encoding::{Encoding, UnknownEncoding};
