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

use crate::Encoding;
use crate::charset::{self, utf8_complete_len};
use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

/// A codec turning a raw terminal byte stream into decoded text chunks and back.
///
/// Each call to [`Decoder::decode`] drains everything currently buffered into a single
/// text chunk, so one network read normally produces one chunk. Under
/// [`Encoding::Utf8`] a multi-byte character cut in half by the network is held back
/// until the rest of it arrives.
///
/// # Example
/// ```
/// use iristerm_charcodec::{CharsetCodec, Encoding};
/// use bytes::BytesMut;
/// use tokio_util::codec::{Decoder, Encoder};
///
/// let mut codec = CharsetCodec::new(Encoding::Legacy8Bit);
/// let mut input = BytesMut::from(&b"\x80\x81>"[..]);
/// assert_eq!(codec.decode(&mut input).unwrap().as_deref(), Some("אב>"));
///
/// let mut output = BytesMut::new();
/// codec.encode("ת", &mut output).unwrap();
/// assert_eq!(&output[..], &[0x9A]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CharsetCodec {
    encoding: Encoding,
}

impl CharsetCodec {
    /// Creates a codec for the given encoding.
    pub fn new(encoding: Encoding) -> CharsetCodec {
        CharsetCodec { encoding }
    }

    /// The encoding this codec applies.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }
}

impl Decoder for CharsetCodec {
    type Item = String;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }
        let available = match self.encoding {
            Encoding::Legacy8Bit => src.len(),
            Encoding::Utf8 => utf8_complete_len(src),
        };
        if available == 0 {
            trace!(pending = src.len(), "Waiting for the rest of a UTF-8 sequence");
            return Ok(None);
        }
        let bytes = src.split_to(available);
        Ok(Some(charset::decode(&bytes, self.encoding)))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>, Self::Error> {
        match self.decode(src)? {
            Some(text) => Ok(Some(text)),
            None if src.is_empty() => Ok(None),
            None => {
                // Stream ended inside a sequence, flush it lossily.
                let bytes = src.split();
                Ok(Some(charset::decode(&bytes, self.encoding)))
            }
        }
    }
}

impl Encoder<&str> for CharsetCodec {
    type Error = std::io::Error;

    fn encode(&mut self, item: &str, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let bytes = charset::encode(item, self.encoding);
        dst.reserve(bytes.len());
        dst.put_slice(&bytes);
        Ok(())
    }
}

impl Encoder<String> for CharsetCodec {
    type Error = std::io::Error;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.encode(item.as_str(), dst)
    }
}
