/*
 *   Licensed under the Apache License, Version 2.0 (the "License");
 *   you may not use this file except in compliance with the License.
 *   You may obtain a copy of the License at
 *
 *   http://www.apache.org/licenses/LICENSE-2.0
 *
 *   Unless required by applicable law or agreed to in writing, software
 *   distributed under the License is distributed on an "AS IS" BASIS,
 *   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *   See the License for the specific language governing permissions and
 *   limitations under the License.
 */

//! Maps a byte slice that begins at a key boundary to the most specific
//! logical key that matches a prefix of it.

use super::catalog::{is_ambiguous_prefix, match_longest_prefix, Key};

/// A single decoded key plus the raw bytes it consumed. For
/// [`Key::NotDefined`], `consumed` is the width of one UTF-8 code point (or
/// 1 byte for an invalid lead byte), since an undefined key is handed off to
/// text insertion, which operates one code point at a time.
#[derive(Clone, Debug, PartialEq)]
pub struct Decoded {
    pub key: Key,
    pub consumed: usize,
    pub bytes: Vec<u8>,
}

/// Decodes the first logical key at the start of `input`. Total: always
/// returns something, even for empty input (in which case `consumed == 0`).
#[must_use]
pub fn decode(input: &[u8]) -> Decoded {
    if input.is_empty() {
        return Decoded {
            key: Key::NotDefined,
            consumed: 0,
            bytes: Vec::new(),
        };
    }
    if let Some((key, len)) = match_longest_prefix(input) {
        return Decoded {
            key,
            consumed: len,
            bytes: input[..len].to_vec(),
        };
    }
    let width = utf8_lead_width(input[0]).min(input.len());
    Decoded {
        key: Key::NotDefined,
        consumed: width,
        bytes: input[..width].to_vec(),
    }
}

/// Decodes every key in `input` in order, stopping only when the remaining
/// bytes are exhausted.
#[must_use]
pub fn decode_all(mut input: &[u8]) -> Vec<Decoded> {
    let mut out = Vec::new();
    while !input.is_empty() {
        let decoded = decode(input);
        let consumed = decoded.consumed.max(1);
        out.push(decoded);
        input = &input[consumed..];
    }
    out
}

/// Decodes as many complete keys as `buf` unambiguously contains, draining
/// each one's bytes off the front. An escape-led tail that is still a
/// strict prefix of some longer catalog entry is left in `buf` rather than
/// prematurely decoded as a bare [`Key::Escape`] — unless `flush` is set
/// (the reader has hit EOF or a fatal error and no more bytes are coming),
/// in which case everything remaining is decoded as-is.
#[must_use]
pub fn decode_stream(buf: &mut Vec<u8>, flush: bool) -> Vec<Decoded> {
    let mut out = Vec::new();
    loop {
        if buf.is_empty() {
            break;
        }
        if !flush && is_ambiguous_prefix(buf) {
            break;
        }
        let decoded = decode(buf);
        let consumed = decoded.consumed.max(1);
        let bytes = buf.drain(..consumed).collect::<Vec<u8>>();
        out.push(Decoded {
            key: decoded.key,
            consumed,
            bytes,
        });
    }
    out
}

fn utf8_lead_width(byte: u8) -> usize {
    if byte & 0x80 == 0 {
        1
    } else if byte & 0xE0 == 0xC0 {
        2
    } else if byte & 0xF0 == 0xE0 {
        3
    } else if byte & 0xF8 == 0xF0 {
        4
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_escape_sequence() {
        let d = decode(b"\x1b[A");
        assert_eq!(d.key, Key::Up);
        assert_eq!(d.consumed, 3);
    }

    #[test]
    fn decodes_multi_byte_utf8_as_not_defined_whole_code_point() {
        let d = decode("é".as_bytes());
        assert_eq!(d.key, Key::NotDefined);
        assert_eq!(d.consumed, 2);
        assert_eq!(d.bytes, "é".as_bytes());
    }

    #[test]
    fn decode_all_splits_stream_in_order() {
        let input = b"a\x1b[Ab";
        let decoded = decode_all(input);
        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded[0].key, Key::NotDefined);
        assert_eq!(decoded[1].key, Key::Up);
        assert_eq!(decoded[2].key, Key::NotDefined);
    }

    #[test]
    fn empty_input_is_total() {
        let d = decode(b"");
        assert_eq!(d.consumed, 0);
        assert_eq!(d.key, Key::NotDefined);
    }

    #[test]
    fn decode_stream_holds_back_an_ambiguous_trailing_escape() {
        let mut buf = b"a\x1b".to_vec();
        let decoded = decode_stream(&mut buf, false);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].key, Key::NotDefined);
        assert_eq!(buf, b"\x1b".to_vec());
    }

    #[test]
    fn decode_stream_completes_once_the_rest_of_the_sequence_arrives() {
        let mut buf = b"\x1b".to_vec();
        buf.extend_from_slice(b"[A");
        let decoded = decode_stream(&mut buf, false);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].key, Key::Up);
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_stream_flush_decodes_a_lone_trailing_escape_as_escape() {
        let mut buf = b"\x1b".to_vec();
        let decoded = decode_stream(&mut buf, true);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].key, Key::Escape);
        assert!(buf.is_empty());
    }
}
