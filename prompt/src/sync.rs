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

//! The sync protocol: an in-band APC marker a test harness can send to learn
//! that every byte it wrote before the marker has been rendered.
//!
//! Requests and acks are framed as ANSI Application Program Command strings
//! (`ESC _ ... ESC \`) so they travel over the same byte stream as ordinary
//! input/output without a side channel, and any terminal that doesn't
//! understand APC simply ignores them.

use std::collections::VecDeque;

const ESC: u8 = 0x1B;
const PREFIX: &[u8] = b"\x1b_go-prompt:sync:";
const ACK_PREFIX: &str = "go-prompt:sync-ack:";
const TERMINATOR: &[u8] = b"\x1b\\";

/// Upper bound on the partial-sequence carry buffer. A single request that
/// exceeds this without a terminator is abandoned (fail-open) rather than
/// grown without bound.
pub const MAX_BUFFER: usize = 4096;

/// Extracts sync requests from a raw input stream, buffering partial
/// sequences across calls and queuing matched ids for later acknowledgment.
#[derive(Debug, Default)]
pub struct SyncExtractor {
    carry: Vec<u8>,
    pending: VecDeque<String>,
}

impl SyncExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes every complete sync request from `input`, returning the
    /// remaining bytes in their original relative order. Matched ids are
    /// appended to the internal FIFO; drain them with [`Self::drain_pending`].
    pub fn feed(&mut self, input: &[u8]) -> Vec<u8> {
        let mut data = std::mem::take(&mut self.carry);
        data.extend_from_slice(input);

        let mut out = Vec::with_capacity(data.len());
        let mut i = 0;
        while i < data.len() {
            if data[i] != ESC {
                out.push(data[i]);
                i += 1;
                continue;
            }

            let tail = &data[i..];
            if tail.len() < PREFIX.len() {
                if PREFIX.starts_with(tail) {
                    // Could still become a full prefix match; wait for more
                    // input unless it would blow the cap.
                    if tail.len() > MAX_BUFFER {
                        out.push(data[i]);
                        i += 1;
                        continue;
                    }
                    self.carry = tail.to_vec();
                    break;
                }
                out.push(data[i]);
                i += 1;
                continue;
            }

            if &tail[..PREFIX.len()] != PREFIX {
                out.push(data[i]);
                i += 1;
                continue;
            }

            match find_subslice(&tail[PREFIX.len()..], TERMINATOR) {
                Some(term_rel) => {
                    let id_bytes = &tail[PREFIX.len()..PREFIX.len() + term_rel];
                    self.pending
                        .push_back(String::from_utf8_lossy(id_bytes).into_owned());
                    i += PREFIX.len() + term_rel + TERMINATOR.len();
                }
                None => {
                    if tail.len() > MAX_BUFFER {
                        // Fail open: drop the cap-busting attempt one byte at
                        // a time so the scan resynchronizes on plain bytes.
                        out.push(data[i]);
                        i += 1;
                        continue;
                    }
                    self.carry = tail.to_vec();
                    break;
                }
            }
        }
        out
    }

    /// Drains every id matched since the last call, oldest first.
    pub fn drain_pending(&mut self) -> Vec<String> {
        self.pending.drain(..).collect()
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    #[must_use]
    pub fn carry_len(&self) -> usize {
        self.carry.len()
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Builds the wire bytes for a sync request with the given id (test/caller
/// helper — production requests are typically injected by a test harness
/// driving the prompt over a pipe).
#[must_use]
pub fn encode_request(id: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(PREFIX.len() + id.len() + TERMINATOR.len());
    out.extend_from_slice(PREFIX);
    out.extend_from_slice(id.as_bytes());
    out.extend_from_slice(TERMINATOR);
    out
}

/// Builds the wire bytes for an acknowledgment of `id`, sanitizing any byte
/// that would break APC framing.
#[must_use]
pub fn encode_ack(id: &str) -> Vec<u8> {
    let sanitized = sanitize_id(id);
    let mut out = Vec::with_capacity(1 + 1 + ACK_PREFIX.len() + sanitized.len() + TERMINATOR.len());
    out.push(ESC);
    out.push(b'_');
    out.extend_from_slice(ACK_PREFIX.as_bytes());
    out.extend_from_slice(sanitized.as_bytes());
    out.extend_from_slice(TERMINATOR);
    out
}

fn sanitize_id(id: &str) -> String {
    id.bytes()
        .map(|b| if b < 0x20 || b == 0x7F || b == b'\\' { b'?' } else { b })
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_single_request_from_middle_of_stream() {
        let mut parser = SyncExtractor::new();
        let mut stream = b"X".to_vec();
        stream.extend_from_slice(&encode_request("t1"));
        stream.push(b'Y');

        let remaining = parser.feed(&stream);
        assert_eq!(remaining, b"XY");
        assert_eq!(parser.drain_pending(), vec!["t1".to_string()]);
    }

    #[test]
    fn fragmented_request_reassembles_across_feed_calls() {
        let mut parser = SyncExtractor::new();
        let request = encode_request("split-me");
        let mut out = Vec::new();
        for chunk in request.chunks(3) {
            out.extend(parser.feed(chunk));
        }
        assert!(out.is_empty());
        assert_eq!(parser.drain_pending(), vec!["split-me".to_string()]);
    }

    #[test]
    fn multiple_requests_interleaved_with_user_bytes_emit_ids_in_order() {
        let mut parser = SyncExtractor::new();
        let mut stream = b"a".to_vec();
        stream.extend_from_slice(&encode_request("one"));
        stream.extend_from_slice(b"bc");
        stream.extend_from_slice(&encode_request("two"));
        stream.extend_from_slice(b"d");

        let remaining = parser.feed(&stream);
        assert_eq!(remaining, b"abcd");
        assert_eq!(
            parser.drain_pending(),
            vec!["one".to_string(), "two".to_string()]
        );
    }

    #[test]
    fn empty_id_is_legal() {
        let mut parser = SyncExtractor::new();
        let remaining = parser.feed(&encode_request(""));
        assert!(remaining.is_empty());
        assert_eq!(parser.drain_pending(), vec![String::new()]);
    }

    #[test]
    fn oversized_sequence_fails_open_without_growing_buffer_past_cap() {
        let mut parser = SyncExtractor::new();
        let mut stream = PREFIX.to_vec();
        stream.extend(std::iter::repeat(b'z').take(MAX_BUFFER + 500));
        // No terminator anywhere: the parser must eventually give up rather
        // than buffer unboundedly.
        let remaining = parser.feed(&stream);
        assert!(parser.carry_len() <= MAX_BUFFER);
        assert!(!remaining.is_empty());
        assert!(parser.drain_pending().is_empty());
    }

    #[test]
    fn sanitizes_control_bytes_and_backslash_in_ack() {
        let ack = encode_ack("a\\b\x01c");
        let text = String::from_utf8(ack).unwrap();
        assert_eq!(text, "\u{1b}_go-prompt:sync-ack:a?b?c\u{1b}\\");
    }
}
