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

//! The background reader: a platform-specific byte source, plus the task
//! that drains it, normalizes line endings, strips sync-protocol requests,
//! and forwards the rest to the event loop.

use std::io::{self, Read};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::sync::SyncExtractor;

/// Platform-specific terminal input contract. The core depends only on this
/// trait, never on a concrete terminal backend, so tests can supply a
/// scripted source.
pub trait Reader: Send + 'static {
    fn open(&mut self) -> io::Result<()> {
        Ok(())
    }
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
    /// Non-blocking: a "no data ready" condition is reported as
    /// `io::ErrorKind::WouldBlock`, not a fatal error.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    /// Falls back to a conservative 80x25 on query failure, per the
    /// error-handling design's terminal-state-failure policy.
    fn window_size(&self) -> (u16, u16);
}

impl Reader for Box<dyn Reader> {
    fn open(&mut self) -> io::Result<()> {
        (**self).open()
    }
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }
    fn window_size(&self) -> (u16, u16) {
        (**self).window_size()
    }
}

/// Reads from the process's standard input, via `crossterm` for the
/// window-size query.
pub struct CrosstermReader {
    stdin: io::Stdin,
}

impl CrosstermReader {
    #[must_use]
    pub fn new() -> Self {
        Self { stdin: io::stdin() }
    }
}

impl Default for CrosstermReader {
    fn default() -> Self {
        Self::new()
    }
}

impl Reader for CrosstermReader {
    fn open(&mut self) -> io::Result<()> {
        crossterm::terminal::enable_raw_mode()
    }

    fn close(&mut self) -> io::Result<()> {
        crossterm::terminal::disable_raw_mode()
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stdin.lock().read(buf)
    }

    fn window_size(&self) -> (u16, u16) {
        crossterm::terminal::size().unwrap_or((80, 25))
    }
}

const READ_CHUNK_SIZE: usize = 1024;
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// What the background reader task hands to the event loop.
#[derive(Debug)]
pub enum ReaderEvent {
    /// Decoded-ready bytes, with sync requests already stripped.
    Bytes(Vec<u8>),
    /// Synthetic end-of-input, standing in for a literal Ctrl-D so the loop
    /// has one code path for both.
    Eof,
    /// A non-transient I/O error; the loop treats this as fatal.
    Error(io::Error),
}

/// Spawns the background reader task. Runs on a blocking thread since
/// `Reader::read` is a blocking/non-blocking hybrid contract, not an async
/// one; forwards to `tx` and queues matched sync ids on `ack_tx`.
///
/// `initial_bytes` is forwarded verbatim before the first real `read()`
/// call; it is used when restarting the reader after an `executor` call
/// with bytes that were already decode-extracted but not yet consumed.
pub fn spawn<R: Reader>(
    reader: R,
    indent_size: usize,
    initial_bytes: Vec<u8>,
    tx: mpsc::Sender<ReaderEvent>,
    ack_tx: mpsc::UnboundedSender<String>,
) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        let mut reader = reader;
        if reader.open().is_err() {
            let _ = tx.blocking_send(ReaderEvent::Eof);
            return;
        }
        if !initial_bytes.is_empty() && tx.blocking_send(ReaderEvent::Bytes(initial_bytes)).is_err() {
            let _ = reader.close();
            return;
        }
        let mut extractor = SyncExtractor::new();
        let mut buf = [0u8; READ_CHUNK_SIZE];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => {
                    let _ = tx.blocking_send(ReaderEvent::Eof);
                    break;
                }
                Ok(n) => {
                    let translated = translate_raw_bytes(&buf[..n], indent_size);
                    let remaining = extractor.feed(&translated);
                    for id in extractor.drain_pending() {
                        let _ = ack_tx.send(id);
                    }
                    if !remaining.is_empty() && tx.blocking_send(ReaderEvent::Bytes(remaining)).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    std::thread::sleep(IDLE_POLL_INTERVAL);
                }
                Err(e) => {
                    let _ = tx.blocking_send(ReaderEvent::Error(e));
                    break;
                }
            }
        }
        let _ = reader.close();
    })
}

/// Normalizes a raw chunk before it reaches the sync extractor and key
/// decoder: `\r` always becomes `\n`. A lone tab byte (the shape a single
/// interactive keystroke arrives in) is left alone so the key catalog can
/// still decode it as `Key::Tab` for completion triggering; a tab embedded
/// in a larger chunk (pasted or programmatically written multi-byte input)
/// is expanded to `indent_size` spaces, since in that shape it cannot be a
/// single keystroke.
fn translate_raw_bytes(chunk: &[u8], indent_size: usize) -> Vec<u8> {
    if chunk == [0x09] {
        return chunk.to_vec();
    }
    let mut out = Vec::with_capacity(chunk.len());
    for &b in chunk {
        match b {
            b'\r' => out.push(b'\n'),
            0x09 => out.extend(std::iter::repeat(b' ').take(indent_size)),
            _ => out.push(b),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lone_tab_keystroke_passes_through_unmodified() {
        assert_eq!(translate_raw_bytes(&[0x09], 4), vec![0x09]);
    }

    #[test]
    fn embedded_tab_expands_to_indent_spaces() {
        assert_eq!(translate_raw_bytes(b"a\tb", 2), b"a  b".to_vec());
    }

    #[test]
    fn carriage_return_always_becomes_newline() {
        assert_eq!(translate_raw_bytes(b"a\r\r", 4), b"a\n\n".to_vec());
    }
}
