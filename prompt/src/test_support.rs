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

//! In-memory stand-ins for the terminal, used by the event-loop and
//! renderer test suites instead of a real tty.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use crate::reader::Reader;

/// A cloneable `Write` sink backed by a shared buffer. Clones observe each
/// other's writes, the same way a real `stdout` handle would.
#[derive(Clone, Default)]
pub struct MockWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MockWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contents(&self) -> Vec<u8> {
        self.buffer.lock().unwrap().clone()
    }

    #[must_use]
    pub fn contents_as_string(&self) -> String {
        String::from_utf8(self.contents()).expect("utf8")
    }
}

impl Write for MockWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A [`Reader`] that replays a fixed byte sequence, then reports EOF. Lets a
/// test step the event loop through a scripted keystroke sequence without a
/// real tty, by constructing it from raw bytes (e.g. `b"abc\r"` for typing
/// `abc` and pressing Enter).
pub struct ScriptedReader {
    remaining: std::collections::VecDeque<u8>,
    window_size: (u16, u16),
}

impl ScriptedReader {
    #[must_use]
    pub fn new(script: impl Into<Vec<u8>>) -> Self {
        Self {
            remaining: script.into().into(),
            window_size: (80, 25),
        }
    }

    #[must_use]
    pub fn with_window_size(mut self, cols: u16, rows: u16) -> Self {
        self.window_size = (cols, rows);
        self
    }
}

impl Reader for ScriptedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining.is_empty() {
            return Ok(0);
        }
        let mut n = 0;
        while n < buf.len() {
            match self.remaining.pop_front() {
                Some(b) => {
                    buf[n] = b;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }

    fn window_size(&self) -> (u16, u16) {
        self.window_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_writer_clones_share_the_same_buffer() {
        let mut writer = MockWriter::new();
        let clone = writer.clone();
        writer.write_all(b"hello").unwrap();
        assert_eq!(clone.contents_as_string(), "hello");
    }

    #[test]
    fn scripted_reader_replays_bytes_then_reports_eof() {
        let mut reader = ScriptedReader::new(b"ab".to_vec());
        let mut buf = [0u8; 8];
        let n = reader.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"ab");
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }
}
