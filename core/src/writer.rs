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

//! A buffered emitter of ANSI/VT escape sequences.
//!
//! Every method except [`LowLevelWriter::flush`] appends to an internal
//! buffer; nothing reaches the underlying file descriptor until `flush` is
//! called. This lets the renderer build up an entire frame (cursor moves,
//! colors, erases, text) as one allocation-free sequence of writes and then
//! commit it in a single `write_all` + `flush`, so the terminal never shows
//! a half-painted frame.
//!
//! Not thread-safe; used only on the event-loop thread.

use crossterm::{cursor, style, terminal, QueueableCommand};
use std::io::{self, Write};

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl From<Rgb> for style::Color {
    fn from(rgb: Rgb) -> Self {
        style::Color::Rgb {
            r: rgb.0,
            g: rgb.1,
            b: rgb.2,
        }
    }
}

/// Buffered ANSI/VT sequence emitter. Wraps any `Write` (typically `Stdout`
/// or, in tests, an in-memory mock).
pub struct LowLevelWriter<W: Write> {
    buffer: Vec<u8>,
    sink: W,
}

impl<W: Write> LowLevelWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            sink,
        }
    }

    /// Raw text, written as-is.
    pub fn text(&mut self, text: &str) -> io::Result<&mut Self> {
        self.buffer.write_all(text.as_bytes())?;
        Ok(self)
    }

    pub fn move_to(&mut self, col: u16, row: u16) -> io::Result<&mut Self> {
        self.buffer.queue(cursor::MoveTo(col, row))?;
        Ok(self)
    }

    pub fn move_to_column(&mut self, col: u16) -> io::Result<&mut Self> {
        self.buffer.queue(cursor::MoveToColumn(col))?;
        Ok(self)
    }

    pub fn move_up(&mut self, n: u16) -> io::Result<&mut Self> {
        if n > 0 {
            self.buffer.queue(cursor::MoveUp(n))?;
        }
        Ok(self)
    }

    pub fn move_down(&mut self, n: u16) -> io::Result<&mut Self> {
        if n > 0 {
            self.buffer.queue(cursor::MoveDown(n))?;
        }
        Ok(self)
    }

    pub fn scroll_up(&mut self, n: u16) -> io::Result<&mut Self> {
        if n > 0 {
            self.buffer.queue(terminal::ScrollUp(n))?;
        }
        Ok(self)
    }

    pub fn scroll_down(&mut self, n: u16) -> io::Result<&mut Self> {
        if n > 0 {
            self.buffer.queue(terminal::ScrollDown(n))?;
        }
        Ok(self)
    }

    pub fn set_scroll_region(&mut self, top: u16, bottom: u16) -> io::Result<&mut Self> {
        self.buffer
            .write_all(format!("\x1b[{};{}r", top + 1, bottom + 1).as_bytes())?;
        Ok(self)
    }

    pub fn reset_scroll_region(&mut self) -> io::Result<&mut Self> {
        self.buffer.write_all(b"\x1b[r")?;
        Ok(self)
    }

    pub fn erase_to_end_of_line(&mut self) -> io::Result<&mut Self> {
        self.buffer
            .queue(terminal::Clear(terminal::ClearType::UntilNewLine))?;
        Ok(self)
    }

    pub fn erase_down(&mut self) -> io::Result<&mut Self> {
        self.buffer
            .queue(terminal::Clear(terminal::ClearType::FromCursorDown))?;
        Ok(self)
    }

    pub fn erase_all(&mut self) -> io::Result<&mut Self> {
        self.buffer.queue(terminal::Clear(terminal::ClearType::All))?;
        Ok(self)
    }

    pub fn save_cursor(&mut self) -> io::Result<&mut Self> {
        self.buffer.queue(cursor::SavePosition)?;
        Ok(self)
    }

    pub fn restore_cursor(&mut self) -> io::Result<&mut Self> {
        self.buffer.queue(cursor::RestorePosition)?;
        Ok(self)
    }

    pub fn show_cursor(&mut self) -> io::Result<&mut Self> {
        self.buffer.queue(cursor::Show)?;
        Ok(self)
    }

    pub fn hide_cursor(&mut self) -> io::Result<&mut Self> {
        self.buffer.queue(cursor::Hide)?;
        Ok(self)
    }

    pub fn set_title(&mut self, title: &str) -> io::Result<&mut Self> {
        self.buffer.queue(terminal::SetTitle(title))?;
        Ok(self)
    }

    pub fn set_fg(&mut self, color: Rgb) -> io::Result<&mut Self> {
        self.buffer
            .queue(style::SetForegroundColor(color.into()))?;
        Ok(self)
    }

    pub fn set_bg(&mut self, color: Rgb) -> io::Result<&mut Self> {
        self.buffer
            .queue(style::SetBackgroundColor(color.into()))?;
        Ok(self)
    }

    pub fn reset_colors(&mut self) -> io::Result<&mut Self> {
        self.buffer.queue(style::ResetColor)?;
        Ok(self)
    }

    /// Bytes queued but not yet flushed. Exposed for the sync protocol, which
    /// needs to know whether a frame actually produced output before it
    /// queues the matching ack.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }
}

impl<W: Write> Write for LowLevelWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.write(buf)
    }

    /// The only method that commits bytes to the underlying sink.
    fn flush(&mut self) -> io::Result<()> {
        if !self.buffer.is_empty() {
            self.sink.write_all(&self.buffer)?;
            self.buffer.clear();
        }
        self.sink.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_reaches_sink_before_flush() {
        let mut out = Vec::new();
        {
            let mut w = LowLevelWriter::new(&mut out);
            w.text("hello").unwrap();
            assert!(w.pending_len() > 0);
        }
        assert!(out.is_empty());
    }

    #[test]
    fn flush_commits_and_clears_buffer() {
        let mut out = Vec::new();
        let mut w = LowLevelWriter::new(&mut out);
        w.text("hi").unwrap();
        w.flush().unwrap();
        assert_eq!(w.pending_len(), 0);
        drop(w);
        assert_eq!(out, b"hi");
    }
}
