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

//! A read-only façade over the live text and cursor, exposing line/column
//! geometry, word boundaries, and substrings for the completer, lexer, and
//! renderer. Only [`crate::buffer::EditBuffer`] constructs a [`Document`]
//! with a mutated `text`/`cursor_position`; this type never changes them.

use crate::key::Key;
use prompt_core::{byte_index_of_rune, display_width, rune_count, ColWidth, RuneIndex};

#[derive(Clone, Debug, PartialEq, Default)]
pub struct Document {
    /// Immutable UTF-8 snapshot of the full (possibly multi-line) text.
    pub text: String,
    /// Rune index into `text`. Invariant: `0 <= cursor_position <= rune_count(text)`.
    pub cursor_position: RuneIndex,
    /// Most recent logical key, for context-sensitive key bindings.
    pub last_key: Option<Key>,
}

impl Document {
    #[must_use]
    pub fn new(text: impl Into<String>, cursor_position: RuneIndex) -> Self {
        Self {
            text: text.into(),
            cursor_position,
            last_key: None,
        }
    }

    #[must_use]
    pub fn rune_count(&self) -> usize {
        rune_count(&self.text)
    }

    fn cursor_byte(&self) -> usize {
        byte_index_of_rune(&self.text, self.cursor_position)
    }

    #[must_use]
    pub fn text_before_cursor(&self) -> &str {
        &self.text[..self.cursor_byte()]
    }

    #[must_use]
    pub fn text_after_cursor(&self) -> &str {
        &self.text[self.cursor_byte()..]
    }

    /// 0-based index of the logical line (delimited by `\n`) the cursor is on.
    #[must_use]
    pub fn cursor_line_index(&self) -> usize {
        self.text_before_cursor().matches('\n').count()
    }

    /// The logical line the cursor is currently on (no trailing `\n`).
    #[must_use]
    pub fn current_line(&self) -> &str {
        let idx = self.cursor_line_index();
        self.text.split('\n').nth(idx).unwrap_or("")
    }

    /// Index of the last logical line in the whole text (0-based).
    #[must_use]
    pub fn last_row(&self) -> usize {
        self.text.matches('\n').count()
    }

    /// `{row, col}` in terminal coordinates for the current cursor, given a
    /// rendering width of `cols` columns, accounting for column-wise
    /// wrapping of each logical line.
    #[must_use]
    pub fn cursor_row_col(&self, cols: ColWidth) -> (usize, u16) {
        let cols = cols.0.max(1);
        let mut row = 0usize;
        // Sum wrapped rows contributed by every logical line strictly
        // before the cursor's line, then add the wrapped rows contributed
        // by the cursor's own line up to the cursor.
        let before = self.text_before_cursor();
        let mut lines = before.split('\n').peekable();
        let mut last_line = "";
        while let Some(line) = lines.next() {
            if lines.peek().is_some() {
                row += wrapped_row_count(line, cols);
            } else {
                last_line = line;
            }
        }
        let width_on_line = display_width(last_line).0;
        row += (width_on_line / cols) as usize;
        let col = width_on_line % cols;
        (row, col)
    }

    /// The word immediately before the cursor, stopping at `separator` if
    /// given, otherwise at any whitespace. Used for completion-word
    /// replacement ranges.
    #[must_use]
    pub fn word_before_cursor(&self, separator: Option<&str>) -> &str {
        let before = self.text_before_cursor();
        let start = match separator {
            Some(sep) if !sep.is_empty() => {
                let sep_bytes = sep.as_bytes();
                before
                    .as_bytes()
                    .windows(1)
                    .enumerate()
                    .rev()
                    .find(|(_, w)| sep_bytes.contains(&w[0]))
                    .map_or(0, |(i, _)| i + 1)
            }
            _ => before
                .char_indices()
                .rev()
                .find(|(_, c)| c.is_whitespace())
                .map_or(0, |(i, c)| i + c.len_utf8()),
        };
        &before[start..]
    }
}

fn wrapped_row_count(line: &str, cols: u16) -> usize {
    let w = display_width(line).0;
    1 + (w / cols) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_before_cursor_default_whitespace() {
        let doc = Document::new("hello world", RuneIndex(11));
        assert_eq!(doc.word_before_cursor(None), "world");
    }

    #[test]
    fn word_before_cursor_custom_separator() {
        let doc = Document::new("a.b.cde", RuneIndex(7));
        assert_eq!(doc.word_before_cursor(Some(".")), "cde");
    }

    #[test]
    fn current_line_multi_line() {
        let doc = Document::new("first\nsecond\nthird", RuneIndex(8));
        assert_eq!(doc.current_line(), "second");
        assert_eq!(doc.cursor_line_index(), 1);
    }

    #[test]
    fn last_row_counts_newlines() {
        let doc = Document::new("a\nb\nc", RuneIndex(0));
        assert_eq!(doc.last_row(), 2);
    }

    #[test]
    fn cursor_row_col_wraps_by_display_width() {
        let doc = Document::new("abcdefgh", RuneIndex(8));
        let (row, col) = doc.cursor_row_col(ColWidth(4));
        assert_eq!(row, 2);
        assert_eq!(col, 0);
    }
}
