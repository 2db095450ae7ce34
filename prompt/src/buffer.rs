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

//! The Edit Buffer: the only component that mutates text and cursor. Owns
//! the live [`Document`] plus `start_line`, the zero-based logical line
//! rendering begins from, used to keep the cursor visible when the input is
//! taller than the terminal.

use crate::document::Document;
use prompt_core::{
    byte_index_of_grapheme, byte_index_of_rune, display_width, grapheme_width, rune_count,
    ColWidth, GraphemeIndex, RuneIndex,
};
use unicode_segmentation::UnicodeSegmentation;

#[derive(Clone, Debug, Default)]
pub struct EditBuffer {
    pub document: Document,
    pub start_line: usize,
}

impl EditBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_text(text: String) -> Self {
        let n = rune_count(&text);
        Self {
            document: Document::new(text, RuneIndex(n)),
            start_line: 0,
        }
    }

    fn text(&self) -> &str {
        &self.document.text
    }

    fn cursor(&self) -> RuneIndex {
        self.document.cursor_position
    }

    fn cursor_byte(&self) -> usize {
        byte_index_of_rune(self.text(), self.cursor())
    }

    /// Inserts `text` at the cursor. If `overwrite`, first removes the runes
    /// the insertion would otherwise land on top of. Does not move the cursor.
    pub fn insert_text(&mut self, text: &str, overwrite: bool) {
        let at = self.cursor();
        if overwrite {
            let n = rune_count(text);
            self.remove_runes_at(at, n);
        }
        let byte = byte_index_of_rune(&self.document.text, at);
        self.document.text.insert_str(byte, text);
    }

    /// As [`Self::insert_text`], then advances the cursor past the inserted
    /// runes.
    pub fn insert_text_move_cursor(&mut self, text: &str, overwrite: bool) {
        self.insert_text(text, overwrite);
        self.document.cursor_position += rune_count(text);
    }

    fn remove_runes_at(&mut self, at: RuneIndex, n: usize) -> String {
        let total = self.document.rune_count();
        let end = (at.as_usize() + n).min(total);
        if end <= at.as_usize() {
            return String::new();
        }
        let start_byte = byte_index_of_rune(&self.document.text, at);
        let end_byte = byte_index_of_rune(&self.document.text, RuneIndex(end));
        self.document.text.drain(start_byte..end_byte).collect()
    }

    /// Removes `n` graphemes ending at the cursor; returns the removed text.
    pub fn delete_before_cursor(&mut self, n: usize) -> String {
        let cursor_byte = self.cursor_byte();
        let before = &self.document.text[..cursor_byte];
        let before_grapheme_count = before.graphemes(true).count();
        let take = n.min(before_grapheme_count);
        if take == 0 {
            return String::new();
        }
        let start_grapheme = before_grapheme_count - take;
        let start_byte = byte_index_of_grapheme(before, GraphemeIndex(start_grapheme));
        let removed: String = self.document.text.drain(start_byte..cursor_byte).collect();
        let removed_runes = rune_count(&removed);
        self.document.cursor_position -= removed_runes;
        removed
    }

    /// Removes `n` runes ending at the cursor; returns the removed text.
    pub fn delete_before_cursor_runes(&mut self, n: usize) -> String {
        let cursor = self.cursor();
        let start = cursor.as_usize().saturating_sub(n);
        let removed = self.remove_runes_at(RuneIndex(start), cursor.as_usize() - start);
        self.document.cursor_position = RuneIndex(start);
        removed
    }

    /// Removes `n` graphemes starting at the cursor; returns the removed text.
    pub fn delete(&mut self, n: usize) -> String {
        let cursor_byte = self.cursor_byte();
        let after = &self.document.text[cursor_byte..];
        let take = n.min(after.graphemes(true).count());
        if take == 0 {
            return String::new();
        }
        let end_byte = cursor_byte + byte_index_of_grapheme(after, GraphemeIndex(take));
        self.document.text.drain(cursor_byte..end_byte).collect()
    }

    /// Removes `n` runes starting at the cursor; returns the removed text.
    pub fn delete_runes(&mut self, n: usize) -> String {
        let cursor = self.cursor();
        self.remove_runes_at(cursor, n)
    }

    /// Replaces the rune range `[start, end)` with `text` and leaves the
    /// cursor immediately after the inserted text. Used to splice in an
    /// accepted completion suggestion over its replacement range.
    pub fn replace_rune_range(&mut self, start: usize, end: usize, text: &str) {
        let total = self.document.rune_count();
        let start = start.min(total);
        let end = end.clamp(start, total);
        let start_byte = byte_index_of_rune(&self.document.text, RuneIndex(start));
        let end_byte = byte_index_of_rune(&self.document.text, RuneIndex(end));
        self.document.text.replace_range(start_byte..end_byte, text);
        self.document.cursor_position = RuneIndex(start + rune_count(text));
    }

    /// Moves the cursor left by `n` graphemes, clamped to the start of text.
    /// Returns `true` if the cursor actually moved.
    pub fn cursor_left(&mut self, n: usize) -> bool {
        let cursor_byte = self.cursor_byte();
        let before = &self.document.text[..cursor_byte];
        let count = before.graphemes(true).count();
        let take = n.min(count);
        if take == 0 {
            return false;
        }
        let new_grapheme = count - take;
        let new_byte = byte_index_of_grapheme(before, GraphemeIndex(new_grapheme));
        let new_rune = self.document.text[..new_byte].chars().count();
        self.document.cursor_position = RuneIndex(new_rune);
        true
    }

    /// Moves the cursor left by `n` runes, clamped to the start of text.
    pub fn cursor_left_runes(&mut self, n: usize) -> bool {
        let cursor = self.cursor().as_usize();
        if cursor == 0 {
            return false;
        }
        self.document.cursor_position = RuneIndex(cursor.saturating_sub(n));
        true
    }

    /// Moves the cursor right by `n` graphemes, clamped to the end of text.
    pub fn cursor_right(&mut self, n: usize) -> bool {
        let cursor_byte = self.cursor_byte();
        let after = &self.document.text[cursor_byte..];
        let count = after.graphemes(true).count();
        let take = n.min(count);
        if take == 0 {
            return false;
        }
        let delta_bytes = byte_index_of_grapheme(after, GraphemeIndex(take));
        let delta_runes = self.document.text[cursor_byte..cursor_byte + delta_bytes]
            .chars()
            .count();
        self.document.cursor_position += delta_runes;
        true
    }

    /// Moves the cursor right by `n` runes, clamped to the end of text.
    pub fn cursor_right_runes(&mut self, n: usize) -> bool {
        let total = self.document.rune_count();
        let cursor = self.cursor().as_usize();
        if cursor >= total {
            return false;
        }
        self.document.cursor_position = RuneIndex((cursor + n).min(total));
        true
    }

    /// Moves the cursor up by `n` visual (post-wrap) rows, preserving its
    /// display column rather than its rune offset. Returns `true` if the
    /// cursor moved.
    pub fn cursor_up(&mut self, n: usize, cols: ColWidth) -> bool {
        self.cursor_vertical(n, cols, true)
    }

    /// Symmetric to [`Self::cursor_up`].
    pub fn cursor_down(&mut self, n: usize, cols: ColWidth) -> bool {
        self.cursor_vertical(n, cols, false)
    }

    fn cursor_vertical(&mut self, n: usize, cols: ColWidth, up: bool) -> bool {
        let ranges = visual_line_rune_ranges(&self.document.text, cols);
        let pos = self.cursor().as_usize();
        let current_idx = ranges
            .iter()
            .position(|&(start, end)| pos <= end && pos >= start)
            .unwrap_or(ranges.len().saturating_sub(1));

        let target_idx = if up {
            if current_idx == 0 {
                return false;
            }
            current_idx.saturating_sub(n)
        } else {
            if current_idx + 1 >= ranges.len() {
                return false;
            }
            (current_idx + n).min(ranges.len() - 1)
        };
        if target_idx == current_idx {
            return false;
        }

        let (cur_start, _) = ranges[current_idx];
        let col_before = rune_range_display_width(&self.document.text, cur_start, pos);

        let (tgt_start, tgt_end) = ranges[target_idx];
        let tgt_rune_len = tgt_end - tgt_start;
        let new_pos = tgt_start + rune_offset_at_width(&self.document.text, tgt_start, tgt_rune_len, col_before);
        self.document.cursor_position = RuneIndex(new_pos);
        true
    }

    /// Inserts a newline at the cursor; with `copy_margin`, also copies the
    /// current line's leading whitespace onto the new line.
    pub fn new_line(&mut self, copy_margin: bool) {
        let margin = if copy_margin {
            let line = self.document.current_line();
            let ws_len = line.chars().take_while(|c| *c == ' ' || *c == '\t').count();
            line.chars().take(ws_len).collect::<String>()
        } else {
            String::new()
        };
        let mut inserted = String::from("\n");
        inserted.push_str(&margin);
        self.insert_text_move_cursor(&inserted, false);
    }

    /// `{row, col}` in terminal coordinates for the current cursor.
    #[must_use]
    pub fn display_cursor_position(&self, cols: ColWidth) -> (usize, u16) {
        self.document.cursor_row_col(cols)
    }

    /// Recomputes `start_line` so the cursor stays within a `rows`-tall
    /// viewport.
    pub fn recalculate_start_line(&mut self, cols: ColWidth, rows: u16) {
        let (cursor_row, _) = self.display_cursor_position(cols);
        let rows = rows.max(1) as usize;
        if cursor_row < self.start_line {
            self.start_line = cursor_row;
        } else if cursor_row >= self.start_line + rows {
            self.start_line = cursor_row + 1 - rows;
        }
    }

    pub fn reset_start_line(&mut self) {
        self.start_line = 0;
    }
}

fn rune_range_display_width(text: &str, start_rune: usize, end_rune: usize) -> u16 {
    let start_byte = byte_index_of_rune(text, RuneIndex(start_rune));
    let end_byte = byte_index_of_rune(text, RuneIndex(end_rune));
    display_width(&text[start_byte..end_byte]).0
}

/// Rune offset, relative to `start_rune`, of the grapheme whose cumulative
/// display width within a row of `row_rune_len` runes first reaches `col`.
fn rune_offset_at_width(text: &str, start_rune: usize, row_rune_len: usize, col: u16) -> usize {
    let start_byte = byte_index_of_rune(text, RuneIndex(start_rune));
    let end_byte = byte_index_of_rune(text, RuneIndex(start_rune + row_rune_len));
    let row_text = &text[start_byte..end_byte];
    let mut width_seen = 0u16;
    let mut runes_seen = 0usize;
    for g in row_text.graphemes(true) {
        if width_seen >= col {
            return runes_seen;
        }
        width_seen += grapheme_width(g);
        runes_seen += g.chars().count();
    }
    runes_seen
}

/// Rune-index `[start, end]` ranges (inclusive end, i.e. the boundary rune
/// is shared with the next range) of each visual row after wrapping `text`
/// at `cols` display columns. A row boundary from wrapping never falls
/// inside a grapheme cluster.
fn visual_line_rune_ranges(text: &str, cols: ColWidth) -> Vec<(usize, usize)> {
    let cols = cols.0.max(1);
    let mut ranges = Vec::new();
    let mut rune_offset = 0usize;
    for (i, logical_line) in text.split('\n').enumerate() {
        if i > 0 {
            rune_offset += 1; // the newline rune consumed by `split`.
        }
        let mut seg_start = rune_offset;
        let mut width = 0u16;
        for g in logical_line.graphemes(true) {
            let gw = grapheme_width(g);
            if width > 0 && width + gw > cols {
                ranges.push((seg_start, rune_offset));
                seg_start = rune_offset;
                width = 0;
            }
            width += gw;
            rune_offset += g.chars().count();
        }
        ranges.push((seg_start, rune_offset));
    }
    if ranges.is_empty() {
        ranges.push((0, 0));
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_delete_before_cursor_round_trips() {
        let mut buf = EditBuffer::with_text("hello".to_string());
        let before_text = buf.document.text.clone();
        let before_cursor = buf.document.cursor_position;
        buf.insert_text_move_cursor(" world", false);
        assert_eq!(buf.document.text, "hello world");
        let removed = buf.delete_before_cursor_runes(6);
        assert_eq!(removed, " world");
        assert_eq!(buf.document.text, before_text);
        assert_eq!(buf.document.cursor_position, before_cursor);
    }

    #[test]
    fn display_cursor_position_advances_by_one_for_ascii() {
        let mut buf = EditBuffer::with_text(String::new());
        let (row0, col0) = buf.display_cursor_position(ColWidth(80));
        buf.insert_text_move_cursor("a", false);
        let (row1, col1) = buf.display_cursor_position(ColWidth(80));
        assert_eq!(row0, row1);
        assert_eq!(col1, col0 + 1);
    }

    #[test]
    fn overwrite_replaces_runes_at_cursor() {
        let mut buf = EditBuffer::with_text("abcdef".to_string());
        buf.document.cursor_position = RuneIndex(0);
        buf.insert_text("XY", true);
        assert_eq!(buf.document.text, "XYcdef");
        assert_eq!(buf.document.cursor_position, RuneIndex(0));
    }

    #[test]
    fn cursor_left_right_grapheme_aware() {
        let mut buf = EditBuffer::with_text("ab".to_string());
        assert!(buf.cursor_left(1));
        assert_eq!(buf.document.cursor_position, RuneIndex(1));
        assert!(!buf.cursor_left(0));
        assert!(buf.cursor_right(1));
        assert_eq!(buf.document.cursor_position, RuneIndex(2));
        assert!(!buf.cursor_right(1));
    }

    #[test]
    fn delete_forward_removes_graphemes_at_cursor() {
        let mut buf = EditBuffer::with_text("abcdef".to_string());
        buf.document.cursor_position = RuneIndex(2);
        let removed = buf.delete(2);
        assert_eq!(removed, "cd");
        assert_eq!(buf.document.text, "abef");
    }

    #[test]
    fn new_line_copies_leading_margin() {
        let mut buf = EditBuffer::with_text("  indented".to_string());
        buf.new_line(true);
        assert_eq!(buf.document.text, "  indented\n  ");
    }

    #[test]
    fn cursor_up_down_preserve_column_across_wrapped_rows() {
        let mut buf = EditBuffer::with_text("abcdefgh".to_string());
        buf.document.cursor_position = RuneIndex(6); // second row, col 2 at width 4.
        assert!(buf.cursor_up(1, ColWidth(4)));
        assert_eq!(buf.document.cursor_position, RuneIndex(2));
        assert!(buf.cursor_down(1, ColWidth(4)));
        assert_eq!(buf.document.cursor_position, RuneIndex(6));
    }

    #[test]
    fn replace_rune_range_splices_in_text_and_advances_cursor() {
        let mut buf = EditBuffer::with_text("fo bar".to_string());
        buf.replace_rune_range(0, 2, "food");
        assert_eq!(buf.document.text, "food bar");
        assert_eq!(buf.document.cursor_position, RuneIndex(4));
    }

    #[test]
    fn recalculate_start_line_keeps_cursor_in_view() {
        let mut buf = EditBuffer::with_text("a\nb\nc\nd\ne".to_string());
        buf.document.cursor_position = RuneIndex(buf.document.rune_count());
        buf.recalculate_start_line(ColWidth(80), 2);
        assert_eq!(buf.start_line, 3);
    }
}
