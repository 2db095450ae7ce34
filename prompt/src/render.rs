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

//! The differential renderer: repaints the prompt, wrapped input, and
//! completion popup each tick by returning to a fixed anchor (the start of
//! the prompt row) and erasing everything below before redrawing, rather
//! than diffing cell-by-cell against the previous frame.

use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use unicode_segmentation::UnicodeSegmentation;

use crate::buffer::EditBuffer;
use crate::completion::{format_suggestions, CompletionManager};
use crate::config::Palette;
use crate::error::{panic_message, PromptError};
use crate::lexer::{style_at, LexToken, Lexer, TokenStyle};
use prompt_core::{display_width, grapheme_width, ColWidth, LowLevelWriter, Rgb};

/// Cursor position relative to the prompt row (row 0, col 0), in terminal
/// cells, as left by the most recent flushed frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Cursor {
    row: u16,
    col: u16,
}

pub struct Renderer {
    cols: u16,
    rows: u16,
    previous_cursor: Cursor,
}

impl Renderer {
    #[must_use]
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            cols: cols.max(1),
            rows: rows.max(1),
            previous_cursor: Cursor::default(),
        }
    }

    #[must_use]
    pub fn cols(&self) -> u16 {
        self.cols
    }

    #[must_use]
    pub fn rows(&self) -> u16 {
        self.rows
    }

    /// Updates the known window size; returns `true` if it actually changed.
    fn update_window_size(&mut self, cols: u16, rows: u16) -> bool {
        let changed = cols != self.cols || rows != self.rows;
        self.cols = cols.max(1);
        self.rows = rows.max(1);
        changed
    }

    /// Forces the next `render` call to repaint from a blank slate, as after
    /// a resize.
    pub fn force_full_repaint(&mut self) {
        self.previous_cursor = Cursor::default();
    }

    /// Paints one frame: prompt prefix, wrapped input, and (if visible)
    /// completion popup. `cols`/`rows` are the latest known terminal size.
    #[allow(clippy::too_many_arguments)]
    pub fn render<W: Write>(
        &mut self,
        writer: &mut LowLevelWriter<W>,
        cols: u16,
        rows: u16,
        prefix: &str,
        buffer: &mut EditBuffer,
        completion: &mut CompletionManager,
        lexer: &mut dyn Lexer,
        palette: &Palette,
    ) -> io::Result<()> {
        if self.update_window_size(cols, rows) {
            completion.clear_window_cache();
            buffer.reset_start_line();
            self.force_full_repaint();
        }
        let cols = self.cols;
        let rows = self.rows;

        // Step 2: return to the anchor and erase everything below.
        writer.move_up(self.previous_cursor.row)?;
        writer.move_to_column(0)?;
        writer.erase_down()?;

        // Step 3: prompt prefix.
        writer.set_fg(palette.prefix)?;
        writer.text(prefix)?;
        writer.reset_colors()?;
        let prefix_width = display_width(prefix).0.min(cols.saturating_sub(1));
        let user_input_columns = ColWidth(cols.saturating_sub(prefix_width).max(1));

        // Step 4: wrapped input text, styled per grapheme by the lexer.
        let input_rows_budget = rows.saturating_sub(1).max(1);
        buffer.recalculate_start_line(user_input_columns, input_rows_budget);
        let text = buffer.document.text.clone();
        let tokens = match panic::catch_unwind(AssertUnwindSafe(|| lexer.tokenize(&text))) {
            Ok(tokens) => tokens,
            Err(payload) => {
                let err = PromptError::Panicked(panic_message(&*payload));
                tracing::error!(%err, "lexer panicked; painting this frame unstyled");
                Vec::new()
            }
        };
        let (cursor_row_abs, cursor_col) = buffer.display_cursor_position(user_input_columns);
        let cursor_row_in_view =
            (cursor_row_abs.saturating_sub(buffer.start_line)) as u16;

        let rows_painted = paint_wrapped_text(
            writer,
            &text,
            user_input_columns,
            buffer.start_line,
            input_rows_budget,
            &tokens,
            palette.input_text,
        )?;

        let input_cursor_col = if cursor_row_in_view == 0 {
            prefix_width + cursor_col
        } else {
            cursor_col
        };

        // Step 5: completion popup.
        let mut popup_rows_used = 0u16;
        if !completion.is_hidden() && !completion.get_suggestions().is_empty() {
            let n = completion.get_suggestions().len();
            let available_below =
                rows.saturating_sub(rows_painted).saturating_sub(1) as usize;
            let window_height = completion
                .configured_max()
                .min(n)
                .min(available_below.max(1));
            let window_height = window_height.max(1).min(n);
            completion.adjust_window_height(window_height, n);
            completion.record_window_height(window_height);

            popup_rows_used = paint_popup(writer, completion, cols, window_height, palette)?;
        }

        // Step 6: return the cursor to the input caret and remember where
        // that is for the next frame's anchor walk-back.
        let total_rows_below_anchor = rows_painted.saturating_sub(1) + popup_rows_used;
        writer.move_up(total_rows_below_anchor.saturating_sub(cursor_row_in_view))?;
        writer.move_to_column(input_cursor_col)?;
        self.previous_cursor = Cursor {
            row: cursor_row_in_view,
            col: input_cursor_col,
        };

        // Step 7: commit the frame.
        writer.flush()?;
        Ok(())
    }

    /// Paints a trailing newline sequence past the just-submitted input and
    /// any popup, so subsequent output starts on a fresh line.
    pub fn break_line<W: Write>(&mut self, writer: &mut LowLevelWriter<W>) -> io::Result<()> {
        writer.move_to_column(0)?;
        writer.text("\r\n")?;
        writer.flush()?;
        self.previous_cursor = Cursor::default();
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
fn paint_wrapped_text<W: Write>(
    writer: &mut LowLevelWriter<W>,
    text: &str,
    cols: ColWidth,
    start_line: usize,
    rows_budget: u16,
    tokens: &[LexToken],
    default_color: Rgb,
) -> io::Result<u16> {
    let ranges = visual_rows_byte_ranges(text, cols.0);
    let mut rows_painted = 0u16;
    let mut current_style: Option<TokenStyle> = None;

    for &(start, end) in ranges.iter().skip(start_line) {
        if rows_painted >= rows_budget {
            break;
        }
        if rows_painted > 0 {
            writer.text("\r\n")?;
        }
        let mut byte_offset = start;
        for grapheme in text[start..end].graphemes(true) {
            let style = style_at(tokens, byte_offset);
            if style != current_style {
                apply_style(writer, style, default_color)?;
                current_style = style;
            }
            writer.text(grapheme)?;
            byte_offset += grapheme.len();
        }
        writer.erase_to_end_of_line()?;
        rows_painted += 1;
    }
    writer.reset_colors()?;
    Ok(rows_painted.max(1))
}

/// Byte `[start, end)` ranges of each visual row after wrapping `text` at
/// `cols` display columns. Mirrors [`crate::buffer`]'s rune-indexed version
/// but in byte offsets, which is what the lexer's token ranges use.
fn visual_rows_byte_ranges(text: &str, cols: u16) -> Vec<(usize, usize)> {
    let cols = cols.max(1);
    let mut ranges = Vec::new();
    let mut byte_pos = 0usize;
    for (i, logical_line) in text.split('\n').enumerate() {
        if i > 0 {
            byte_pos += 1; // the '\n' byte consumed by `split`.
        }
        let mut seg_start = byte_pos;
        let mut width = 0u16;
        for g in logical_line.graphemes(true) {
            let gw = grapheme_width(g);
            if width > 0 && width + gw > cols {
                ranges.push((seg_start, byte_pos));
                seg_start = byte_pos;
                width = 0;
            }
            width += gw;
            byte_pos += g.len();
        }
        ranges.push((seg_start, byte_pos));
    }
    if ranges.is_empty() {
        ranges.push((0, 0));
    }
    ranges
}

fn apply_style<W: Write>(
    writer: &mut LowLevelWriter<W>,
    style: Option<TokenStyle>,
    default_color: Rgb,
) -> io::Result<()> {
    writer.reset_colors()?;
    match style {
        Some(s) => {
            writer.set_fg(s.fg.unwrap_or(default_color))?;
            if let Some(bg) = s.bg {
                writer.set_bg(bg)?;
            }
        }
        None => {
            writer.set_fg(default_color)?;
        }
    }
    Ok(())
}

/// Paints the completion popup beneath the input and returns the number of
/// terminal rows it used.
fn paint_popup<W: Write>(
    writer: &mut LowLevelWriter<W>,
    completion: &CompletionManager,
    cols: u16,
    window_height: usize,
    palette: &Palette,
) -> io::Result<u16> {
    let suggestions = completion.get_suggestions();
    let n = suggestions.len();
    let vertical_scroll = completion.vertical_scroll();
    let selected = completion.selected_index();

    // Reserve one column for the scrollbar.
    let popup_width = cols.saturating_sub(1).max(1);
    let rows = format_suggestions(suggestions, popup_width);

    let (thumb_top, thumb_h) = scrollbar_geometry(window_height, vertical_scroll, n);

    for row_offset in 0..window_height {
        let i = vertical_scroll + row_offset;
        if i >= n {
            break;
        }
        writer.text("\r\n")?;
        let is_selected = selected >= 0 && selected as usize == i;

        let text_color = if is_selected {
            palette.suggestion_text.selected
        } else {
            palette.suggestion_text.normal
        };
        let bg_color = if is_selected {
            palette.suggestion_background.selected
        } else {
            palette.suggestion_background.normal
        };
        writer.set_fg(text_color)?;
        writer.set_bg(bg_color)?;
        writer.text(rows.get(i).map(String::as_str).unwrap_or(""))?;
        writer.reset_colors()?;

        let on_thumb = row_offset >= thumb_top && row_offset < thumb_top + thumb_h;
        writer.set_bg(if on_thumb {
            palette.scrollbar_thumb
        } else {
            palette.scrollbar_background
        })?;
        writer.text(" ")?;
        writer.reset_colors()?;
        writer.erase_to_end_of_line()?;
    }
    Ok(window_height as u16)
}

/// `(thumb_top, thumb_height)` in popup rows, per the floating-point
/// formula: `thumb_h = max(1, floor(window_height * window_height / n))`,
/// `thumb_top = floor(window_height * vertical_scroll / n)`.
fn scrollbar_geometry(window_height: usize, vertical_scroll: usize, n: usize) -> (usize, usize) {
    if n == 0 || window_height == 0 {
        return (0, 0);
    }
    let fraction_visible = window_height as f64 / n as f64;
    let thumb_h = ((window_height as f64) * fraction_visible)
        .floor()
        .max(1.0) as usize;
    let thumb_h = thumb_h.min(window_height);
    let thumb_top = ((window_height as f64) * vertical_scroll as f64 / n as f64).floor() as usize;
    (thumb_top.min(window_height.saturating_sub(thumb_h)), thumb_h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrollbar_thumb_spans_whole_track_when_all_suggestions_fit() {
        let (top, h) = scrollbar_geometry(5, 0, 5);
        assert_eq!(top, 0);
        assert_eq!(h, 5);
    }

    #[test]
    fn scrollbar_thumb_shrinks_and_moves_with_scroll() {
        let (top_at_start, h) = scrollbar_geometry(5, 0, 20);
        assert_eq!(h, 1);
        assert_eq!(top_at_start, 0);
        let (top_at_end, _) = scrollbar_geometry(5, 15, 20);
        assert!(top_at_end >= 3);
    }

    #[test]
    fn visual_rows_byte_ranges_breaks_at_column_budget() {
        let ranges = visual_rows_byte_ranges("abcdefgh", 4);
        assert_eq!(ranges, vec![(0, 4), (4, 8)]);
    }

    #[test]
    fn visual_rows_byte_ranges_preserves_logical_newlines() {
        let ranges = visual_rows_byte_ranges("ab\ncd", 4);
        assert_eq!(ranges, vec![(0, 2), (3, 5)]);
    }
}
