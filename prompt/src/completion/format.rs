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

//! Fixed-width formatting of the suggestion list's two columns.

use crate::completion::suggest::Suggestion;
use prompt_core::display_width;

const ELLIPSIS: &str = "...";

/// Pads, sizes, and truncates `suggestions` into fixed-width rows that fit
/// within `max_w` display columns. The text column is sized first; the
/// description column gets whatever width remains. Embedded newlines are
/// stripped before measuring.
#[must_use]
pub fn format_suggestions(suggestions: &[Suggestion], max_w: u16) -> Vec<String> {
    let cleaned: Vec<(String, String)> = suggestions
        .iter()
        .map(|s| (strip_newlines(&s.text), strip_newlines(&s.description)))
        .collect();

    let text_col_w = cleaned
        .iter()
        .map(|(text, _)| display_width(text).0 + 2) // one-space prefix + suffix
        .max()
        .unwrap_or(0)
        .min(max_w);

    let remaining = max_w.saturating_sub(text_col_w);
    let desc_col_w = cleaned
        .iter()
        .map(|(_, desc)| display_width(desc).0 + 2)
        .max()
        .unwrap_or(0)
        .min(remaining);

    cleaned
        .iter()
        .map(|(text, desc)| {
            let mut row = String::new();
            row.push_str(&pad_column(text, text_col_w));
            row.push_str(&pad_column(desc, desc_col_w));
            row
        })
        .collect()
}

fn strip_newlines(s: &str) -> String {
    s.chars().filter(|c| *c != '\n' && *c != '\r').collect()
}

/// Renders `text` into a column exactly `width` display columns wide: a
/// one-space prefix, the (possibly truncated) text, then space padding.
fn pad_column(text: &str, width: u16) -> String {
    if width == 0 {
        return String::new();
    }
    let inner_w = width.saturating_sub(2); // minus the one-space prefix/suffix
    let truncated = truncate_to_width(text, inner_w);
    let used = display_width(&truncated).0;
    let pad = inner_w.saturating_sub(used);
    format!(" {truncated}{} ", " ".repeat(pad as usize))
}

fn truncate_to_width(text: &str, width: u16) -> String {
    if display_width(text).0 <= width {
        return text.to_string();
    }
    if width <= ELLIPSIS.len() as u16 {
        return ELLIPSIS.chars().take(width as usize).collect();
    }
    let budget = width - ELLIPSIS.len() as u16;
    let mut out = String::new();
    let mut used = 0u16;
    for grapheme in unicode_segmentation::UnicodeSegmentation::graphemes(text, true) {
        let w = prompt_core::grapheme_width(grapheme);
        if used + w > budget {
            break;
        }
        out.push_str(grapheme);
        used += w;
    }
    out.push_str(ELLIPSIS);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_both_rows_to_equal_width() {
        let suggestions = vec![
            Suggestion::new("users", "list users"),
            Suggestion::new("u", "short"),
        ];
        let rows = format_suggestions(&suggestions, 80);
        assert_eq!(rows.len(), 2);
        assert_eq!(display_width(&rows[0]), display_width(&rows[1]));
        assert!(rows[0].starts_with(" users "));
    }

    #[test]
    fn truncates_with_ellipsis_when_over_budget() {
        let suggestions = vec![Suggestion::new("a-very-long-completion-candidate", "")];
        let rows = format_suggestions(&suggestions, 10);
        assert!(rows[0].contains("..."));
    }

    #[test]
    fn strips_embedded_newlines() {
        let suggestions = vec![Suggestion::new("a\nb", "c\r\nd")];
        let rows = format_suggestions(&suggestions, 80);
        assert!(!rows[0].contains('\n'));
        assert!(!rows[0].contains('\r'));
    }
}
