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

//! The suggestion store: selection, scroll, visibility, and the
//! "snap-then-scroll" paging rules for the popup.
//!
//! `selected == -1` is a reachable state ("unfocused"), not merely the
//! absence of a selection: key bindings need to tell "cleared by the user"
//! apart from "advanced past the last suggestion", and both land here.

use std::panic::{self, AssertUnwindSafe};

use crate::completion::suggest::{Completer, Suggestion};
use crate::document::Document;
use crate::error::{panic_message, PromptError};

#[derive(Clone, Debug)]
pub struct CompletionManager {
    suggestions: Vec<Suggestion>,
    /// `-1` means unfocused. Otherwise an index into `suggestions`.
    selected: isize,
    vertical_scroll: usize,
    /// Configured maximum popup height, used when no render has yet
    /// established `last_window_height`.
    max: usize,
    /// Popup height from the most recent render; `0` until the first paint
    /// or after [`Self::clear_window_cache`].
    last_window_height: usize,
    hidden: bool,
    hide_after_execute: bool,
    start_char_index: usize,
    end_char_index: usize,
    word_separator: Option<String>,
}

impl CompletionManager {
    #[must_use]
    pub fn new(max: usize) -> Self {
        Self {
            suggestions: Vec::new(),
            selected: -1,
            vertical_scroll: 0,
            max,
            last_window_height: 0,
            hidden: false,
            hide_after_execute: false,
            start_char_index: 0,
            end_char_index: 0,
            word_separator: None,
        }
    }

    #[must_use]
    pub fn with_word_separator(max: usize, separator: impl Into<String>) -> Self {
        let mut m = Self::new(max);
        m.word_separator = Some(separator.into());
        m
    }

    #[must_use]
    pub fn word_separator(&self) -> Option<&str> {
        self.word_separator.as_deref()
    }

    fn effective_page_height(&self) -> usize {
        if self.last_window_height > 0 {
            self.last_window_height
        } else {
            self.max
        }
    }

    /// Invokes `completer` against `document` and stores the returned
    /// suggestions and replacement range. Never touches `selected` or
    /// `vertical_scroll`; callers that want a clean slate use [`Self::reset`].
    ///
    /// A panicking completer is recovered here: the previous suggestion list
    /// is left untouched and the panic is logged rather than propagated, so
    /// one bad completer call doesn't end the session.
    pub fn update<C: Completer + ?Sized>(&mut self, document: &Document, completer: &mut C) {
        let result = panic::catch_unwind(AssertUnwindSafe(|| completer.complete(document)));
        match result {
            Ok((suggestions, (start, end))) => {
                self.suggestions = suggestions;
                self.start_char_index = start;
                self.end_char_index = end;
            }
            Err(payload) => {
                let err = PromptError::Panicked(panic_message(&*payload));
                tracing::error!(%err, "completer panicked; keeping previous suggestions");
            }
        }
    }

    /// Clears selection and scroll, then re-runs `completer` against an
    /// empty document. Used at the start of a new line, not on every
    /// keystroke — see [`Self::refresh`] for that.
    pub fn reset<C: Completer + ?Sized>(&mut self, completer: &mut C) {
        self.selected = -1;
        self.vertical_scroll = 0;
        self.update(&Document::default(), completer);
    }

    /// Clears selection and scroll, then re-runs `completer` against the
    /// current `document`. Called after every edit so a fresh keystroke
    /// always starts from "unfocused" rather than carrying over a selection
    /// index that may no longer point at a related suggestion.
    pub fn refresh<C: Completer + ?Sized>(&mut self, document: &Document, completer: &mut C) {
        self.selected = -1;
        self.vertical_scroll = 0;
        self.update(document, completer);
    }

    pub fn clear_window_cache(&mut self) {
        self.last_window_height = 0;
    }

    #[must_use]
    pub fn get_selected_suggestion(&self) -> (Option<&Suggestion>, bool) {
        if self.selected >= 0 {
            let idx = self.selected as usize;
            (self.suggestions.get(idx), true)
        } else {
            (None, false)
        }
    }

    #[must_use]
    pub fn get_suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    #[must_use]
    pub fn replacement_range(&self) -> (usize, usize) {
        (self.start_char_index, self.end_char_index)
    }

    #[must_use]
    pub fn completing(&self) -> bool {
        self.selected != -1
    }

    #[must_use]
    pub fn selected_index(&self) -> isize {
        self.selected
    }

    #[must_use]
    pub fn vertical_scroll(&self) -> usize {
        self.vertical_scroll
    }

    #[must_use]
    pub fn last_window_height(&self) -> usize {
        self.last_window_height
    }

    #[must_use]
    pub fn configured_max(&self) -> usize {
        self.max
    }

    /// Records the popup height the renderer just painted with, so the next
    /// `next()`/`next_page()` call uses it as the effective page height.
    pub fn record_window_height(&mut self, height: usize) {
        self.last_window_height = height;
    }

    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn hide(&mut self) {
        self.hidden = true;
    }

    /// Reveals the popup; implicitly called by navigation keys.
    pub fn show(&mut self) {
        self.hidden = false;
    }

    pub fn hide_after_execute(&mut self, value: bool) {
        self.hide_after_execute = value;
    }

    #[must_use]
    pub fn should_hide_after_execute(&self) -> bool {
        self.hide_after_execute
    }

    /// Single-step selection; cycles past the last suggestion through `-1`
    /// (unfocused) back to `0`.
    pub fn next(&mut self) {
        let n = self.suggestions.len() as isize;
        let ph = self.effective_page_height();
        if self.selected >= n {
            self.selected = -1;
            self.vertical_scroll = 0;
        } else if self.selected < -1 {
            self.selected = n - 1;
            self.vertical_scroll = max_scroll_for(n, ph);
        } else {
            if ph > 0 && self.selected == self.vertical_scroll as isize + ph as isize - 1 {
                self.vertical_scroll += 1;
            }
            self.selected += 1;
        }
    }

    /// Symmetric to [`Self::next`].
    pub fn previous(&mut self) {
        let n = self.suggestions.len() as isize;
        let ph = self.effective_page_height();
        if self.selected < -1 {
            self.selected = n - 1;
            self.vertical_scroll = max_scroll_for(n, ph);
        } else if self.selected >= n {
            self.selected = 0;
            self.vertical_scroll = 0;
        } else {
            if self.selected == self.vertical_scroll as isize {
                self.vertical_scroll = self.vertical_scroll.saturating_sub(1);
            }
            self.selected -= 1;
        }
    }

    /// "Snap-then-scroll" sliding-window paging: the first press snaps the
    /// selection to the bottom of the current viewport; a second press at
    /// the bottom slides the window forward by a page.
    pub fn next_page(&mut self) {
        let n = self.suggestions.len() as isize;
        let ph = self.effective_page_height() as isize;
        if ph <= 0 || n == 0 {
            return;
        }
        if self.selected == -1 {
            self.selected = 0;
            self.vertical_scroll = 0;
            return;
        }
        let bottom = (self.vertical_scroll as isize + ph - 1).min(n - 1);
        if self.selected != bottom {
            self.selected = bottom;
            return;
        }
        let new_scroll = if ph == 1 { self.selected + 1 } else { self.selected };
        let max_scroll = (n - ph).max(0);
        if new_scroll > max_scroll {
            self.vertical_scroll = max_scroll as usize;
            self.selected = n - 1;
        } else {
            self.vertical_scroll = new_scroll as usize;
            self.selected = (self.vertical_scroll as isize + ph - 1).min(n - 1);
        }
    }

    /// Symmetric to [`Self::next_page`].
    pub fn previous_page(&mut self) {
        let n = self.suggestions.len() as isize;
        let ph = self.effective_page_height() as isize;
        if ph <= 0 || n == 0 {
            return;
        }
        if self.selected == -1 {
            self.selected = n - 1;
            self.vertical_scroll = (n - ph).max(0) as usize;
            return;
        }
        if self.selected != self.vertical_scroll as isize {
            self.selected = self.vertical_scroll as isize;
            return;
        }
        let new_scroll = if ph == 1 { self.selected - 1 } else { self.selected - ph + 1 };
        let new_scroll = new_scroll.max(0);
        self.vertical_scroll = new_scroll as usize;
        self.selected = new_scroll;
    }

    /// Called by the renderer on every paint to keep the selection inside
    /// `[vertical_scroll, vertical_scroll + window_height)`.
    pub fn adjust_window_height(&mut self, window_height: usize, content_height: usize) {
        if content_height == 0 {
            self.vertical_scroll = 0;
            return;
        }
        if self.selected >= content_height as isize {
            self.selected = content_height as isize - 1;
        }
        if self.selected >= 0 {
            let selected = self.selected as usize;
            if selected >= self.vertical_scroll + window_height {
                self.vertical_scroll = selected + 1 - window_height;
            }
            if selected < self.vertical_scroll {
                self.vertical_scroll = selected;
            }
        }
        let max_scroll = content_height.saturating_sub(window_height);
        self.vertical_scroll = self.vertical_scroll.clamp(0, max_scroll);
    }
}

fn max_scroll_for(n: isize, ph: usize) -> usize {
    (n - ph as isize).max(0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedCompleter(Vec<Suggestion>);

    impl Completer for FixedCompleter {
        fn complete(&mut self, _document: &Document) -> (Vec<Suggestion>, (usize, usize)) {
            (self.0.clone(), (0, 0))
        }
    }

    fn manager_with(n: usize, max: usize, last_window_height: usize) -> CompletionManager {
        let mut m = CompletionManager::new(max);
        let suggestions: Vec<Suggestion> = (0..n)
            .map(|i| Suggestion::new(format!("s{i}"), String::new()))
            .collect();
        let mut completer = FixedCompleter(suggestions);
        m.update(&Document::default(), &mut completer);
        m.last_window_height = last_window_height;
        m
    }

    #[test]
    fn paging_with_dynamic_viewport_matches_spec_scenario() {
        // 12 suggestions, configured max 10, but a prior render established
        // last_window_height = 5; three next_page calls land on 4, 8, 11.
        let mut m = manager_with(12, 10, 5);
        m.selected = 0;
        m.next_page();
        assert_eq!(m.selected, 4);
        assert_eq!(m.vertical_scroll, 0);
        m.next_page();
        assert_eq!(m.selected, 8);
        assert_eq!(m.vertical_scroll, 4);
        m.next_page();
        assert_eq!(m.selected, 11);
        assert_eq!(m.vertical_scroll, 7);
    }

    #[test]
    fn next_page_is_idempotent_once_selected_is_last() {
        let mut m = manager_with(12, 10, 5);
        m.selected = 11;
        m.vertical_scroll = 7;
        m.next_page();
        assert_eq!(m.selected, 11);
        assert_eq!(m.vertical_scroll, 7);
    }

    #[test]
    fn next_page_then_previous_page_returns_to_top_of_original_page() {
        let mut m = manager_with(12, 10, 5);
        m.selected = 2;
        m.vertical_scroll = 0;
        m.next_page();
        m.previous_page();
        // Landed back at the top of the page the selection started on.
        assert_eq!(m.selected, m.vertical_scroll as isize);
        assert!(m.selected <= 2);
    }

    #[test]
    fn next_from_unfocused_selects_first() {
        let mut m = manager_with(3, 10, 0);
        assert_eq!(m.selected, -1);
        m.next();
        assert_eq!(m.selected, 0);
    }

    #[test]
    fn next_cycles_past_end_to_unfocused_then_back_to_zero() {
        let mut m = manager_with(3, 10, 0);
        m.next(); // -1 -> 0
        m.next(); // 0 -> 1
        m.next(); // 1 -> 2
        m.next(); // 2 -> 3 (transient out-of-range)
        assert_eq!(m.selected, 3);
        m.next(); // normalizes to -1
        assert_eq!(m.selected, -1);
        m.next(); // -1 -> 0
        assert_eq!(m.selected, 0);
    }

    #[test]
    fn adjust_window_height_keeps_selection_visible() {
        let mut m = manager_with(20, 10, 0);
        m.selected = 15;
        m.vertical_scroll = 0;
        m.adjust_window_height(5, 20);
        assert!(m.selected >= 0);
        let selected = m.selected as usize;
        assert!(selected >= m.vertical_scroll && selected < m.vertical_scroll + 5);
    }

    #[test]
    fn adjust_window_height_clamps_selection_past_shrunk_content() {
        let mut m = manager_with(20, 10, 0);
        m.selected = 19;
        m.adjust_window_height(5, 3);
        assert_eq!(m.selected, 2);
    }

    #[test]
    fn reset_clears_selection_and_scroll() {
        let mut m = manager_with(5, 10, 0);
        m.selected = 3;
        m.vertical_scroll = 2;
        let mut completer = FixedCompleter(vec![]);
        m.reset(&mut completer);
        assert_eq!(m.selected, -1);
        assert_eq!(m.vertical_scroll, 0);
    }

    #[test]
    fn next_page_at_ph_one_always_advances_by_one() {
        // With a one-row effective page height, "at the bottom" is every
        // selection; next_page must keep advancing rather than going
        // idempotent at the last item.
        let mut m = manager_with(3, 1, 1);
        m.selected = 0;
        m.vertical_scroll = 0;
        m.next_page();
        assert_eq!((m.selected, m.vertical_scroll), (1, 1));
        m.next_page();
        assert_eq!((m.selected, m.vertical_scroll), (2, 2));
    }

    #[test]
    fn refresh_reruns_completer_against_the_live_document_and_clears_selection() {
        let mut m = manager_with(3, 10, 0);
        m.selected = 2;
        m.vertical_scroll = 1;
        let mut completer = FixedCompleter(vec![Suggestion::new("only".to_string(), String::new())]);
        m.refresh(&Document::new("abc", prompt_core::RuneIndex(3)), &mut completer);
        assert_eq!(m.selected, -1);
        assert_eq!(m.vertical_scroll, 0);
        assert_eq!(m.get_suggestions().len(), 1);
    }

    #[test]
    fn completing_reflects_selection() {
        let mut m = manager_with(3, 10, 0);
        assert!(!m.completing());
        m.next();
        assert!(m.completing());
    }
}
