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

//! Ordered submission history with a "working copy" overlay so recall
//! navigation never mutates the entries the user actually submitted.

use crate::buffer::EditBuffer;

#[derive(Clone, Debug, Default)]
pub struct History {
    /// Submitted strings, oldest first.
    entries: Vec<String>,
    /// `entries.len() + 1` slots; the last one is the in-progress input.
    working_copy: Vec<String>,
    /// Index into `working_copy`; `selected == entries.len()` is the
    /// in-progress slot.
    selected: usize,
    max_size: usize,
}

impl History {
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: Vec::new(),
            working_copy: vec![String::new()],
            selected: 0,
            max_size,
        }
    }

    #[must_use]
    pub fn with_seed(seed: Vec<String>, max_size: usize) -> Self {
        let mut h = Self::new(max_size);
        for line in seed {
            h.add(&line);
        }
        h
    }

    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    #[must_use]
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Appends a non-empty submission to `entries` and resets the overlay.
    pub fn add(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.entries.push(text.to_string());
        if self.max_size > 0 && self.entries.len() > self.max_size {
            let overflow = self.entries.len() - self.max_size;
            self.entries.drain(0..overflow);
        }
        self.clear();
    }

    /// Preserves `entries`; resets the in-progress overlay.
    pub fn clear(&mut self) {
        self.working_copy = self.entries.clone();
        self.working_copy.push(String::new());
        self.selected = self.entries.len();
    }

    /// Persists `current.document.text` into the overlay at `selected`,
    /// then — if not already at the oldest entry — steps back one and
    /// returns a fresh buffer seeded with that entry. Returns `(buffer,
    /// changed)`; `changed` is `false` if already at the oldest entry.
    #[must_use]
    pub fn older(&mut self, current: &EditBuffer) -> (EditBuffer, bool) {
        self.working_copy[self.selected] = current.document.text.clone();
        if self.selected == 0 {
            return (current.clone(), false);
        }
        self.selected -= 1;
        (EditBuffer::with_text(self.working_copy[self.selected].clone()), true)
    }

    /// Symmetric to [`Self::older`]; steps forward up to the in-progress slot.
    #[must_use]
    pub fn newer(&mut self, current: &EditBuffer) -> (EditBuffer, bool) {
        self.working_copy[self.selected] = current.document.text.clone();
        if self.selected >= self.entries.len() {
            return (current.clone(), false);
        }
        self.selected += 1;
        (EditBuffer::with_text(self.working_copy[self.selected].clone()), true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_older_then_newer_restores_buffer() {
        let mut h = History::new(100);
        h.add("x");
        let buf_before = EditBuffer::with_text("in progress".to_string());
        let (older_buf, changed) = h.older(&buf_before);
        assert!(changed);
        assert_eq!(older_buf.document.text, "x");

        let (newer_buf, changed) = h.newer(&older_buf);
        assert!(changed);
        assert_eq!(newer_buf.document.text, "in progress");
    }

    #[test]
    fn clear_preserves_entries_and_resets_selected() {
        let mut h = History::new(100);
        h.add("a");
        h.add("b");
        h.clear();
        assert_eq!(h.entries(), &["a".to_string(), "b".to_string()]);
        assert_eq!(h.selected(), h.entries().len());
    }

    #[test]
    fn older_at_oldest_entry_is_a_no_op() {
        let mut h = History::new(100);
        h.add("only");
        let buf = EditBuffer::with_text(String::new());
        let (_buf, changed) = h.older(&buf);
        assert!(changed);
        let (_buf2, changed2) = h.older(&_buf);
        assert!(!changed2);
    }

    #[test]
    fn working_copy_length_invariant() {
        let mut h = History::new(100);
        h.add("a");
        h.add("b");
        assert_eq!(h.working_copy.len(), h.entries.len() + 1);
    }

    #[test]
    fn max_size_truncates_oldest() {
        let mut h = History::new(2);
        h.add("a");
        h.add("b");
        h.add("c");
        assert_eq!(h.entries(), &["b".to_string(), "c".to_string()]);
    }
}
