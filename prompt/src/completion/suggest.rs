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

//! A single completion candidate and the trait callers implement to supply
//! them.

use crate::document::Document;

/// One completion candidate: the text that replaces the word under the
/// cursor, plus an optional human-readable description shown alongside it
/// in the popup.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Suggestion {
    pub text: String,
    pub description: String,
}

impl Suggestion {
    #[must_use]
    pub fn new(text: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            description: description.into(),
        }
    }
}

/// Caller-supplied completion source. Invoked synchronously on the event
/// loop thread each time the buffer changes.
pub trait Completer {
    /// Returns the candidates for the current `document`, along with the
    /// `(start_char_index, end_char_index)` rune range they would replace.
    fn complete(&mut self, document: &Document) -> (Vec<Suggestion>, (usize, usize));
}

impl<F> Completer for F
where
    F: FnMut(&Document) -> (Vec<Suggestion>, (usize, usize)),
{
    fn complete(&mut self, document: &Document) -> (Vec<Suggestion>, (usize, usize)) {
        self(document)
    }
}
