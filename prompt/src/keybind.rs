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

//! Data-driven key bindings, lifted out of the inline key-dispatch `match`
//! the event loop would otherwise need, so callers can add, replace, or
//! cancel individual bindings without recompiling a `match` arm.

use crate::key::Key;
use strum_macros::EnumIter;

/// The semantic action a key binding resolves to. The event loop interprets
/// these against the Edit Buffer, History, and Completion Manager; it does
/// not know which physical key produced them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Action {
    SubmitLine,
    Interrupt,
    Eof,
    ClearScreen,
    ClearToStart,
    ClearLastWord,
    MoveBeginningOfLine,
    MoveEndOfLine,
    CursorLeft,
    CursorRight,
    CursorUp,
    CursorDown,
    DeleteBeforeCursor,
    DeleteForward,
    HistoryOlder,
    HistoryNewer,
    CompletionNext,
    CompletionPrevious,
    CompletionNextPage,
    CompletionPreviousPage,
    NewLine,
    /// A caller-defined action identified by an arbitrary ASCII code,
    /// dispatched back to caller code rather than interpreted internally.
    Custom(u8),
}

/// Which preset of bindings [`KeyBindings::for_mode`] starts from. `Emacs`
/// only differs from `Common` when the `emacs` feature is enabled; with it
/// disabled the two are identical, since the Ctrl-A/Ctrl-E bindings are
/// compiled out entirely rather than silently no-opping.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, EnumIter)]
pub enum KeyBindMode {
    #[default]
    Common,
    Emacs,
    /// No preset; the caller populates every binding via
    /// [`KeyBindings::bind`].
    User,
}

/// A key → action table. Lookup is linear since the table is small (tens of
/// entries) and rebuilt only at session start or on an explicit `bind`/
/// `cancel` call, never per-keystroke on a hot path that matters more than
/// the decoder's.
#[derive(Clone, Debug, Default)]
pub struct KeyBindings {
    entries: Vec<(Key, Action)>,
}

impl KeyBindings {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn for_mode(mode: KeyBindMode) -> Self {
        let mut bindings = Self::empty();
        match mode {
            KeyBindMode::User => {}
            KeyBindMode::Common | KeyBindMode::Emacs => {
                bindings.bind(Key::Enter, Action::SubmitLine);
                bindings.bind(Key::Ctrl('d'), Action::Eof);
                bindings.bind(Key::Ctrl('c'), Action::Interrupt);
                bindings.bind(Key::Ctrl('l'), Action::ClearScreen);
                bindings.bind(Key::Ctrl('u'), Action::ClearToStart);
                bindings.bind(Key::Ctrl('w'), Action::ClearLastWord);
                bindings.bind(Key::Left, Action::CursorLeft);
                bindings.bind(Key::Right, Action::CursorRight);
                bindings.bind(Key::Up, Action::CursorUp);
                bindings.bind(Key::Down, Action::CursorDown);
                bindings.bind(Key::Backspace, Action::DeleteBeforeCursor);
                bindings.bind(Key::Delete, Action::DeleteForward);
                bindings.bind(Key::Home, Action::MoveBeginningOfLine);
                bindings.bind(Key::End, Action::MoveEndOfLine);
                bindings.bind(Key::Tab, Action::CompletionNext);
                bindings.bind(Key::BackTab, Action::CompletionPrevious);
                bindings.bind(Key::PageUp, Action::CompletionPreviousPage);
                bindings.bind(Key::PageDown, Action::CompletionNextPage);
                if matches!(mode, KeyBindMode::Emacs) && cfg!(feature = "emacs") {
                    bindings.bind(Key::Ctrl('a'), Action::MoveBeginningOfLine);
                    bindings.bind(Key::Ctrl('e'), Action::MoveEndOfLine);
                }
            }
        }
        bindings
    }

    /// Registers `key` to `action`, replacing any existing binding for that
    /// key.
    pub fn bind(&mut self, key: Key, action: Action) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = action;
        } else {
            self.entries.push((key, action));
        }
    }

    /// Removes the binding for `key`. Returns `false` if none was
    /// registered — a programming error per the error-handling design, not
    /// a panic.
    pub fn cancel(&mut self, key: Key) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| *k != key);
        self.entries.len() != before
    }

    #[must_use]
    pub fn resolve(&self, key: Key) -> Option<Action> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, action)| *action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_mode_binds_enter_to_submit() {
        let bindings = KeyBindings::for_mode(KeyBindMode::Common);
        assert_eq!(bindings.resolve(Key::Enter), Some(Action::SubmitLine));
    }

    #[test]
    fn user_mode_starts_empty() {
        let bindings = KeyBindings::for_mode(KeyBindMode::User);
        assert_eq!(bindings.resolve(Key::Enter), None);
    }

    #[test]
    fn bind_replaces_existing_binding() {
        let mut bindings = KeyBindings::empty();
        bindings.bind(Key::Enter, Action::SubmitLine);
        bindings.bind(Key::Enter, Action::NewLine);
        assert_eq!(bindings.resolve(Key::Enter), Some(Action::NewLine));
    }

    #[test]
    fn cancel_reports_whether_a_binding_existed() {
        let mut bindings = KeyBindings::empty();
        bindings.bind(Key::Enter, Action::SubmitLine);
        assert!(bindings.cancel(Key::Enter));
        assert!(!bindings.cancel(Key::Enter));
    }

    #[test]
    fn custom_ascii_binding_round_trips() {
        let mut bindings = KeyBindings::empty();
        bindings.bind(Key::Ctrl('x'), Action::Custom(0x18));
        assert_eq!(bindings.resolve(Key::Ctrl('x')), Some(Action::Custom(0x18)));
    }
}
