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

//! Session configuration: colors, viewport sizing, and the feature toggles
//! a caller sets once before starting a session.

use crate::key::Key;
use crate::keybind::{Action, KeyBindMode};
use crate::{CHANNEL_CAPACITY, HISTORY_SIZE_MAX};
use prompt_core::Rgb;

/// Color pairs for one rendered element: normal and selected/highlighted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorPair {
    pub normal: Rgb,
    pub selected: Rgb,
}

impl ColorPair {
    #[must_use]
    pub fn new(normal: Rgb, selected: Rgb) -> Self {
        Self { normal, selected }
    }
}

/// All colors used by the completion popup and input line.
#[derive(Clone, Copy, Debug)]
pub struct Palette {
    pub prefix: Rgb,
    pub input_text: Rgb,
    pub suggestion_text: ColorPair,
    pub suggestion_background: ColorPair,
    pub description_text: ColorPair,
    pub description_background: ColorPair,
    pub scrollbar_thumb: Rgb,
    pub scrollbar_background: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        let white = Rgb(255, 255, 255);
        let black = Rgb(0, 0, 0);
        let grey = Rgb(128, 128, 128);
        let blue = Rgb(0, 95, 215);
        Self {
            prefix: white,
            input_text: white,
            suggestion_text: ColorPair::new(white, black),
            suggestion_background: ColorPair::new(black, blue),
            description_text: ColorPair::new(grey, black),
            description_background: ColorPair::new(black, blue),
            scrollbar_thumb: white,
            scrollbar_background: grey,
        }
    }
}

/// Session-wide configuration, set once before `run()`.
#[derive(Clone, Debug)]
pub struct Options {
    pub palette: Palette,
    pub indent_size: usize,
    /// Configured completion popup height; used when no render has yet
    /// established a `last_window_height`.
    pub completion_max_height: usize,
    pub hide_completions_after_execute: bool,
    pub show_completions_at_start: bool,
    pub completion_on_down_arrow: bool,
    pub history_seed: Vec<String>,
    pub history_max_size: usize,
    pub title: Option<String>,
    pub sync_protocol_enabled: bool,
    pub graceful_close: bool,
    pub key_bind_mode: KeyBindMode,
    /// Extra key bindings layered on top of `key_bind_mode`'s preset, applied
    /// in order (later entries win on conflict, same as [`crate::keybind::KeyBindings::bind`]).
    pub key_bindings: Vec<(Key, Action)>,
    /// ASCII-code bindings: raw bytes with no catalog entry (`Key::NotDefined`,
    /// single-byte) that should resolve to an `Action` instead of being
    /// swallowed or inserted as text.
    pub ascii_bindings: Vec<(u8, Action)>,
    /// Bounded channel capacity between the background reader/signal tasks
    /// and the event loop; overridable for deterministic tests.
    pub input_buffer_channel_size: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            palette: Palette::default(),
            indent_size: 4,
            completion_max_height: 10,
            hide_completions_after_execute: true,
            show_completions_at_start: false,
            completion_on_down_arrow: true,
            history_seed: Vec::new(),
            history_max_size: HISTORY_SIZE_MAX,
            title: None,
            sync_protocol_enabled: false,
            graceful_close: true,
            key_bind_mode: KeyBindMode::Common,
            key_bindings: Vec::new(),
            ascii_bindings: Vec::new(),
            input_buffer_channel_size: CHANNEL_CAPACITY,
        }
    }
}

impl Options {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_indent_size(&mut self, size: usize) -> &mut Self {
        self.indent_size = size;
        self
    }

    pub fn set_completion_max_height(&mut self, height: usize) -> &mut Self {
        self.completion_max_height = height;
        self
    }

    pub fn set_hide_completions_after_execute(&mut self, value: bool) -> &mut Self {
        self.hide_completions_after_execute = value;
        self
    }

    pub fn set_show_completions_at_start(&mut self, value: bool) -> &mut Self {
        self.show_completions_at_start = value;
        self
    }

    pub fn set_completion_on_down_arrow(&mut self, value: bool) -> &mut Self {
        self.completion_on_down_arrow = value;
        self
    }

    pub fn set_history_seed(&mut self, seed: Vec<String>) -> &mut Self {
        self.history_seed = seed;
        self
    }

    pub fn set_history_max_size(&mut self, max_size: usize) -> &mut Self {
        self.history_max_size = max_size;
        self
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = Some(title.into());
        self
    }

    pub fn set_sync_protocol_enabled(&mut self, value: bool) -> &mut Self {
        self.sync_protocol_enabled = value;
        self
    }

    pub fn set_graceful_close(&mut self, value: bool) -> &mut Self {
        self.graceful_close = value;
        self
    }

    pub fn set_key_bind_mode(&mut self, mode: KeyBindMode) -> &mut Self {
        self.key_bind_mode = mode;
        self
    }

    /// Registers an extra key binding on top of `key_bind_mode`'s preset.
    pub fn add_key_binding(&mut self, key: Key, action: Action) -> &mut Self {
        self.key_bindings.push((key, action));
        self
    }

    /// Registers an ASCII-code binding: a raw byte with no catalog entry
    /// that should resolve to `action` instead of being swallowed or
    /// inserted as text.
    pub fn add_ascii_binding(&mut self, byte: u8, action: Action) -> &mut Self {
        self.ascii_bindings.push((byte, action));
        self
    }

    pub fn set_input_buffer_channel_size(&mut self, size: usize) -> &mut Self {
        self.input_buffer_channel_size = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let opts = Options::new();
        assert_eq!(opts.indent_size, 4);
        assert!(opts.hide_completions_after_execute);
        assert!(!opts.sync_protocol_enabled);
    }

    #[test]
    fn setters_chain_and_mutate() {
        let mut opts = Options::new();
        opts.set_indent_size(2).set_completion_max_height(5);
        assert_eq!(opts.indent_size, 2);
        assert_eq!(opts.completion_max_height, 5);
    }
}
