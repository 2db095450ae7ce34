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

//! The single-threaded cooperative event loop. Owns every piece of session
//! state — the Edit Buffer, History, Completion Manager, Renderer, key
//! bindings, and the background reader/signal task handles — and is the
//! only place that mutates any of them. Reader and signal tasks only ever
//! hand it bytes and notifications over channels; all decoding and
//! dispatch happens here, one line at a time.

use std::io::Write;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::buffer::EditBuffer;
use crate::completion::{Completer, CompletionManager};
use crate::config::Options;
use crate::document::Document;
use crate::error::{ExitStatus, PromptError};
use crate::history::History;
use crate::key::catalog::is_ambiguous_prefix;
use crate::key::{decode_stream, Decoded, Key};
use crate::keybind::{Action, KeyBindings};
use crate::lexer::Lexer;
use crate::reader::ReaderEvent;
use crate::render::Renderer;
use crate::signal::SignalEvent;
use crate::sync::encode_ack;
use prompt_core::{display_width, ColWidth, LowLevelWriter};

/// Re-evaluated on every render, rather than fixed at session start.
pub type PrefixFn = Box<dyn FnMut() -> String + Send>;
/// `(current_text, indent_size) -> (next_indent, execute)`. Governs whether
/// Enter submits the line or inserts a continuation.
pub type ExecuteOnEnterFn = Box<dyn FnMut(&str, usize) -> (usize, bool) + Send>;
/// `(text, break_line) -> bool`. Consulted on submission; see
/// [`EventLoop::dispatch_action`]'s `SubmitLine` arm for how the two
/// `break_line` values map onto the "exit immediately" vs "exit after
/// executor" cases.
pub type ExitCheckerFn = Box<dyn FnMut(&str, bool) -> bool + Send>;
/// Called wherever the renderer paints a break-line (submit, reset, or
/// shutdown).
pub type BreakLineFn = Box<dyn FnMut(&Document) + Send>;
/// `(ascii_code, document)`. Invoked when an `Action::Custom` binding
/// resolves, whether from a key binding or an ASCII-code binding; the core
/// has no built-in interpretation for these, so the call is handed straight
/// back to caller code.
pub type CustomActionFn = Box<dyn FnMut(u8, &Document) + Send>;

/// Waits on an optional receiver, pending forever if there is none, so it
/// can sit as a `tokio::select!` branch without special-casing the absent
/// case at every call site.
async fn recv_opt<T>(rx: &mut Option<mpsc::Receiver<T>>) -> Option<T> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// How long a held-back ambiguous prefix (a lone Escape, or the start of an
/// unrecognized escape sequence) waits for the rest of its bytes before the
/// loop gives up and decodes what it has. Mirrors the escape-timing
/// convention most terminal input libraries use to disambiguate a bare Esc
/// keypress from the first byte of a multi-byte sequence.
const AMBIGUOUS_PREFIX_TIMEOUT: std::time::Duration = std::time::Duration::from_millis(25);

/// Pending forever when `byte_carry` is empty, so this can sit as an
/// always-present `tokio::select!` branch; only races the clock once there
/// are bytes sitting in the carry buffer with no terminator in sight.
async fn ambiguous_prefix_timeout(byte_carry: &[u8]) {
    if !byte_carry.is_empty() && is_ambiguous_prefix(byte_carry) {
        tokio::time::sleep(AMBIGUOUS_PREFIX_TIMEOUT).await;
    } else {
        std::future::pending::<()>().await;
    }
}

/// What one call to [`EventLoop::next_line`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// A line was submitted (Enter, with no completion absorbing it).
    Submitted(String),
    /// The session ended; the caller should stop calling `next_line`.
    Exit(ExitStatus),
}

/// A window-size query, independent of the reader task so the event loop
/// can re-poll it on `SIGWINCH` without owning the reader itself (which
/// runs on a dedicated blocking thread).
pub type WindowSizeFn = Arc<dyn Fn() -> (u16, u16) + Send + Sync>;

pub struct EventLoop<W: Write> {
    prefix_fn: PrefixFn,
    options: Options,
    buffer: EditBuffer,
    history: History,
    completion: CompletionManager,
    renderer: Renderer,
    key_bindings: KeyBindings,
    /// ASCII-code bindings: raw single bytes with no catalog entry that
    /// resolve to an `Action` instead of being swallowed or inserted.
    ascii_bindings: Vec<(u8, Action)>,
    completer: Box<dyn Completer + Send>,
    lexer: Box<dyn Lexer + Send>,
    writer: LowLevelWriter<W>,
    window_size_fn: WindowSizeFn,

    execute_on_enter: ExecuteOnEnterFn,
    exit_checker: Option<ExitCheckerFn>,
    break_line_callback: Option<BreakLineFn>,
    custom_action: Option<CustomActionFn>,

    reader_rx: mpsc::Receiver<ReaderEvent>,
    ack_rx: mpsc::UnboundedReceiver<String>,
    signal_rx: mpsc::UnboundedReceiver<SignalEvent>,
    /// Complete lines handed in from a [`crate::public_api::SharedWriter`],
    /// printed above the input line between ticks.
    out_rx: Option<mpsc::Receiver<Vec<u8>>>,
    /// The universal cancellation channel: closing or sending on its paired
    /// sender (held by [`crate::public_api::Prompt::close`]) unblocks the
    /// main select as its highest-priority branch from any task, at any
    /// time, including mid-session.
    stop_rx: mpsc::Receiver<()>,

    byte_carry: Vec<u8>,
    pending_acks: Vec<String>,
    force_clear: bool,
    /// Set when a previous submission hid completions via
    /// `hide_completions_after_execute`; cleared (and completions revealed)
    /// the next time ordinary text is typed.
    hidden_by_execute: bool,
}

impl<W: Write> EventLoop<W> {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        prompt_prefix: String,
        options: Options,
        writer: LowLevelWriter<W>,
        window_size_fn: WindowSizeFn,
        completer: Box<dyn Completer + Send>,
        lexer: Box<dyn Lexer + Send>,
        reader_rx: mpsc::Receiver<ReaderEvent>,
        ack_rx: mpsc::UnboundedReceiver<String>,
        signal_rx: mpsc::UnboundedReceiver<SignalEvent>,
        stop_rx: mpsc::Receiver<()>,
    ) -> Self {
        let (cols, rows) = window_size_fn();
        let mut key_bindings = KeyBindings::for_mode(options.key_bind_mode);
        for &(key, action) in &options.key_bindings {
            key_bindings.bind(key, action);
        }
        let ascii_bindings = options.ascii_bindings.clone();
        let history = History::with_seed(options.history_seed.clone(), options.history_max_size);
        let completion = CompletionManager::new(options.completion_max_height);
        Self {
            prefix_fn: Box::new(move || prompt_prefix.clone()),
            options,
            buffer: EditBuffer::new(),
            history,
            completion,
            renderer: Renderer::new(cols, rows),
            key_bindings,
            ascii_bindings,
            completer,
            lexer,
            writer,
            window_size_fn,
            execute_on_enter: Box::new(|_text, _indent_size| (0, true)),
            exit_checker: None,
            break_line_callback: None,
            custom_action: None,
            reader_rx,
            ack_rx,
            signal_rx,
            out_rx: None,
            stop_rx,
            byte_carry: Vec::new(),
            pending_acks: Vec::new(),
            force_clear: false,
            hidden_by_execute: false,
        }
    }

    #[must_use]
    pub fn with_out_rx(mut self, out_rx: mpsc::Receiver<Vec<u8>>) -> Self {
        self.out_rx = Some(out_rx);
        self
    }

    /// Overrides the prompt prefix with a callback re-evaluated on every
    /// render, rather than the fixed string passed to [`Self::new`].
    #[must_use]
    pub fn with_prefix_fn(mut self, prefix_fn: PrefixFn) -> Self {
        self.prefix_fn = prefix_fn;
        self
    }

    #[must_use]
    pub fn with_execute_on_enter(mut self, f: ExecuteOnEnterFn) -> Self {
        self.execute_on_enter = f;
        self
    }

    #[must_use]
    pub fn with_exit_checker(mut self, f: ExitCheckerFn) -> Self {
        self.exit_checker = Some(f);
        self
    }

    #[must_use]
    pub fn with_break_line_callback(mut self, f: BreakLineFn) -> Self {
        self.break_line_callback = Some(f);
        self
    }

    #[must_use]
    pub fn with_custom_action(mut self, f: CustomActionFn) -> Self {
        self.custom_action = Some(f);
        self
    }

    /// Layers `bindings` on top of whatever `key_bind_mode` already
    /// established, replacing any existing binding on conflict.
    #[must_use]
    pub fn with_key_bindings(mut self, bindings: Vec<(Key, Action)>) -> Self {
        for (key, action) in bindings {
            self.key_bindings.bind(key, action);
        }
        self
    }

    /// Registers an ASCII-code binding for a raw byte with no catalog entry.
    #[must_use]
    pub fn with_ascii_binding(mut self, byte: u8, action: Action) -> Self {
        self.ascii_bindings.push((byte, action));
        self
    }

    #[must_use]
    pub fn history_entries(&self) -> &[String] {
        self.history.entries()
    }

    /// Consulted by the caller after an `executor` call returns, with
    /// `break_line=true` — the "exit after executor" branch of
    /// `exit_checker`'s contract. The "exit immediately" branch
    /// (`break_line=false`) is checked internally in `dispatch_action`
    /// before the executor is ever invoked.
    #[must_use]
    pub fn exit_after_executor(&mut self, text: &str) -> bool {
        self.exit_checker.as_mut().is_some_and(|f| f(text, true))
    }

    /// Forces the next render to fully repaint. Used after an `executor`
    /// call returns, since the terminal was cooked (and possibly touched by
    /// the executor's own output) while the loop was suspended.
    pub fn mark_needs_full_repaint(&mut self) {
        self.force_clear = true;
    }

    /// Any bytes still sitting in the decode carry buffer, to be handed
    /// back to a freshly-restarted Reader as its initial input once the
    /// background tasks are respawned after an `executor` call.
    #[must_use]
    pub fn take_byte_carry(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.byte_carry)
    }

    /// Runs until one line is submitted or the session ends. On
    /// `Submitted`, the edit buffer and completion state are reset so the
    /// next call starts a fresh line; on `Exit`, the caller should not call
    /// this again.
    pub async fn next_line(&mut self) -> Result<LineOutcome, PromptError> {
        self.buffer = EditBuffer::new();
        self.completion.reset(self.completer.as_mut());
        if self.options.show_completions_at_start {
            self.completion.show();
        } else {
            self.completion.hide();
        }
        self.render_frame()?;

        loop {
            tokio::select! {
                biased;

                _ = self.stop_rx.recv() => {
                    if self.options.graceful_close {
                        let leftover = decode_stream(&mut self.byte_carry, true);
                        self.handle_batch(leftover)?;
                    }
                    self.break_line()?;
                    if !self.pending_acks.is_empty() {
                        self.render_frame()?;
                    }
                    return Ok(LineOutcome::Exit(ExitStatus::EndOfInput));
                }

                maybe_event = self.reader_rx.recv() => {
                    match maybe_event {
                        Some(ReaderEvent::Bytes(bytes)) => {
                            self.byte_carry.extend_from_slice(&bytes);
                            let decoded = decode_stream(&mut self.byte_carry, false);
                            if let Some(outcome) = self.handle_batch(decoded)? {
                                return Ok(outcome);
                            }
                            self.render_frame()?;
                        }
                        Some(ReaderEvent::Eof) => {
                            let decoded = decode_stream(&mut self.byte_carry, true);
                            if let Some(outcome) = self.handle_batch(decoded)? {
                                return Ok(outcome);
                            }
                            self.render_frame()?;
                            return Ok(LineOutcome::Exit(ExitStatus::EndOfInput));
                        }
                        Some(ReaderEvent::Error(e)) => return Err(PromptError::Terminal(e)),
                        None => return Err(PromptError::TaskEnded("reader")),
                    }
                }

                maybe_ack = self.ack_rx.recv() => {
                    if let Some(id) = maybe_ack {
                        self.pending_acks.push(id);
                        // A sync request with no accompanying user bytes
                        // produces an ack with no other trigger to flush
                        // it; render unconditionally so the ack is never
                        // left sitting until an unrelated event arrives.
                        self.render_frame()?;
                    }
                }

                maybe_signal = self.signal_rx.recv() => {
                    match maybe_signal {
                        Some(SignalEvent::Interrupt) => return Ok(LineOutcome::Exit(ExitStatus::Interrupted)),
                        // SIGQUIT has no dedicated exit status; treated as
                        // the forceful-shutdown case rather than the
                        // ordinary keyboard-interrupt one.
                        Some(SignalEvent::Terminate | SignalEvent::Quit) => {
                            return Ok(LineOutcome::Exit(ExitStatus::Terminated));
                        }
                        Some(SignalEvent::WindowChange) => {
                            self.render_frame()?;
                        }
                        None => {}
                    }
                }

                maybe_line = recv_opt(&mut self.out_rx) => {
                    if let Some(bytes) = maybe_line {
                        self.break_line()?;
                        self.writer.write_all(&bytes)?;
                        self.writer.flush()?;
                        self.renderer.force_full_repaint();
                        self.render_frame()?;
                    }
                }

                () = ambiguous_prefix_timeout(&self.byte_carry) => {
                    // Nothing resolved the held-back prefix within the
                    // window; it isn't the start of a longer sequence after
                    // all, so decode it as-is (typically a bare Escape).
                    let decoded = decode_stream(&mut self.byte_carry, true);
                    if let Some(outcome) = self.handle_batch(decoded)? {
                        return Ok(outcome);
                    }
                    self.render_frame()?;
                }
            }
        }
    }

    fn handle_batch(&mut self, decoded: Vec<Decoded>) -> Result<Option<LineOutcome>, PromptError> {
        for d in decoded {
            if let Some(outcome) = self.handle_decoded(d)? {
                return Ok(Some(outcome));
            }
        }
        Ok(None)
    }

    fn handle_decoded(&mut self, decoded: Decoded) -> Result<Option<LineOutcome>, PromptError> {
        self.buffer.document.last_key = Some(decoded.key);
        match decoded.key {
            Key::NotDefined => {
                if decoded.bytes.len() == 1 {
                    if let Some(&(_, action)) = self
                        .ascii_bindings
                        .iter()
                        .find(|(byte, _)| *byte == decoded.bytes[0])
                    {
                        return self.dispatch_action(action);
                    }
                }
                if !decoded.bytes.is_empty() {
                    // A non-space control byte with no catalog entry and no
                    // key binding is swallowed rather than inserted.
                    if decoded.bytes.len() == 1
                        && decoded.bytes[0] < 0x20
                        && decoded.bytes[0] != b' '
                    {
                        return Ok(None);
                    }
                    if self.hidden_by_execute {
                        self.completion.show();
                        self.hidden_by_execute = false;
                    }
                    let text = String::from_utf8_lossy(&decoded.bytes).into_owned();
                    self.buffer.insert_text_move_cursor(&text, false);
                    self.refresh_completions();
                }
                Ok(None)
            }
            other => match self.key_bindings.resolve(other) {
                Some(action) => self.dispatch_action(action),
                None => Ok(None),
            },
        }
    }

    fn cols(&mut self) -> ColWidth {
        let prefix = (self.prefix_fn)();
        let prefix_width = display_width(&prefix)
            .0
            .min(self.renderer.cols().saturating_sub(1));
        ColWidth(self.renderer.cols().saturating_sub(prefix_width).max(1))
    }

    /// Paints a break-line and notifies the caller's `break_line_callback`,
    /// if any, with the document as it stood at the break. A panicking
    /// callback is recovered here and logged; the loop continues as if it
    /// had returned normally.
    fn break_line(&mut self) -> Result<(), PromptError> {
        self.renderer.break_line(&mut self.writer)?;
        if let Some(cb) = self.break_line_callback.as_mut() {
            let document = &self.buffer.document;
            if let Err(payload) =
                std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| cb(document)))
            {
                let err = PromptError::Panicked(crate::error::panic_message(&*payload));
                tracing::error!(%err, "break_line callback panicked; continuing");
            }
        }
        Ok(())
    }

    fn refresh_completions(&mut self) {
        let document = self.buffer.document.clone();
        self.completion.refresh(&document, self.completer.as_mut());
    }

    fn accept_selected_completion(&mut self) -> bool {
        let (selected, _) = self.completion.get_selected_suggestion();
        let Some(suggestion) = selected else {
            return false;
        };
        let (start, end) = self.completion.replacement_range();
        let text = suggestion.text.clone();
        self.buffer.replace_rune_range(start, end, &text);
        self.refresh_completions();
        if self.options.hide_completions_after_execute {
            self.completion.hide();
        }
        true
    }

    fn dispatch_action(&mut self, action: Action) -> Result<Option<LineOutcome>, PromptError> {
        match action {
            Action::SubmitLine => {
                if self.completion.completing() && self.accept_selected_completion() {
                    return Ok(None);
                }
                let text = self.buffer.document.text.clone();
                let (next_indent, execute) =
                    (self.execute_on_enter)(&text, self.options.indent_size);
                if !execute {
                    self.buffer.new_line(false);
                    let pad = " ".repeat(next_indent * self.options.indent_size);
                    if !pad.is_empty() {
                        self.buffer.insert_text_move_cursor(&pad, false);
                    }
                    self.refresh_completions();
                    return Ok(None);
                }
                if self
                    .exit_checker
                    .as_mut()
                    .is_some_and(|f| f(&text, false))
                {
                    return Ok(Some(LineOutcome::Exit(ExitStatus::EndOfInput)));
                }
                self.history.add(&text);
                self.break_line()?;
                if self.options.hide_completions_after_execute {
                    self.completion.hide();
                    self.hidden_by_execute = true;
                }
                Ok(Some(LineOutcome::Submitted(text)))
            }
            // A keyed Ctrl-C arrives as ordinary data (raw mode has ISIG
            // off): it resets the current line rather than exiting. A real
            // exit on interrupt only happens via an actual SIGINT, which
            // arrives through `signal_rx` instead (see `next_line`).
            Action::Interrupt => {
                self.buffer = EditBuffer::new();
                self.history.clear();
                self.completion.reset(self.completer.as_mut());
                self.break_line()?;
                if self.options.hide_completions_after_execute {
                    self.completion.hide();
                }
                Ok(None)
            }
            Action::Eof => {
                if self.buffer.document.text.is_empty() {
                    Ok(Some(LineOutcome::Exit(ExitStatus::EndOfInput)))
                } else {
                    self.buffer.delete(1);
                    self.refresh_completions();
                    Ok(None)
                }
            }
            Action::ClearScreen => {
                self.force_clear = true;
                Ok(None)
            }
            Action::ClearToStart => {
                let cursor = self.buffer.document.cursor_position.as_usize();
                self.buffer.delete_before_cursor_runes(cursor);
                self.refresh_completions();
                Ok(None)
            }
            Action::ClearLastWord => {
                let word_len = self
                    .buffer
                    .document
                    .word_before_cursor(self.completion.word_separator())
                    .chars()
                    .count();
                self.buffer.delete_before_cursor_runes(word_len);
                self.refresh_completions();
                Ok(None)
            }
            Action::MoveBeginningOfLine => {
                let (start, _) = self.current_line_rune_bounds();
                self.buffer.document.cursor_position = prompt_core::RuneIndex(start);
                Ok(None)
            }
            Action::MoveEndOfLine => {
                let (_, end) = self.current_line_rune_bounds();
                self.buffer.document.cursor_position = prompt_core::RuneIndex(end);
                Ok(None)
            }
            Action::CursorLeft => {
                self.buffer.cursor_left(1);
                Ok(None)
            }
            Action::CursorRight => {
                self.buffer.cursor_right(1);
                Ok(None)
            }
            Action::CursorUp => {
                if self.completion.completing() {
                    self.completion.previous();
                } else {
                    let cols = self.cols();
                    if !self.buffer.cursor_up(1, cols) {
                        let (new_buffer, changed) = self.history.older(&self.buffer);
                        if changed {
                            self.buffer = new_buffer;
                            self.refresh_completions();
                        }
                    }
                }
                Ok(None)
            }
            Action::CursorDown => {
                if self.options.completion_on_down_arrow && self.completion.completing() {
                    self.completion.next();
                } else {
                    let cols = self.cols();
                    if !self.buffer.cursor_down(1, cols) {
                        let (new_buffer, changed) = self.history.newer(&self.buffer);
                        if changed {
                            self.buffer = new_buffer;
                            self.refresh_completions();
                        }
                    }
                }
                Ok(None)
            }
            Action::DeleteBeforeCursor => {
                self.buffer.delete_before_cursor(1);
                self.refresh_completions();
                Ok(None)
            }
            Action::DeleteForward => {
                self.buffer.delete(1);
                self.refresh_completions();
                Ok(None)
            }
            Action::HistoryOlder => {
                let (new_buffer, changed) = self.history.older(&self.buffer);
                if changed {
                    self.buffer = new_buffer;
                    self.refresh_completions();
                }
                Ok(None)
            }
            Action::HistoryNewer => {
                let (new_buffer, changed) = self.history.newer(&self.buffer);
                if changed {
                    self.buffer = new_buffer;
                    self.refresh_completions();
                }
                Ok(None)
            }
            Action::CompletionNext => {
                self.completion.show();
                self.completion.next();
                Ok(None)
            }
            Action::CompletionPrevious => {
                self.completion.show();
                self.completion.previous();
                Ok(None)
            }
            Action::CompletionNextPage => {
                self.completion.show();
                self.completion.next_page();
                Ok(None)
            }
            Action::CompletionPreviousPage => {
                self.completion.show();
                self.completion.previous_page();
                Ok(None)
            }
            Action::NewLine => {
                self.buffer.new_line(true);
                self.refresh_completions();
                Ok(None)
            }
            Action::Custom(code) => {
                if let Some(cb) = self.custom_action.as_mut() {
                    let document = &self.buffer.document;
                    if let Err(payload) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                        cb(code, document)
                    })) {
                        let err = PromptError::Panicked(crate::error::panic_message(&*payload));
                        tracing::error!(%err, "custom action callback panicked; continuing");
                    }
                }
                Ok(None)
            }
        }
    }

    /// `[start, end)` rune bounds of the logical line the cursor is
    /// currently on.
    fn current_line_rune_bounds(&self) -> (usize, usize) {
        let target = self.buffer.document.cursor_line_index();
        let mut rune_pos = 0usize;
        for (i, line) in self.buffer.document.text.split('\n').enumerate() {
            let len = line.chars().count();
            if i == target {
                return (rune_pos, rune_pos + len);
            }
            rune_pos += len + 1;
        }
        (rune_pos, rune_pos)
    }

    fn render_frame(&mut self) -> Result<(), PromptError> {
        if self.force_clear {
            self.writer.erase_all()?;
            self.writer.move_to(0, 0)?;
            self.writer.flush()?;
            self.renderer.force_full_repaint();
            self.force_clear = false;
        }

        let (cols, rows) = (self.window_size_fn)();
        let prefix = (self.prefix_fn)();
        self.renderer.render(
            &mut self.writer,
            cols,
            rows,
            &prefix,
            &mut self.buffer,
            &mut self.completion,
            self.lexer.as_mut(),
            &self.options.palette,
        )?;

        if self.options.sync_protocol_enabled && !self.pending_acks.is_empty() {
            for id in self.pending_acks.drain(..) {
                self.writer.write_all(&encode_ack(&id))?;
            }
            self.writer.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::Suggestion;
    use crate::document::Document;
    use crate::lexer::PassthroughLexer;

    struct NoopCompleter;
    impl Completer for NoopCompleter {
        fn complete(&mut self, _document: &Document) -> (Vec<Suggestion>, (usize, usize)) {
            (Vec::new(), (0, 0))
        }
    }

    fn test_loop() -> EventLoop<Vec<u8>> {
        let (_reader_tx, reader_rx) = mpsc::channel(16);
        let (_ack_tx, ack_rx) = mpsc::unbounded_channel();
        let (_signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (_stop_tx, stop_rx) = mpsc::channel(1);
        EventLoop::new(
            "> ".to_string(),
            Options::new(),
            LowLevelWriter::new(Vec::new()),
            Arc::new(|| (80, 24)),
            Box::new(NoopCompleter),
            Box::new(PassthroughLexer),
            reader_rx,
            ack_rx,
            signal_rx,
            stop_rx,
        )
    }

    #[test]
    fn current_line_rune_bounds_finds_middle_line() {
        let mut ev = test_loop();
        ev.buffer = EditBuffer::with_text("first\nsecond\nthird".to_string());
        ev.buffer.document.cursor_position = prompt_core::RuneIndex(8);
        assert_eq!(ev.current_line_rune_bounds(), (6, 12));
    }

    #[test]
    fn eof_on_empty_buffer_is_a_no_op_action_result() {
        let mut ev = test_loop();
        let outcome = ev.dispatch_action(Action::Eof).unwrap();
        assert_eq!(outcome, Some(LineOutcome::Exit(ExitStatus::EndOfInput)));
    }

    #[test]
    fn eof_on_nonempty_buffer_deletes_forward_instead_of_exiting() {
        let mut ev = test_loop();
        ev.buffer = EditBuffer::with_text("abc".to_string());
        ev.buffer.document.cursor_position = prompt_core::RuneIndex(0);
        let outcome = ev.dispatch_action(Action::Eof).unwrap();
        assert_eq!(outcome, None);
        assert_eq!(ev.buffer.document.text, "bc");
    }

    #[test]
    fn submit_line_produces_submitted_outcome_and_records_history() {
        let mut ev = test_loop();
        ev.buffer = EditBuffer::with_text("hello".to_string());
        let outcome = ev.dispatch_action(Action::SubmitLine).unwrap();
        assert_eq!(outcome, Some(LineOutcome::Submitted("hello".to_string())));
        assert_eq!(ev.history_entries(), &["hello".to_string()]);
    }

    #[test]
    fn accepted_completion_absorbs_enter_instead_of_submitting() {
        struct OneCompleter;
        impl Completer for OneCompleter {
            fn complete(&mut self, _document: &Document) -> (Vec<Suggestion>, (usize, usize)) {
                (vec![Suggestion::new("hello".to_string(), String::new())], (0, 2))
            }
        }
        let (_reader_tx, reader_rx) = mpsc::channel(16);
        let (_ack_tx, ack_rx) = mpsc::unbounded_channel();
        let (_signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (_stop_tx, stop_rx) = mpsc::channel(1);
        let mut ev = EventLoop::new(
            "> ".to_string(),
            Options::new(),
            LowLevelWriter::new(Vec::new()),
            Arc::new(|| (80, 24)),
            Box::new(OneCompleter),
            Box::new(PassthroughLexer),
            reader_rx,
            ack_rx,
            signal_rx,
            stop_rx,
        );
        ev.buffer = EditBuffer::with_text("he".to_string());
        ev.refresh_completions();
        ev.completion.next();
        let outcome = ev.dispatch_action(Action::SubmitLine).unwrap();
        assert_eq!(outcome, None);
        assert_eq!(ev.buffer.document.text, "hello");
        assert!(ev.history_entries().is_empty());
    }

    #[test]
    fn clear_screen_defers_the_erase_to_the_next_render() {
        let mut ev = test_loop();
        let outcome = ev.dispatch_action(Action::ClearScreen).unwrap();
        assert_eq!(outcome, None);
        assert!(ev.force_clear);
    }

    #[test]
    fn keyed_interrupt_resets_the_line_instead_of_exiting() {
        let mut ev = test_loop();
        ev.buffer = EditBuffer::with_text("unfinished".to_string());
        ev.history.add("earlier");
        let outcome = ev.dispatch_action(Action::Interrupt).unwrap();
        assert_eq!(outcome, None);
        assert_eq!(ev.buffer.document.text, "");
        assert_eq!(ev.history_entries(), &["earlier".to_string()]);
    }

    #[test]
    fn execute_on_enter_false_inserts_continuation_instead_of_submitting() {
        let (_reader_tx, reader_rx) = mpsc::channel(16);
        let (_ack_tx, ack_rx) = mpsc::unbounded_channel();
        let (_signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (_stop_tx, stop_rx) = mpsc::channel(1);
        let mut ev = EventLoop::new(
            "> ".to_string(),
            Options::new(),
            LowLevelWriter::new(Vec::new()),
            Arc::new(|| (80, 24)),
            Box::new(NoopCompleter),
            Box::new(PassthroughLexer),
            reader_rx,
            ack_rx,
            signal_rx,
            stop_rx,
        )
        .with_execute_on_enter(Box::new(|text, _indent_size| {
            (1, text.ends_with('\\'))
        }));
        ev.buffer = EditBuffer::with_text("line1\\".to_string());
        let outcome = ev.dispatch_action(Action::SubmitLine).unwrap();
        assert_eq!(outcome, None);
        assert!(ev.buffer.document.text.starts_with("line1\\\n"));
        assert!(ev.history_entries().is_empty());
    }

    #[test]
    fn exit_checker_true_exits_before_running_the_executor() {
        let (_reader_tx, reader_rx) = mpsc::channel(16);
        let (_ack_tx, ack_rx) = mpsc::unbounded_channel();
        let (_signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (_stop_tx, stop_rx) = mpsc::channel(1);
        let mut ev = EventLoop::new(
            "> ".to_string(),
            Options::new(),
            LowLevelWriter::new(Vec::new()),
            Arc::new(|| (80, 24)),
            Box::new(NoopCompleter),
            Box::new(PassthroughLexer),
            reader_rx,
            ack_rx,
            signal_rx,
            stop_rx,
        )
        .with_exit_checker(Box::new(|text, _break_line| text == "quit"));
        ev.buffer = EditBuffer::with_text("quit".to_string());
        let outcome = ev.dispatch_action(Action::SubmitLine).unwrap();
        assert_eq!(outcome, Some(LineOutcome::Exit(ExitStatus::EndOfInput)));
        assert!(ev.history_entries().is_empty());
    }
}
