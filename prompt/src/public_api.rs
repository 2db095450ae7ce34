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

//! The `Prompt` entry point: wires the background reader and signal tasks
//! to an [`EventLoop`], drives it to completion, and runs the caller's
//! `executor` in cooked mode between submitted lines.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::completion::{Completer, Suggestion};
use crate::config::Options;
use crate::document::Document;
use crate::error::{ExitStatus, PromptError};
use crate::event_loop::{
    BreakLineFn, CustomActionFn, EventLoop, ExecuteOnEnterFn, ExitCheckerFn, LineOutcome, PrefixFn,
    WindowSizeFn,
};
use crate::lexer::{Lexer, PassthroughLexer};
use crate::reader::{self, CrosstermReader, Reader};
use crate::signal;
use prompt_core::LowLevelWriter;

/// A side-effecting callback invoked with the submitted line, terminal in
/// cooked mode for the duration of the call.
pub type ExecutorFn = Box<dyn FnMut(&str) + Send>;

/// A completer that never suggests anything; the default until a caller
/// supplies one.
struct NoopCompleter;
impl Completer for NoopCompleter {
    fn complete(&mut self, _document: &Document) -> (Vec<Suggestion>, (usize, usize)) {
        (Vec::new(), (0, 0))
    }
}

/// Seam for on-disk history persistence. The core only ever keeps history
/// in memory; a host program that wants it to survive a restart implements
/// this and hands it to [`Prompt::with_history_sink`].
pub trait HistorySink: Send {
    /// Loads previously-persisted entries, oldest first, to seed the
    /// session's history.
    fn load(&mut self) -> Vec<String> {
        Vec::new()
    }
    /// Called once per non-empty submission.
    fn append(&mut self, _line: &str) {}
}

/// Does not persist anything; the default until a caller supplies a sink.
pub struct NoopHistorySink;
impl HistorySink for NoopHistorySink {}

/// Guards the raw-mode scope for one session. Its `Drop` unconditionally
/// disables raw mode, so regardless of how `run_inner` exits — normal
/// return, a propagated `PromptError`, or an unwinding panic from anywhere
/// in the call stack — the terminal is restored to cooked mode before
/// control returns to the host. This is the backstop; the expected path
/// (callback panics recovered via `catch_unwind`, clean shutdown) never
/// needs it to fire.
struct RawModeGuard;

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = crossterm::terminal::disable_raw_mode();
    }
}

/// Cloneable handle that lets a host program print lines above the input
/// while a session is running, without going through `executor`. Writes
/// are buffered locally and only handed to the loop once they end in a
/// newline, mirroring a line-buffered terminal.
pub struct SharedWriter {
    buffer: Vec<u8>,
    line_tx: mpsc::Sender<Vec<u8>>,
}

impl Clone for SharedWriter {
    fn clone(&self) -> Self {
        Self {
            buffer: Vec::new(),
            line_tx: self.line_tx.clone(),
        }
    }
}

impl Write for SharedWriter {
    fn write(&mut self, payload: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(payload);
        if self.buffer.ends_with(b"\n") {
            let line = std::mem::take(&mut self.buffer);
            self.line_tx
                .try_send(line)
                .map_err(|_| io::Error::new(io::ErrorKind::Other, "prompt session has ended"))?;
        }
        Ok(payload.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedWriter {
    /// Prints `content` as-is, terminated with a newline. Safe to call from
    /// any task holding a clone, concurrently with a running session.
    pub fn println(&mut self, content: impl std::fmt::Display) {
        let _ = writeln!(self, "{content}");
    }

    /// Prints `content` prefixed with `" > "`, the way a host program might
    /// distinguish its own background output from command results.
    pub fn println_prefixed(&mut self, content: impl std::fmt::Display) {
        let _ = writeln!(self, " > {content}");
    }
}

/// Builds and drives one prompt session. Configure with the `with_*`
/// methods, then call [`Prompt::run`].
pub struct Prompt {
    prompt_prefix: String,
    options: Options,
    completer: Box<dyn Completer + Send>,
    lexer: Box<dyn Lexer + Send>,
    executor: Option<ExecutorFn>,
    exit_checker: Option<ExitCheckerFn>,
    execute_on_enter: Option<ExecuteOnEnterFn>,
    prefix_fn: Option<PrefixFn>,
    break_line_callback: Option<BreakLineFn>,
    custom_action: Option<CustomActionFn>,
    history_sink: Box<dyn HistorySink>,
    reader_factory: Box<dyn FnMut() -> Box<dyn Reader> + Send>,
    out_tx: Option<mpsc::Sender<Vec<u8>>>,
    running: Arc<AtomicBool>,
    /// The universal cancellation mechanism: set for the duration of a
    /// session so [`Self::close`] can reach the running event loop from any
    /// task, including one that never had `&mut self`.
    stop_tx: Arc<Mutex<Option<mpsc::Sender<()>>>>,
}

impl Prompt {
    #[must_use]
    pub fn new(prompt_prefix: impl Into<String>) -> Self {
        Self {
            prompt_prefix: prompt_prefix.into(),
            options: Options::new(),
            completer: Box::new(NoopCompleter),
            lexer: Box::new(PassthroughLexer),
            executor: None,
            exit_checker: None,
            execute_on_enter: None,
            prefix_fn: None,
            break_line_callback: None,
            custom_action: None,
            history_sink: Box::new(NoopHistorySink),
            reader_factory: Box::new(|| Box::new(CrosstermReader::new()) as Box<dyn Reader>),
            out_tx: None,
            running: Arc::new(AtomicBool::new(false)),
            stop_tx: Arc::new(Mutex::new(None)),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_completer(mut self, completer: impl Completer + Send + 'static) -> Self {
        self.completer = Box::new(completer);
        self
    }

    #[must_use]
    pub fn with_lexer(mut self, lexer: impl Lexer + Send + 'static) -> Self {
        self.lexer = Box::new(lexer);
        self
    }

    #[must_use]
    pub fn with_executor(mut self, executor: impl FnMut(&str) + Send + 'static) -> Self {
        self.executor = Some(Box::new(executor));
        self
    }

    #[must_use]
    pub fn with_exit_checker(mut self, f: impl FnMut(&str, bool) -> bool + Send + 'static) -> Self {
        self.exit_checker = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn with_execute_on_enter(
        mut self,
        f: impl FnMut(&str, usize) -> (usize, bool) + Send + 'static,
    ) -> Self {
        self.execute_on_enter = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn with_prefix_fn(mut self, f: impl FnMut() -> String + Send + 'static) -> Self {
        self.prefix_fn = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn with_break_line_callback(mut self, f: impl FnMut(&Document) + Send + 'static) -> Self {
        self.break_line_callback = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn with_custom_action(mut self, f: impl FnMut(u8, &Document) + Send + 'static) -> Self {
        self.custom_action = Some(Box::new(f));
        self
    }

    /// Layers extra key bindings on top of the configured `key_bind_mode`'s
    /// preset, replacing any existing binding on conflict.
    #[must_use]
    pub fn with_key_bindings(mut self, bindings: Vec<(crate::key::Key, crate::keybind::Action)>) -> Self {
        self.options.key_bindings.extend(bindings);
        self
    }

    /// Registers an ASCII-code binding for a raw byte with no catalog entry.
    #[must_use]
    pub fn with_ascii_binding(mut self, byte: u8, action: crate::keybind::Action) -> Self {
        self.options.ascii_bindings.push((byte, action));
        self
    }

    #[must_use]
    pub fn with_history_sink(mut self, sink: impl HistorySink + 'static) -> Self {
        self.history_sink = Box::new(sink);
        self
    }

    /// Swaps the terminal reader factory; used by tests to drive a session
    /// off a scripted source instead of real stdin.
    #[must_use]
    pub fn with_reader_factory(
        mut self,
        factory: impl FnMut() -> Box<dyn Reader> + Send + 'static,
    ) -> Self {
        self.reader_factory = Box::new(factory);
        self
    }

    /// Requests that the running session stop, as soon as the event loop
    /// next polls its cancellation channel. Idempotent and safe to call from
    /// any task, including one that never held `&mut self` — a no-op if no
    /// session is currently running.
    pub fn close(&self) {
        if let Some(tx) = self.stop_tx.lock().unwrap().as_ref() {
            let _ = tx.try_send(());
        }
    }

    /// Alias for [`Self::close`].
    pub fn stop(&self) {
        self.close();
    }

    /// A cloneable [`SharedWriter`] for printing lines above the input
    /// concurrently with a running session. Only meaningful after the first
    /// call to [`Self::run`] has started (earlier clones silently drop
    /// anything written to them once the session ends).
    #[must_use]
    pub fn clone_shared_writer(&self) -> Option<SharedWriter> {
        self.out_tx.as_ref().map(|tx| SharedWriter {
            buffer: Vec::new(),
            line_tx: tx.clone(),
        })
    }

    /// Runs one interactive session: reads and echoes lines, invoking
    /// `executor` (if any) in cooked mode on each submission, until the
    /// session exits.
    ///
    /// Returns [`PromptError::AlreadyRunning`] if called while another call
    /// to `run` on this `Prompt` is already in flight. A single call
    /// consumes the configured completer and lexer; calling `run` again
    /// afterwards starts a fresh session with no-op replacements for both.
    pub async fn run(&mut self) -> Result<ExitStatus, PromptError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(PromptError::AlreadyRunning);
        }
        let result = self.run_inner().await;
        self.running.store(false, Ordering::SeqCst);
        result
    }

    async fn run_inner(&mut self) -> Result<ExitStatus, PromptError> {
        let seeded = self.history_sink.load();
        if !seeded.is_empty() {
            self.options.history_seed = seeded;
        }

        let (reader_tx, reader_rx) = mpsc::channel(self.options.input_buffer_channel_size);
        let (ack_tx, ack_rx) = mpsc::unbounded_channel();
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::channel(256);
        let (stop_tx, stop_rx) = mpsc::channel(1);
        self.out_tx = Some(out_tx);
        *self.stop_tx.lock().unwrap() = Some(stop_tx);

        let reader = (self.reader_factory)();
        let window_size_fn: WindowSizeFn = {
            // Queried fresh on every `SIGWINCH`/render tick rather than
            // captured once, since the terminal can be resized mid-session.
            Arc::new(|| crossterm::terminal::size().unwrap_or((80, 25)))
        };
        let reader_task = reader::spawn(reader, self.options.indent_size, Vec::new(), reader_tx, ack_tx);
        let signal_task = signal::spawn(signal_tx);
        // Backstops the whole session: if anything downstream unwinds past
        // the `catch_unwind` boundaries around individual callbacks, cooked
        // mode is still restored before this function returns.
        let _raw_mode_guard = RawModeGuard;

        let writer = LowLevelWriter::new(io::stdout());
        let completer = std::mem::replace(&mut self.completer, Box::new(NoopCompleter));
        let lexer = std::mem::replace(&mut self.lexer, Box::new(PassthroughLexer));

        let mut event_loop = EventLoop::new(
            self.prompt_prefix.clone(),
            self.options.clone(),
            writer,
            window_size_fn,
            completer,
            lexer,
            reader_rx,
            ack_rx,
            signal_rx,
            stop_rx,
        )
        .with_out_rx(out_rx);
        if let Some(f) = self.prefix_fn.take() {
            event_loop = event_loop.with_prefix_fn(f);
        }
        if let Some(f) = self.execute_on_enter.take() {
            event_loop = event_loop.with_execute_on_enter(f);
        }
        if let Some(f) = self.exit_checker.take() {
            event_loop = event_loop.with_exit_checker(f);
        }
        if let Some(f) = self.break_line_callback.take() {
            event_loop = event_loop.with_break_line_callback(f);
        }
        if let Some(f) = self.custom_action.take() {
            event_loop = event_loop.with_custom_action(f);
        }

        let status = loop {
            match event_loop.next_line().await {
                Ok(LineOutcome::Submitted(text)) => {
                    self.history_sink.append(&text);
                    if let Some(executor) = self.executor.as_mut() {
                        // Cooked mode for the duration of the call: the
                        // executor may itself print, prompt, or otherwise
                        // expect a normal line-buffered terminal. A
                        // panicking executor is recovered here rather than
                        // left to unwind past the raw-mode toggle, so the
                        // session repaints with a fresh buffer instead of
                        // dying.
                        let _ = crossterm::terminal::disable_raw_mode();
                        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                            executor(&text);
                        }));
                        let _ = crossterm::terminal::enable_raw_mode();
                        if let Err(payload) = result {
                            let err = PromptError::Panicked(crate::error::panic_message(&*payload));
                            tracing::error!(%err, "executor panicked; continuing with a fresh buffer");
                        }
                    }
                    event_loop.mark_needs_full_repaint();
                    if event_loop.exit_after_executor(&text) {
                        break Ok(ExitStatus::EndOfInput);
                    }
                }
                Ok(LineOutcome::Exit(exit)) => break Ok(exit),
                Err(e) => break Err(e),
            }
        };

        reader_task.abort();
        signal_task.abort();
        *self.stop_tx.lock().unwrap() = None;
        self.out_tx = None;
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_writer_buffers_until_newline() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut writer = SharedWriter {
            buffer: Vec::new(),
            line_tx: tx,
        };
        writer.write_all(b"partial").unwrap();
        assert!(rx.try_recv().is_err());
        writer.write_all(b" line\n").unwrap();
        assert_eq!(rx.try_recv().unwrap(), b"partial line\n".to_vec());
    }

    #[test]
    fn clone_shared_writer_is_none_before_run() {
        let prompt = Prompt::new("> ");
        assert!(prompt.clone_shared_writer().is_none());
    }

    #[test]
    fn println_prefixed_sends_one_complete_line() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut writer = SharedWriter {
            buffer: Vec::new(),
            line_tx: tx,
        };
        writer.println_prefixed("task done");
        assert_eq!(rx.try_recv().unwrap(), b" > task done\n".to_vec());
    }
}
