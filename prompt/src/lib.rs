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

//! `prompt` is an interactive command-line prompt library: raw-mode line
//! editing with a live styled preview, a scrollable completion popup,
//! history recall, custom key bindings, and multi-line editing.
//!
//! # Why use this crate
//!
//! Reading a line with [`std::io::Stdin::read_line`] is blocking, and
//! there's no way to unblock it short of exiting the process. That makes
//! it awkward to pair a line editor with anything that also wants to own
//! the terminal — a background task printing progress, an OS signal that
//! should interrupt a read in flight, a completion popup that has to repaint
//! on every keystroke. This crate puts a cooperative event loop in front of
//! raw-mode input instead: the background [`reader`] task only ever hands
//! decoded bytes to the loop over a channel, so the loop can multiplex
//! reader bytes, a `SIGWINCH`/`SIGINT`/`SIGTERM` [`signal`] watcher, and a
//! caller-driven [`public_api::SharedWriter`] for concurrent output, all
//! without blocking on any one of them.
//!
//! # Getting started
//!
//! ```no_run
//! use prompt::Prompt;
//!
//! # async fn run() -> Result<(), prompt::PromptError> {
//! let mut prompt = Prompt::new("> ").with_executor(|line| {
//!     println!("you typed: {line}");
//! });
//! prompt.run().await?;
//! # Ok(())
//! # }
//! ```
//!
//! For a fuller example with history, completion, and syntax highlighting,
//! see `demos/simple_repl.rs`.

pub mod buffer;
pub mod completion;
pub mod config;
pub mod document;
pub mod error;
pub mod event_loop;
pub mod history;
pub mod key;
pub mod keybind;
pub mod lexer;
pub mod public_api;
pub mod reader;
pub mod render;
pub mod signal;
pub mod sync;
#[cfg(test)]
pub mod test_support;
pub mod tracing_setup;

/// Bounded channel capacity used between the background reader/signal tasks
/// and the event loop, and as [`config::Options::default`]'s
/// `input_buffer_channel_size`.
pub const CHANNEL_CAPACITY: usize = 1_000;

/// Default cap on retained history entries, used by
/// [`config::Options::default`]'s `history_max_size`.
pub const HISTORY_SIZE_MAX: usize = 1_000;

pub use completion::{format_suggestions, Completer, CompletionManager, Suggestion};
pub use config::{ColorPair, Options, Palette};
pub use document::Document;
pub use error::{ExitStatus, PromptError};
pub use event_loop::{BreakLineFn, EventLoop, ExecuteOnEnterFn, ExitCheckerFn, LineOutcome, PrefixFn, WindowSizeFn};
pub use history::History;
pub use key::{decode, decode_all, decode_stream, Decoded, Key};
pub use keybind::{Action, KeyBindMode, KeyBindings};
pub use lexer::{LexToken, Lexer, PassthroughLexer, TokenStyle};
pub use public_api::{ExecutorFn, HistorySink, NoopHistorySink, Prompt, SharedWriter};
pub use reader::{CrosstermReader, Reader, ReaderEvent};

pub use prompt_core::{display_width, LowLevelWriter, Rgb};
