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

//! Errors returned from [`crate::public_api::Prompt`]. Transient read
//! errors, panicking callbacks, and malformed sync requests are all
//! recovered internally and never reach this type; only the fatal and
//! programming-error categories from the error-handling design surface
//! here.

use std::io;
use thiserror::Error;

/// Error returned from a prompt session. These generally require the caller
/// to stop driving the session rather than retry.
#[derive(Debug, Error)]
pub enum PromptError {
    /// Raw-mode entry/exit or a window-size query failed.
    #[error("terminal I/O error: {0}")]
    Terminal(#[source] io::Error),

    /// `run()` was called while a session was already active on this
    /// `Prompt`.
    #[error("a session is already running on this prompt")]
    AlreadyRunning,

    /// A caller tried to cancel a key binding that was never registered.
    #[error("no key binding registered for {0:?}")]
    UnknownKeyBinding(String),

    /// A background task (reader or signal watcher) disconnected without a
    /// graceful shutdown.
    #[error("background task {0} ended unexpectedly")]
    TaskEnded(&'static str),

    /// A caller-supplied callback (completer, executor, lexer, key binding,
    /// or break-line callback) panicked. Recovered via `catch_unwind` at the
    /// call site; carries the panic payload's message when it was a `&str`
    /// or `String`, so a host program can log what broke without itself
    /// depending on `std::panic`.
    #[error("a callback panicked: {0}")]
    Panicked(String),

    /// An internal I/O error not covered by [`Self::Terminal`], e.g. a
    /// failed write to the underlying file descriptor.
    #[error(transparent)]
    IO(#[from] io::Error),
}

/// Extracts a human-readable message from a `catch_unwind` payload, falling
/// back to a generic description when the panic didn't carry a `&str` or
/// `String` (e.g. `panic!("{}", some_struct)` with a custom payload type).
#[must_use]
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "callback panicked with a non-string payload".to_string()
    }
}

/// Terminal exit status, distinct from process exit codes: the caller
/// decides whether and how to map this onto one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Normal end-of-input (Ctrl-D on an empty buffer).
    EndOfInput,
    /// The user pressed the interrupt or quit key (e.g. Ctrl-C).
    Interrupted,
    /// The user pressed the terminate key.
    Terminated,
}

impl ExitStatus {
    /// The signed exit code a host program maps onto its process exit code:
    /// `-1` end-of-input, `0` interrupt/quit, `1` terminate.
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::EndOfInput => -1,
            ExitStatus::Interrupted => 0,
            ExitStatus::Terminated => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_status_codes_are_signed_as_documented() {
        assert_eq!(ExitStatus::EndOfInput.code(), -1);
        assert_eq!(ExitStatus::Interrupted.code(), 0);
        assert_eq!(ExitStatus::Terminated.code(), 1);
    }

    #[test]
    fn panic_message_extracts_str_and_string_payloads() {
        let result = std::panic::catch_unwind(|| panic!("boom"));
        let payload = result.unwrap_err();
        assert_eq!(panic_message(&*payload), "boom");

        let result = std::panic::catch_unwind(|| panic!("{}", "owned".to_string()));
        let payload = result.unwrap_err();
        assert_eq!(panic_message(&*payload), "owned");
    }

    #[test]
    fn panic_message_falls_back_for_non_string_payloads() {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            std::panic::panic_any(42i32)
        }));
        let payload = result.unwrap_err();
        assert_eq!(panic_message(&*payload), "callback panicked with a non-string payload");
    }
}
