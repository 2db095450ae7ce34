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

//! The background signal watcher: OS-level interrupt/terminate/quit/resize
//! notifications, independent of whatever bytes the reader task is decoding.
//! A Ctrl-C keystroke is ordinary input data in raw mode (the terminal's
//! `ISIG` processing is off, so it never reaches us as `SIGINT`); this task
//! only fires for signals raised from outside the process.

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignalEvent {
    /// `SIGINT` delivered to the process from outside (e.g. another shell
    /// sending `kill -INT`), not a Ctrl-C keystroke.
    Interrupt,
    /// `SIGTERM`: the process is being asked to shut down.
    Terminate,
    /// `SIGQUIT`.
    Quit,
    /// `SIGWINCH`: the terminal window was resized. Carries no size; the
    /// event loop re-queries `Reader::window_size` on receipt.
    WindowChange,
}

#[cfg(unix)]
pub fn spawn(tx: UnboundedSender<SignalEvent>) -> JoinHandle<()> {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut terminate = signal(SignalKind::terminate()).ok();
        let mut quit = signal(SignalKind::quit()).ok();
        let mut window_change = signal(SignalKind::window_change()).ok();

        loop {
            tokio::select! {
                biased;

                _ = tokio::signal::ctrl_c() => {
                    if tx.send(SignalEvent::Interrupt).is_err() {
                        break;
                    }
                }
                _ = recv_opt(&mut terminate) => {
                    if tx.send(SignalEvent::Terminate).is_err() {
                        break;
                    }
                }
                _ = recv_opt(&mut quit) => {
                    if tx.send(SignalEvent::Quit).is_err() {
                        break;
                    }
                }
                _ = recv_opt(&mut window_change) => {
                    if tx.send(SignalEvent::WindowChange).is_err() {
                        break;
                    }
                }
            }
        }
    })
}

#[cfg(unix)]
async fn recv_opt(sig: &mut Option<tokio::signal::unix::Signal>) {
    match sig {
        Some(s) => {
            s.recv().await;
        }
        None => std::future::pending().await,
    }
}

/// Windows has no `SIGTERM`/`SIGQUIT`/`SIGWINCH` equivalents reachable this
/// way; only the Ctrl-C interrupt is wired up, and window-resize detection
/// falls back to the event loop's own polling of `Reader::window_size`.
#[cfg(not(unix))]
pub fn spawn(tx: UnboundedSender<SignalEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if tokio::signal::ctrl_c().await.is_err() {
                break;
            }
            if tx.send(SignalEvent::Interrupt).is_err() {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_events_are_distinct() {
        assert_ne!(SignalEvent::Interrupt, SignalEvent::Terminate);
        assert_ne!(SignalEvent::Quit, SignalEvent::WindowChange);
    }
}
