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

//! Tracing setup for a prompt session. The event loop, reader, and signal
//! tasks emit `tracing` spans/events at `debug` and below; nothing here
//! writes to the terminal the session itself is drawing into.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Where diagnostic output goes. Never `Stdout` for an interactive session —
/// that would interleave with the rendered frame — but convenient for the
/// demo binaries and for tests that redirect to a file.
#[derive(Clone, Debug)]
pub enum LogDestination {
    Stderr,
    File(std::path::PathBuf),
    Disabled,
}

#[derive(Clone, Debug)]
pub struct TracingConfig {
    pub destination: LogDestination,
    /// `RUST_LOG`-style directive, e.g. `"prompt=debug"`. Falls back to
    /// `"warn"` if unset and `RUST_LOG` is also unset.
    pub filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            destination: LogDestination::Disabled,
            filter: None,
        }
    }
}

/// Installs a global `tracing` subscriber per `config`. Returns an error if
/// a subscriber was already installed, or if the configured log file
/// couldn't be opened.
pub fn init(config: TracingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = match config.filter {
        Some(directive) => EnvFilter::try_new(directive)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    match config.destination {
        LogDestination::Disabled => {
            tracing_subscriber::registry().with(env_filter).try_init()?;
        }
        LogDestination::Stderr => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .try_init()?;
        }
        LogDestination::File(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::sync::Mutex::new(file)).with_ansi(false))
                .try_init()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_destination_is_disabled() {
        assert!(matches!(
            TracingConfig::default().destination,
            LogDestination::Disabled
        ));
    }
}
