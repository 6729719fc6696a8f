//! Logging initialization.
//!
//! Structured logging via `tracing` with human-readable and JSON output.
//! The `CTF_LOG` environment variable overrides the configured level.

use std::io::IsTerminal;

use ctf_core::config::GeneralConfig;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "CTF_LOG";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable format, coloured when stderr is a terminal.
    #[default]
    Human,
    /// Newline-delimited JSON for log shippers.
    Json,
}

impl LogFormat {
    /// Format selected by the `[general]` config section.
    #[must_use]
    pub fn from_config(general: &GeneralConfig) -> Self {
        if general.log_json { Self::Json } else { Self::Human }
    }
}

/// Initializes the global tracing subscriber.
///
/// If `CTF_LOG` is set it takes precedence over `general.log_level`.
/// Uses `try_init()` so calling this more than once (e.g. in tests) is safe.
pub fn init_logging(general: &GeneralConfig) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(&general.log_level));

    match LogFormat::from_config(general) {
        LogFormat::Human => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(std::io::stderr().is_terminal())
                .with_writer(std::io::stderr)
                .try_init();
        }
        LogFormat::Json => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}
