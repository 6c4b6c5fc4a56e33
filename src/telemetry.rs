use std::io::{self, IsTerminal};

use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

use crate::config::{AppEnvironment, TelemetryConfig};

/// How diagnostics are laid out on stderr. Command output itself goes to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStyle {
    /// Multi-line events with source locations, colored on a terminal.
    Pretty,
    /// One line per event with timestamps, never colored.
    Compact,
    /// One line per event without timestamps, so test output stays stable.
    Plain,
}

impl LogStyle {
    pub fn for_environment(environment: AppEnvironment) -> Self {
        match environment {
            AppEnvironment::Development => Self::Pretty,
            AppEnvironment::Production => Self::Compact,
            AppEnvironment::Test => Self::Plain,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("log filter '{directive}' is invalid")]
    InvalidFilter {
        directive: String,
        #[source]
        source: ParseError,
    },
    #[error("a diagnostics subscriber is already installed")]
    AlreadyInstalled(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Builds the event filter. `RUST_LOG` takes precedence over the configured level.
pub fn filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    parse_filter(&config.log_level)
}

fn parse_filter(directive: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(directive).map_err(|source| TelemetryError::InvalidFilter {
        directive: directive.to_string(),
        source,
    })
}

/// Installs the stderr subscriber in the style suited to `environment`.
pub fn init(environment: AppEnvironment, config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false);

    let installed = match LogStyle::for_environment(environment) {
        LogStyle::Pretty => builder
            .pretty()
            .with_ansi(io::stderr().is_terminal())
            .try_init(),
        LogStyle::Compact => builder.compact().with_ansi(false).try_init(),
        LogStyle::Plain => builder
            .compact()
            .without_time()
            .with_ansi(false)
            .try_init(),
    };

    installed.map_err(TelemetryError::AlreadyInstalled)
}
