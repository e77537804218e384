//! Tracing subscriber setup for binaries and tools built on this crate
//!
//! The library itself only emits `tracing` events; installing a subscriber is
//! left to the host. [`setup_logging`] is a convenience for hosts that have no
//! opinion. Wire dumps of every SOAP request and response are logged at
//! `trace` under the `axl_core::transport` target.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::error::{AxlError, Result};

/// Subscriber settings
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Baseline level; `RUST_LOG` directives are applied on top
    pub level: LevelFilter,
    /// Emit JSON lines instead of human readable output
    pub json: bool,
    /// Include file and line information
    pub file_info: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: LevelFilter::INFO,
            json: false,
            file_info: false,
        }
    }
}

impl LoggingConfig {
    pub fn new(level: LevelFilter) -> Self {
        LoggingConfig {
            level,
            ..Default::default()
        }
    }

    /// Settings from a level name such as `debug` or `off`
    pub fn from_level_name(name: &str) -> Result<Self> {
        Ok(Self::new(parse_log_level(name)?))
    }

    pub fn with_json(mut self) -> Self {
        self.json = true;
        self
    }

    pub fn with_file_info(mut self) -> Self {
        self.file_info = true;
        self
    }
}

/// Install a global `fmt` subscriber
///
/// Fails with `AxlError::Config` if a global subscriber is already set.
pub fn setup_logging(config: LoggingConfig) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive(config.level.into());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(config.file_info)
        .with_line_number(config.file_info);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| AxlError::config(format!("failed to install subscriber: {}", e)))
}

/// Level filter from its name, case-insensitive; accepts `off`
pub fn parse_log_level(name: &str) -> Result<LevelFilter> {
    name.trim()
        .parse::<LevelFilter>()
        .map_err(|_| AxlError::config(format!("unknown log level {:?}", name)))
}
