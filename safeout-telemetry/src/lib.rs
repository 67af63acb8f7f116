//! Logging setup for processes hosting the mediator.
//!
//! Libraries in this workspace only emit `tracing` events; the binary that
//! embeds them calls [`init`] once to print those events.

#![warn(missing_docs, clippy::pedantic)]

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

/// Output options for the subscriber.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    default_filter: String,
    with_target: bool,
    compact: bool,
    ansi: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            default_filter: DEFAULT_FILTER.to_owned(),
            with_target: false,
            compact: false,
            ansi: true,
        }
    }
}

impl TelemetryConfig {
    /// Sets the directive applied when `RUST_LOG` is absent.
    #[must_use]
    pub fn with_default_filter(mut self, filter: impl Into<String>) -> Self {
        self.default_filter = filter.into();
        self
    }

    /// Prints the module path of each event.
    #[must_use]
    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    /// Uses the single-line compact format.
    #[must_use]
    pub fn compact(mut self, enabled: bool) -> Self {
        self.compact = enabled;
        self
    }

    /// Enables terminal colors. Disable when writing to a workflow log file.
    #[must_use]
    pub fn with_ansi(mut self, enabled: bool) -> Self {
        self.ansi = enabled;
        self
    }

    /// Builds the filter, preferring `RUST_LOG` over the default directive.
    ///
    /// # Errors
    ///
    /// Fails when the default directive does not parse.
    pub fn env_filter(&self) -> Result<EnvFilter> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.default_filter)
                .with_context(|| format!("invalid log filter `{}`", self.default_filter)),
        }
    }
}

/// Installs the global subscriber with default options.
///
/// # Errors
///
/// Fails when a global subscriber is already installed.
pub fn init() -> Result<()> {
    init_with(&TelemetryConfig::default())
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Fails when the filter does not parse or a global subscriber is already
/// installed.
pub fn init_with(config: &TelemetryConfig) -> Result<()> {
    let filter = config.env_filter()?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target)
        .with_level(true)
        .with_ansi(config.ansi);

    let installed = if config.compact {
        builder.compact().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_parses() {
        assert!(TelemetryConfig::default().env_filter().is_ok());
    }

    #[test]
    fn invalid_default_filter_is_reported() {
        let config = TelemetryConfig::default().with_default_filter("safeout=loud");
        if std::env::var_os("RUST_LOG").is_none() {
            let err = config.env_filter().unwrap_err();
            assert!(err.to_string().contains("invalid log filter"));
        }
    }

    #[test]
    fn second_install_fails() {
        let config = TelemetryConfig::default().compact(true).with_ansi(false);
        let _ = init_with(&config);
        assert!(init_with(&config).is_err());
    }
}
