//! Log setup for strand.
//!
//! strand logs through [`tracing`]. This crate installs a subscriber that prints those events:
//!
//! ```rust, no_run
//! strand_logger::init(tracing::Level::DEBUG).expect("failed to init logger");
//! ```
//!
//! The `STRAND_LOG` environment variable overrides the level with a full [`EnvFilter`] directive, e.g.
//! `STRAND_LOG=strand_core=trace,info`.

use tracing::Level;
use tracing_subscriber::{filter::ParseError, prelude::*, registry::Registry, util::TryInitError, EnvFilter, Layer};

/// The environment variable read for filter directives.
pub const LOG_ENV: &str = "STRAND_LOG";

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] ParseError),

    #[error("a global logger is already installed: {0}")]
    Init(#[from] TryInitError),
}

/// Log events at `level` and above, unless `STRAND_LOG` says otherwise.
pub fn init(level: Level) -> Result<(), LoggerError> {
    LoggerBuilder::new().level(level).try_init()
}

/// Log what `STRAND_LOG` asks for, or `info` and above if it is unset.
pub fn init_from_env() -> Result<(), LoggerError> {
    LoggerBuilder::new().try_init()
}

/// Finer control over the subscriber, mostly for tests.
///
/// ```rust, no_run
/// strand_logger::LoggerBuilder::new()
///     .filter("strand_core=trace")
///     .without_time()
///     .for_tests()
///     .try_init()
///     .ok();
/// ```
#[derive(Clone, Debug)]
pub struct LoggerBuilder {
    filter: String,
    respect_env: bool,
    time: bool,
    target: bool,
    test_writer: bool,
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self {
            filter: Level::INFO.to_string().to_lowercase(),
            respect_env: true,
            time: true,
            target: true,
            test_writer: false,
        }
    }
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: Level) -> Self {
        self.filter = level.to_string().to_lowercase();
        self
    }

    /// Use a full filter directive instead of a single level.
    pub fn filter(mut self, directives: impl Into<String>) -> Self {
        self.filter = directives.into();
        self
    }

    /// Ignore `STRAND_LOG`.
    pub fn ignore_env(mut self) -> Self {
        self.respect_env = false;
        self
    }

    pub fn without_time(mut self) -> Self {
        self.time = false;
        self
    }

    pub fn with_target(mut self, target: bool) -> Self {
        self.target = target;
        self
    }

    /// Write through the test harness so output is captured per test.
    pub fn for_tests(mut self) -> Self {
        self.test_writer = true;
        self
    }

    fn env_filter(&self) -> Result<EnvFilter, ParseError> {
        match std::env::var(LOG_ENV) {
            Ok(directives) if self.respect_env => EnvFilter::try_new(directives),
            _ => EnvFilter::try_new(&self.filter),
        }
    }

    /// Install the subscriber globally.
    pub fn try_init(self) -> Result<(), LoggerError> {
        let filter = self.env_filter()?;

        let fmt_layer = tracing_subscriber::fmt::layer().with_target(self.target);
        let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match (self.time, self.test_writer) {
            (true, false) => fmt_layer.boxed(),
            (false, false) => fmt_layer.without_time().boxed(),
            (true, true) => fmt_layer.with_test_writer().boxed(),
            (false, true) => fmt_layer.without_time().with_test_writer().boxed(),
        };

        tracing_subscriber::registry()
            .with(fmt_layer.with_filter(filter))
            .try_init()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_become_directives() {
        let builder = LoggerBuilder::new().level(Level::DEBUG).ignore_env();
        assert_eq!(builder.filter, "debug");
        assert!(builder.env_filter().is_ok());
    }

    #[test]
    fn bad_directives_are_rejected() {
        let builder = LoggerBuilder::new().filter("strand_core=loud").ignore_env();
        assert!(builder.env_filter().is_err());
    }
}
