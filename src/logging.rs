//! Diagnostics setup.
//!
//! Diagnostics go through `tracing`; this module installs the subscriber.
//! Output goes to stderr, or to a log file (without ANSI colours) when one
//! is given. The filter comes from `RUST_LOG`, falling back to
//! [`DEFAULT_LOG_FILTER`]; `--verbose` forces debug output for this crate.

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

pub const DEFAULT_LOG_FILTER: &str = "foldpdf=info";
pub const VERBOSE_LOG_FILTER: &str = "foldpdf=debug";

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Cannot open log file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Logging already initialised: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogConfig<'a> {
    pub verbose: bool,
    /// Write diagnostics here instead of stderr.
    pub log_file: Option<&'a Path>,
}

/// Filter directive for the given verbosity and `RUST_LOG` value.
pub fn filter_directive(verbose: bool, env: Option<&str>) -> String {
    match env {
        _ if verbose => VERBOSE_LOG_FILTER.to_string(),
        Some(directive) if !directive.trim().is_empty() => directive.to_string(),
        _ => DEFAULT_LOG_FILTER.to_string(),
    }
}

fn build_filter(verbose: bool) -> EnvFilter {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = filter_directive(verbose, env.as_deref());
    EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Install the global subscriber.
pub fn init_logging(config: LogConfig<'_>) -> Result<(), LoggingError> {
    let filter = build_filter(config.verbose);

    match config.log_file {
        Some(path) => {
            let file = File::create(path)?;
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(Mutex::new(file))
                        .with_ansi(false)
                        .with_target(false)
                        .with_filter(filter),
                )
                .try_init()?;
        }
        None => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(false)
                        .with_filter(filter),
                )
                .try_init()?;
        }
    }
    Ok(())
}
