//! Logging initialization for `phaseclock`.
//!
//! A single `tracing` subscriber on stderr, rendered for humans or as JSON.
//! The filter comes from `PHASECLOCK_LOG_LEVEL` when set, otherwise from the
//! `-v`/`-q` flags. Quiet mode keeps listener diagnostics.

use std::io::IsTerminal;

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

use crate::cli::args::{Cli, ColorChoice};
use crate::phase::DIAGNOSTIC_TARGET;

/// Environment variable overriding the flag-derived filter.
pub const LOG_LEVEL_ENV: &str = "PHASECLOCK_LOG_LEVEL";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Plain text, colored when stderr is a terminal.
    #[default]
    Human,
    /// One JSON object per line.
    Json,
}

/// Maps a `-v` count to a level directive; saturates at `trace`.
#[must_use]
pub const fn verbosity_to_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Subscriber settings resolved from the global CLI flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogOptions {
    /// Output rendering.
    pub format: LogFormat,
    /// Number of `-v` flags.
    pub verbosity: u8,
    /// `-q`: errors and listener diagnostics only.
    pub quiet: bool,
    /// ANSI color policy for human output.
    pub color: ColorChoice,
}

impl LogOptions {
    /// Reads the logging flags off a parsed command line.
    #[must_use]
    pub const fn from_cli(cli: &Cli) -> Self {
        Self {
            format: cli.log_format,
            verbosity: cli.verbose,
            quiet: cli.quiet,
            color: cli.color,
        }
    }

    /// Filter directive implied by the flags alone.
    #[must_use]
    pub fn directive(&self) -> String {
        if self.quiet {
            format!("error,{DIAGNOSTIC_TARGET}=warn")
        } else {
            verbosity_to_directive(self.verbosity).to_owned()
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_env(LOG_LEVEL_ENV).unwrap_or_else(|_| EnvFilter::new(self.directive()))
    }

    fn ansi(&self) -> bool {
        match self.color {
            ColorChoice::Auto => {
                std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
            }
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        }
    }
}

/// Installs the global subscriber.
///
/// A subscriber that is already installed wins; later calls are ignored.
pub fn init_logging(options: &LogOptions) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(options.filter())
        .with_target(options.verbosity >= 2)
        .with_writer(std::io::stderr);

    let installed = match options.format {
        LogFormat::Human => builder.with_ansi(options.ansi()).try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
