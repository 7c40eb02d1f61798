//! Shared integration-test helpers for running the `phaseclock` binary.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};

/// Helpers for invoking the compiled binary.
pub struct PhaseClockProcess;

impl PhaseClockProcess {
    /// Runs the binary with `args` to completion and returns its output.
    #[allow(clippy::missing_panics_doc)]
    pub fn run(args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_phaseclock"))
            .args(args)
            .env_remove("PHASECLOCK_LOG_LEVEL")
            .env_remove("PHASECLOCK_CONFIG")
            .env("NO_COLOR", "1")
            .output()
            .expect("failed to run phaseclock binary")
    }

    /// Absolute path of a file under `tests/fixtures`.
    pub fn fixture_path(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    /// Fixture path as a string argument.
    pub fn fixture(name: &str) -> String {
        Self::fixture_path(name).display().to_string()
    }
}
