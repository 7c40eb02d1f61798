//! `validate` command handler
//!
//! Loads schedule files without running them and prints each timeline.

use std::path::Path;

use serde_json::json;

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::config::{ConfigLoader, LoadResult};
use crate::error::{ConfigError, PhaseClockError, ValidationIssue};
use crate::phase::PhaseWindow;

/// Validate schedule files.
///
/// Stops at the first file that fails.
///
/// # Errors
///
/// Returns a config error if a file is missing or invalid, or has warnings
/// under `--strict`; a schedule error if the phases are rejected.
pub fn run(args: &ValidateArgs, quiet: bool) -> Result<(), PhaseClockError> {
    let loader = ConfigLoader::with_defaults();

    for path in &args.files {
        tracing::info!(file = %path.display(), "validating schedule");
        let loaded = loader.load(path)?;

        for warning in &loaded.warnings {
            tracing::warn!(location = %warning.path, "{}", warning.message);
        }

        if args.strict && !loaded.warnings.is_empty() {
            return Err(ConfigError::ValidationError {
                path: path.display().to_string(),
                errors: loaded.warnings,
            }
            .into());
        }

        let timeline = loaded.config.build_scheduler()?.timeline();
        if !quiet {
            let report = match args.format {
                OutputFormat::Human => render_human(path, &loaded, &timeline)?,
                OutputFormat::Json => render_json(path, &loaded, &timeline)?,
            };
            println!("{report}");
        }

        tracing::info!(file = %path.display(), "schedule valid");
    }

    Ok(())
}

fn render_human(
    path: &Path,
    loaded: &LoadResult,
    timeline: &[PhaseWindow],
) -> Result<String, PhaseClockError> {
    let total = timeline.last().map_or(0.0, |w| w.end_seconds);
    let tick = loaded.config.tick_interval()?;
    let width = timeline.iter().map(|w| w.name.len()).max().unwrap_or(0);

    let mut out = format!(
        "{}: {} ({} phases, {total:.3}s, tick {})",
        path.display(),
        loaded.config.name,
        timeline.len(),
        humantime::format_duration(tick)
    );
    for window in timeline {
        out.push_str(&format!(
            "\n  {:>3}  {:<width$}  {:>10.3}s .. {:>10.3}s",
            window.index, window.name, window.start_seconds, window.end_seconds
        ));
    }
    for warning in &loaded.warnings {
        out.push_str(&format!("\n  {warning}"));
    }
    Ok(out)
}

fn render_json(
    path: &Path,
    loaded: &LoadResult,
    timeline: &[PhaseWindow],
) -> Result<String, PhaseClockError> {
    let tick = loaded.config.tick_interval()?;
    let phases: Vec<_> = timeline
        .iter()
        .map(|w| {
            json!({
                "index": w.index,
                "name": w.name,
                "start_seconds": w.start_seconds,
                "end_seconds": w.end_seconds,
            })
        })
        .collect();
    let warnings: Vec<_> = loaded.warnings.iter().map(issue_json).collect();

    Ok(serde_json::to_string(&json!({
        "file": path.display().to_string(),
        "name": loaded.config.name,
        "tick_ms": u64::try_from(tick.as_millis()).unwrap_or(u64::MAX),
        "total_seconds": timeline.last().map_or(0.0, |w| w.end_seconds),
        "phases": phases,
        "warnings": warnings,
    }))?)
}

fn issue_json(issue: &ValidationIssue) -> serde_json::Value {
    json!({ "path": issue.path, "message": issue.message })
}
