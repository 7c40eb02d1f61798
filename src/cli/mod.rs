//! Command-line interface
//!
//! Argument parsing and command handlers for the `phaseclock` binary.

pub mod args;
pub mod commands;
