//! Command-line interface for `kdactl`.
//!
//! Command definitions live in `commands`; rendering of plans, reports and
//! snapshots in `output`.

mod commands;
mod output;

pub use commands::{Cli, Commands, LogFormat, OutputFormat, StateCommands};
pub use output::OutputFormatter;
