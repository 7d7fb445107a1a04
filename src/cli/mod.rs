//! CLI module for docquery
//!
//! Provides command-line interface for:
//! - parse: Parse a captured response into an envelope
//! - inspect: Execute once and print one page
//! - console: Execute once and navigate with JSON commands on stdin

mod args;
mod commands;
mod config;
mod errors;
mod io;
mod session;

pub use args::{Cli, Command, QueryArgs};
pub use commands::{console, inspect, parse, run, run_command};
pub use config::ConsoleConfig;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{outcome_view, read_lines, state_view, write_error, write_response};
pub use session::{ConsoleOp, Session};
