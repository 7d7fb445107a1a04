//! CLI command implementations
//!
//! Each command writes exactly one JSON object per output line on stdout.
//! Query execution runs on a tokio runtime owned by the command.

use std::fs;
use std::path::Path;

use serde_json::{json, Value};
use tokio::runtime::Runtime;

use crate::gateway::QueryOutcome;
use crate::multipart::build_envelope;
use crate::observability::{log_event, Event};

use super::args::{Command, QueryArgs};
use super::errors::{CliError, CliResult};
use super::io::{outcome_view, read_lines, state_view, write_error, write_response};
use super::session::{ConsoleOp, Session};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Parse { input } => parse(&input),
        Command::Inspect {
            query,
            page,
            record,
        } => inspect(&query, page, record),
        Command::Console { query } => console(&query),
    }
}

/// Parse a response file through the buffered path only
pub fn parse(input: &Path) -> CliResult<()> {
    write_response(parse_file(input)?)
}

fn parse_file(input: &Path) -> CliResult<Value> {
    let bytes = fs::read(input)
        .map_err(|e| CliError::io_error(format!("Failed to read {}: {}", input.display(), e)))?;
    let raw = String::from_utf8_lossy(&bytes);
    Ok(serde_json::to_value(build_envelope(&raw))?)
}

/// Execute once, move to `page`, select `record`, print the view
pub fn inspect(args: &QueryArgs, page: isize, record: Option<isize>) -> CliResult<()> {
    let session = Session::open(args)?;
    let runtime = runtime()?;

    let outcome = runtime.block_on(session.execute());
    if let QueryOutcome::Failed { error, .. } = &outcome {
        let message = error.to_string();
        write_error(error.code(), &message)?;
        return Err(CliError::query_failed(message));
    }

    let results = session.results();
    runtime.block_on(results.jump_to_page(page));
    if let Some(record) = record {
        results.set_active_record(record);
    }

    write_response(json!({
        "execution": outcome_view(&outcome),
        "state": state_view(&results.snapshot()),
    }))
}

/// Execute once, then serve navigation commands from stdin
///
/// A malformed command is answered with an error line and skipped; an I/O
/// error on stdin ends the loop.
pub fn console(args: &QueryArgs) -> CliResult<()> {
    let session = Session::open(args)?;
    let runtime = runtime()?;

    let outcome = runtime.block_on(session.execute());
    write_response(json!({
        "execution": outcome_view(&outcome),
        "state": state_view(&session.results().snapshot()),
    }))?;

    log_event(Event::ConsoleStart);
    for line in read_lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                write_error(e.code_str(), e.message())?;
                break;
            }
        };

        match ConsoleOp::parse(&line) {
            Ok(op) => write_response(runtime.block_on(session.apply(op)))?,
            Err(e) => write_error(e.code_str(), e.message())?,
        }
    }
    log_event(Event::ConsoleStop);

    Ok(())
}

fn runtime() -> CliResult<Runtime> {
    Runtime::new()
        .map_err(|e| CliError::runtime_error(format!("Failed to create tokio runtime: {}", e)))
}
