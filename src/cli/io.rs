//! JSON I/O handling for CLI
//!
//! - Input: one JSON command per stdin line (console)
//! - Output: one JSON object per stdout line
//! - Logs never go to stdout
//! - UTF-8 only

use std::io::{self, BufRead, Write};

use serde_json::{json, Value};

use crate::gateway::QueryOutcome;
use crate::multipart::format_record;
use crate::results::ResultState;

use super::errors::{CliError, CliResult};

/// Read non-blank lines from stdin until it closes
pub fn read_lines() -> impl Iterator<Item = CliResult<String>> {
    let stdin = io::stdin();
    stdin
        .lock()
        .lines()
        .map(|line| line.map_err(CliError::from))
        .filter(|line| !matches!(line, Ok(l) if l.trim().is_empty()))
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    write_line(&mut io::stdout(), &response_json(data))
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    write_line(&mut io::stdout(), &error_json(code, message))
}

fn response_json(data: Value) -> Value {
    json!({
        "status": "ok",
        "data": data
    })
}

fn error_json(code: &str, message: &str) -> Value {
    json!({
        "status": "error",
        "code": code,
        "message": message
    })
}

fn write_line<W: Write>(out: &mut W, value: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

/// JSON view of the visible page and the active record
pub fn state_view(state: &ResultState) -> Value {
    let error = state
        .error()
        .map(|e| json!({"code": e.code(), "message": e.to_string()}));

    let active = state.active_record().map(|record| {
        json!({
            "position": state.active_position(),
            "record": record,
            "formatted": format_record(record),
        })
    });

    json!({
        "mode": state.mode(),
        "status": state.status(),
        "totalRecords": state.total_records(),
        "pageSize": state.page_size(),
        "currentPage": state.current_page(),
        "totalPages": state.total_pages(),
        "start": state.pagination().start(),
        "error": error,
        "records": state.page_records(),
        "activeRecord": active,
    })
}

/// JSON summary of an execution, without the raw response body
pub fn outcome_view(outcome: &QueryOutcome) -> Value {
    let mut view = json!({
        "outcome": outcome.name(),
        "requestId": outcome.request_id().to_string(),
    });

    match outcome {
        QueryOutcome::Static { envelope, .. } => {
            view["records"] = json!(envelope.rows.len());
            view["degraded"] = json!(envelope.degraded);
        }
        QueryOutcome::Streamed { part_count, .. } => {
            view["partCount"] = json!(part_count);
        }
        QueryOutcome::Failed { error, .. } => {
            view["error"] = json!({"code": error.code(), "message": error.to_string()});
        }
        QueryOutcome::Cancelled { .. } | QueryOutcome::Superseded { .. } => {}
    }
    view
}
