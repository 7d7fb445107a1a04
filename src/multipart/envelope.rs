//! Result envelope for buffered (non-streamed) responses

use serde::Serialize;

use super::formatter::format_record;
use super::parser::parse_response;
use super::record::Record;

/// Text shown when a buffered response holds no records
pub const NO_RESULTS: &str = "No results";

/// A fully materialized query response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEnvelope {
    /// Response body exactly as received
    pub raw_text: String,
    /// Plain-text rendering of all rows
    pub formatted_text: String,
    /// Parsed records in source order
    pub rows: Vec<Record>,
    /// True if the parser fell back to a single whole-text record
    pub degraded: bool,
}

impl ResultEnvelope {
    /// Returns true if the response produced no records
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Builds an envelope from a raw response body.
pub fn build_envelope(raw: &str) -> ResultEnvelope {
    let parsed = parse_response(raw);
    let formatted_text = render_rows(&parsed.records);

    ResultEnvelope {
        raw_text: raw.to_string(),
        formatted_text,
        rows: parsed.records,
        degraded: parsed.degraded,
    }
}

/// Concatenates formatted rows, each preceded by a one-line summary.
pub fn render_rows(rows: &[Record]) -> String {
    if rows.is_empty() {
        return NO_RESULTS.to_string();
    }

    rows.iter()
        .enumerate()
        .map(|(i, record)| {
            let formatted = format_record(record);
            format!("{}\n{}", summary_line(i, record), formatted.text)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn summary_line(position: usize, record: &Record) -> String {
    let mut line = format!("[{}]", record.index.unwrap_or(position) + 1);
    for value in [&record.content_type, &record.primitive, &record.uri, &record.path]
        .into_iter()
        .flatten()
        .filter(|v| !v.is_empty())
    {
        line.push(' ');
        line.push_str(value);
    }
    line
}
