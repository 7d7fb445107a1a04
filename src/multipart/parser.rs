//! Multipart response parser
//!
//! Input contract (produced by the upstream query service):
//!
//! ```text
//! --<token>
//! Content-Type: application/xml
//! X-Primitive: element
//! X-URI: /docs/1.xml
//! X-Path: /root
//!
//! <root/>
//! --<token>--
//! ```
//!
//! Parsing never fails. Input without a boundary line degrades to a single
//! record holding the whole trimmed text.

use std::sync::LazyLock;

use regex::Regex;

use super::record::Record;

static BOUNDARY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^--(\S+?)(?:--)?[ \t]*\r?$").expect("boundary pattern is valid")
});

/// Output of [`parse_response`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedResponse {
    /// Records in source order
    pub records: Vec<Record>,
    /// True if no boundary was found and the whole text became one record
    pub degraded: bool,
}

impl ParsedResponse {
    /// Returns true if no records were produced.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parses a raw response body into records.
pub fn parse(raw: &str) -> Vec<Record> {
    parse_response(raw).records
}

/// Parses a raw response body, reporting whether the parser degraded.
pub fn parse_response(raw: &str) -> ParsedResponse {
    let Some(token) = boundary_token(raw) else {
        let content = raw.trim();
        if content.is_empty() {
            return ParsedResponse::default();
        }
        return ParsedResponse {
            records: vec![Record::new(content)],
            degraded: true,
        };
    };

    let delimiter = format!("--{}", token);
    let records = raw
        .split(delimiter.as_str())
        .enumerate()
        .filter_map(|(i, segment)| parse_segment(segment, i == 0))
        .collect();

    ParsedResponse {
        records,
        degraded: false,
    }
}

/// Discovers the boundary token from the first boundary-shaped line.
pub fn boundary_token(raw: &str) -> Option<&str> {
    BOUNDARY_LINE
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Parses one boundary-free part: header lines, a blank line, then the body.
///
/// Returns `None` if the trimmed body is empty.
pub fn parse_part(text: &str) -> Option<Record> {
    let lines: Vec<&str> = text.lines().collect();
    let mut record = Record::default();
    let mut body_start = lines.len();

    for (i, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            body_start = i + 1;
            break;
        }
        match header_field(line) {
            Some((name, value)) => assign_header(&mut record, name, value),
            None => {
                body_start = i;
                break;
            }
        }
    }

    let body = lines[body_start..].join("\n");
    let content = body.trim();
    if content.is_empty() {
        return None;
    }
    record.content = content.to_string();
    Some(record)
}

/// Parses one segment of a response split on `--<token>`.
///
/// `leading` marks the preamble before the first boundary, which has no
/// boundary remainder to strip.
pub(crate) fn parse_segment(segment: &str, leading: bool) -> Option<Record> {
    if leading {
        parse_part(segment)
    } else {
        parse_part(strip_boundary_remainder(segment))
    }
}

/// Drops the optional trailing `--` and the rest of the boundary line.
fn strip_boundary_remainder(segment: &str) -> &str {
    let segment = segment.strip_prefix("--").unwrap_or(segment);
    match segment.split_once('\n') {
        Some((head, rest)) if head.trim().is_empty() => rest,
        None if segment.trim().is_empty() => "",
        _ => segment,
    }
}

/// Splits a `Name: value` line. Names are RFC 822 style tokens.
fn header_field(line: &str) -> Option<(&str, &str)> {
    let (name, value) = line.split_once(':')?;
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then(|| (name, value.trim()))
}

fn assign_header(record: &mut Record, name: &str, value: &str) {
    let slot = match name.to_ascii_lowercase().as_str() {
        "content-type" => &mut record.content_type,
        "x-primitive" => &mut record.primitive,
        "x-uri" => &mut record.uri,
        "x-path" => &mut record.path,
        _ => return,
    };
    *slot = Some(value.to_string());
}
