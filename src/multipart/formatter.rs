//! Record content formatting
//!
//! Produces a display-ready body plus a hint describing how it was
//! interpreted. Formatting is best effort: content that cannot be
//! interpreted is returned unchanged with a `Text` hint.

use serde::Serialize;
use serde_json::Value;

use super::record::Record;

const INDENT: &str = "  ";

/// How a record body was interpreted for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentHint {
    Json,
    Xml,
    Text,
}

impl ContentHint {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentHint::Json => "json",
            ContentHint::Xml => "xml",
            ContentHint::Text => "text",
        }
    }
}

/// Display-ready record body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedContent {
    pub hint: ContentHint,
    pub text: String,
}

/// Formats a record's content for display.
pub fn format_record(record: &Record) -> FormattedContent {
    let hint = detect_hint(record);
    let text = match hint {
        ContentHint::Json => pretty_json(&record.content),
        ContentHint::Xml => indent_xml(&record.content),
        ContentHint::Text => None,
    };

    match text {
        Some(text) => FormattedContent { hint, text },
        None => FormattedContent {
            hint: ContentHint::Text,
            text: record.content.clone(),
        },
    }
}

/// Picks a hint from the content type, falling back to sniffing the body.
pub fn detect_hint(record: &Record) -> ContentHint {
    let content_type = record.content_type_or_empty().to_ascii_lowercase();
    if content_type.contains("json") {
        return ContentHint::Json;
    }
    if content_type.contains("xml") {
        return ContentHint::Xml;
    }
    if !content_type.is_empty() && content_type != "text/plain" {
        return ContentHint::Text;
    }

    let body = record.content.trim_start();
    if body.starts_with('{') || body.starts_with('[') {
        ContentHint::Json
    } else if body.starts_with('<') {
        ContentHint::Xml
    } else {
        ContentHint::Text
    }
}

fn pretty_json(content: &str) -> Option<String> {
    let value: Value = serde_json::from_str(content).ok()?;
    serde_json::to_string_pretty(&value).ok()
}

/// Re-indents single-line XML, one element per line.
///
/// Multi-line content is assumed to be formatted already and is kept as is.
fn indent_xml(content: &str) -> Option<String> {
    if content.contains('\n') {
        return Some(content.to_string());
    }

    let mut out = String::with_capacity(content.len() * 2);
    let mut depth: usize = 0;
    let mut rest = content.trim();

    while !rest.is_empty() {
        if rest.starts_with('<') {
            let end = rest.find('>')?;
            let tag = &rest[..=end];
            rest = &rest[end + 1..];

            let closing = tag.starts_with("</");
            let self_closing = tag.ends_with("/>") || tag.starts_with("<?") || tag.starts_with("<!");
            if closing {
                depth = depth.saturating_sub(1);
            }

            // Keep `<a>text</a>` on a single line
            if !closing && !self_closing {
                if let Some(inline) = inline_element(tag, rest) {
                    push_line(&mut out, depth, &format!("{}{}", tag, inline.0));
                    rest = inline.1;
                    continue;
                }
            }

            push_line(&mut out, depth, tag);
            if !closing && !self_closing {
                depth += 1;
            }
        } else {
            let end = rest.find('<').unwrap_or(rest.len());
            let text = rest[..end].trim();
            if !text.is_empty() {
                push_line(&mut out, depth, text);
            }
            rest = &rest[end..];
        }
    }

    Some(out)
}

/// Matches `text</name>` directly after an opening tag.
fn inline_element<'a>(open_tag: &str, rest: &'a str) -> Option<(String, &'a str)> {
    let name = open_tag
        .trim_start_matches('<')
        .trim_end_matches('>')
        .split_whitespace()
        .next()?;
    let text_end = rest.find('<')?;
    let close = format!("</{}>", name);
    if !rest[text_end..].starts_with(&close) {
        return None;
    }
    let consumed = text_end + close.len();
    Some((rest[..consumed].to_string(), &rest[consumed..]))
}

fn push_line(out: &mut String, depth: usize, line: &str) {
    if !out.is_empty() {
        out.push('\n');
    }
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    out.push_str(line);
}
