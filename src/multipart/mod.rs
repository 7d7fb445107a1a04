//! Multipart response handling
//!
//! Turns the multipart text emitted by the query service into typed
//! records, and records into display-ready text.
//!
//! # Guarantees
//!
//! - Parsing never fails; malformed input degrades to one whole-text record
//! - Records keep the order of their segments in the source text
//! - Records with an empty trimmed body are never emitted

mod envelope;
mod formatter;
mod parser;
mod record;

pub use envelope::{build_envelope, render_rows, ResultEnvelope, NO_RESULTS};
pub use formatter::{detect_hint, format_record, ContentHint, FormattedContent};
pub use parser::{boundary_token, parse, parse_part, parse_response, ParsedResponse};
pub(crate) use parser::parse_segment;
pub use record::Record;
