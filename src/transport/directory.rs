//! Filesystem part store
//!
//! A stream directory holds one file per part, named by absolute position:
//!
//! ```text
//! result-<uuid>/
//!   part-00000000.txt
//!   part-00000001.txt
//!   ...
//! ```
//!
//! Each file carries the part's headers, a blank line, then the body.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::multipart::{parse_part, Record};

use super::errors::{TransportError, TransportResult};
use super::{PartReader, TransportFuture};

/// File name of the part at the given absolute position
pub fn part_file_name(position: usize) -> String {
    format!("part-{:08}.txt", position)
}

/// Serializes a record into part file text.
///
/// Only headers present on the record are written, so absent and empty
/// metadata survive the round trip.
pub fn render_part(record: &Record) -> String {
    let mut text = String::with_capacity(record.content.len() + 64);
    let headers = [
        ("Content-Type", &record.content_type),
        ("X-Primitive", &record.primitive),
        ("X-URI", &record.uri),
        ("X-Path", &record.path),
    ];
    for (name, value) in headers {
        if let Some(value) = value {
            text.push_str(name);
            text.push_str(": ");
            text.push_str(value);
            text.push('\n');
        }
    }
    text.push('\n');
    text.push_str(&record.content);
    text.push('\n');
    text
}

/// Reads parts from stream directories on the local filesystem
#[derive(Debug, Clone, Default)]
pub struct DirectoryPartStore;

impl DirectoryPartStore {
    /// Create a new part store
    pub fn new() -> Self {
        Self
    }

    async fn read_window(
        &self,
        directory: &Path,
        start: usize,
        limit: usize,
    ) -> TransportResult<Vec<Record>> {
        match tokio::fs::metadata(directory).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(TransportError::DirectoryNotFound(
                    directory.display().to_string(),
                ))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(TransportError::DirectoryNotFound(
                    directory.display().to_string(),
                ))
            }
            Err(e) => return Err(e.into()),
        }

        let mut records = Vec::with_capacity(limit);
        for position in start..start.saturating_add(limit) {
            let path = directory.join(part_file_name(position));
            let text = match tokio::fs::read_to_string(&path).await {
                Ok(text) => text,
                // Window ran past the last part
                Err(e) if e.kind() == ErrorKind::NotFound => break,
                Err(e) => {
                    return Err(TransportError::IoError(format!(
                        "failed to read {}: {}",
                        path.display(),
                        e
                    )))
                }
            };
            let record = parse_part(&text)
                .ok_or_else(|| TransportError::InvalidPart(path.display().to_string()))?;
            records.push(record);
        }

        Ok(records)
    }
}

impl PartReader for DirectoryPartStore {
    fn read_parts<'a>(
        &'a self,
        directory: &'a str,
        start: usize,
        limit: usize,
    ) -> TransportFuture<'a, Vec<Record>> {
        Box::pin(async move {
            let directory = PathBuf::from(directory);
            self.read_window(&directory, start, limit).await
        })
    }
}
