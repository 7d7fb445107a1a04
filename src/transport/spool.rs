//! Response spooler
//!
//! Reads a multipart body line by line and decides, before the body is
//! complete, whether it stays in memory or goes to disk:
//!
//! - Below the threshold the raw text is returned as a buffered response
//! - Above it, in `PreferStream` mode, every complete segment is parsed and
//!   written as its own part file; at most one segment is held in memory
//! - Above it, in `BufferOnly` mode, the read fails with `ResultTooLarge`
//!
//! Records written to disk are exactly the records the parser would have
//! produced from the whole body. Bytes that are not valid UTF-8 are
//! replaced with U+FFFD instead of failing the read.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use uuid::Uuid;

use crate::multipart::{boundary_token, parse_segment, Record};
use crate::observability::{log_event_with_fields, Event};

use super::directory::{part_file_name, render_part};
use super::errors::{TransportError, TransportResult};
use super::index::StreamIndex;
use super::request::QueryResponse;

/// Whether a response may be redirected to disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpoolMode {
    PreferStream,
    BufferOnly,
}

/// Splits responses between memory and a spool directory
#[derive(Debug, Clone)]
pub struct ResponseSpooler {
    spool_root: PathBuf,
    threshold_bytes: u64,
}

impl ResponseSpooler {
    /// Create a spooler writing under `spool_root` once a response exceeds
    /// `threshold_bytes`.
    pub fn new(spool_root: impl Into<PathBuf>, threshold_bytes: u64) -> Self {
        Self {
            spool_root: spool_root.into(),
            threshold_bytes,
        }
    }

    /// Root directory for stream directories
    pub fn spool_root(&self) -> &Path {
        &self.spool_root
    }

    /// Byte threshold for leaving memory
    pub fn threshold_bytes(&self) -> u64 {
        self.threshold_bytes
    }

    /// Consume a response body.
    ///
    /// `cancelled` is polled between lines; once set, the read stops with
    /// `TransportError::Cancelled` and any partial spool directory is removed.
    pub async fn spool<R>(
        &self,
        request_id: Uuid,
        mut reader: R,
        mode: SpoolMode,
        cancelled: &AtomicBool,
    ) -> TransportResult<QueryResponse>
    where
        R: AsyncBufRead + Unpin + Send,
    {
        let mut buffer = String::new();
        let mut received = 0u64;
        loop {
            check_cancelled(cancelled)?;
            let read = read_line_lossy(&mut reader, &mut buffer).await?;
            if read == 0 {
                return Ok(QueryResponse::Buffer(buffer));
            }
            received += read as u64;
            if received > self.threshold_bytes {
                break;
            }
        }

        if mode == SpoolMode::BufferOnly {
            return Err(TransportError::ResultTooLarge {
                limit_bytes: self.threshold_bytes,
            });
        }

        let directory = self.spool_root.join(format!("result-{}", request_id));
        tokio::fs::create_dir_all(&directory).await?;

        let threshold = self.threshold_bytes.to_string();
        let dir_display = directory.display().to_string();
        log_event_with_fields(
            Event::SpoolSwitch,
            &[("directory", dir_display.as_str()), ("threshold_bytes", threshold.as_str())],
        );

        let mut sink = PartSink::new(&directory);
        let result = spool_body(&mut sink, buffer, &mut reader, cancelled).await;

        if let Err(e) = result {
            let _ = tokio::fs::remove_dir_all(&directory).await;
            return Err(e);
        }

        let count = sink.count.to_string();
        log_event_with_fields(
            Event::SpoolComplete,
            &[("directory", dir_display.as_str()), ("parts", count.as_str())],
        );

        Ok(QueryResponse::Stream(StreamIndex::new(dir_display, sink.count)))
    }
}

/// Writes records as consecutively numbered part files
struct PartSink<'a> {
    directory: &'a Path,
    count: usize,
}

impl<'a> PartSink<'a> {
    fn new(directory: &'a Path) -> Self {
        Self {
            directory,
            count: 0,
        }
    }

    async fn write(&mut self, record: &Record) -> TransportResult<()> {
        let path = self.directory.join(part_file_name(self.count));
        tokio::fs::write(&path, render_part(record)).await?;
        self.count += 1;
        Ok(())
    }
}

/// Finds the boundary, reading past a preamble longer than the threshold,
/// then writes the parts.
async fn spool_body<R>(
    sink: &mut PartSink<'_>,
    mut buffer: String,
    reader: &mut R,
    cancelled: &AtomicBool,
) -> TransportResult<()>
where
    R: AsyncBufRead + Unpin + Send,
{
    let mut token = boundary_token(&buffer).map(str::to_string);
    while token.is_none() {
        check_cancelled(cancelled)?;
        let mut line = String::new();
        if read_line_lossy(reader, &mut line).await? == 0 {
            break;
        }
        token = boundary_token(&line).map(str::to_string);
        buffer.push_str(&line);
    }

    match token {
        Some(token) => spool_segments(sink, &token, buffer, reader, cancelled).await,
        None => spool_unframed(sink, buffer, reader).await,
    }
}

async fn spool_segments<R>(
    sink: &mut PartSink<'_>,
    token: &str,
    mut pending: String,
    reader: &mut R,
    cancelled: &AtomicBool,
) -> TransportResult<()>
where
    R: AsyncBufRead + Unpin + Send,
{
    let delimiter = format!("--{}", token);
    let mut leading = true;

    loop {
        while let Some(pos) = pending.find(delimiter.as_str()) {
            let rest = pending.split_off(pos + delimiter.len());
            pending.truncate(pos);
            if let Some(record) = parse_segment(&pending, leading) {
                sink.write(&record).await?;
            }
            leading = false;
            pending = rest;
        }

        check_cancelled(cancelled)?;
        if read_line_lossy(reader, &mut pending).await? == 0 {
            break;
        }
    }

    if let Some(record) = parse_segment(&pending, leading) {
        sink.write(&record).await?;
    }
    Ok(())
}

/// A body without framing becomes a single part, as the parser would do.
async fn spool_unframed<R>(
    sink: &mut PartSink<'_>,
    mut buffer: String,
    reader: &mut R,
) -> TransportResult<()>
where
    R: AsyncBufRead + Unpin + Send,
{
    let mut rest = Vec::new();
    reader.read_to_end(&mut rest).await?;
    buffer.push_str(&String::from_utf8_lossy(&rest));
    let content = buffer.trim();
    if content.is_empty() {
        return Ok(());
    }
    sink.write(&Record::new(content)).await
}

/// Appends one line to `out`; returns the number of raw bytes read
async fn read_line_lossy<R>(reader: &mut R, out: &mut String) -> TransportResult<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    let read = reader.read_until(b'\n', &mut line).await?;
    out.push_str(&String::from_utf8_lossy(&line));
    Ok(read)
}

fn check_cancelled(cancelled: &AtomicBool) -> TransportResult<()> {
    if cancelled.load(Ordering::SeqCst) {
        Err(TransportError::Cancelled)
    } else {
        Ok(())
    }
}
