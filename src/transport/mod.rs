//! Transport capabilities consumed by the result pipeline
//!
//! The pipeline needs exactly three things from its host:
//!
//! 1. `send_query`: issue a query, get back a buffered body or a stream index
//! 2. `read_parts`: read a contiguous window of parts from a stream directory
//! 3. `cancel_query`: best-effort cancellation keyed by request id
//!
//! This module defines those seams and ships filesystem-backed
//! implementations: a spooler that redirects large responses to disk, a
//! part store that reads them back, and a replay transport that serves a
//! captured response file.

mod directory;
mod errors;
mod index;
mod replay;
mod request;
mod spool;

use std::future::Future;
use std::pin::Pin;

use uuid::Uuid;

use crate::multipart::Record;

pub use directory::{part_file_name, render_part, DirectoryPartStore};
pub use errors::{TransportError, TransportResult};
pub use index::StreamIndex;
pub use replay::ReplayTransport;
pub use request::{ConnectionParams, QueryRequest, QueryResponse, QueryType};
pub use spool::{ResponseSpooler, SpoolMode};

/// Boxed future returned by transport capabilities
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = TransportResult<T>> + Send + 'a>>;

/// Issues queries against the document database
pub trait QueryTransport: Send + Sync {
    /// Execute a query. The transport decides between buffering and
    /// streaming before the body is fully materialized.
    fn send_query<'a>(
        &'a self,
        request_id: Uuid,
        request: &'a QueryRequest,
    ) -> TransportFuture<'a, QueryResponse>;

    /// Request cancellation of an in-flight query.
    ///
    /// Returns true if the request was known and signalled.
    fn cancel_query(&self, _request_id: Uuid) -> bool {
        false
    }
}

/// Reads windows of parts from a stream directory
pub trait PartReader: Send + Sync {
    /// Read up to `limit` parts starting at absolute position `start`.
    ///
    /// Parts come back in positional order. A window running past the end
    /// of the result is truncated, not an error.
    fn read_parts<'a>(
        &'a self,
        directory: &'a str,
        start: usize,
        limit: usize,
    ) -> TransportFuture<'a, Vec<Record>>;
}
