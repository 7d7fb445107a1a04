//! docquery - query result handling for a document database console
//!
//! Turns multipart query responses into typed records, holds the result
//! the console is showing (in memory or streamed from disk page by page),
//! and executes queries through a pluggable transport.

pub mod cli;
pub mod gateway;
pub mod multipart;
pub mod observability;
pub mod results;
pub mod transport;
